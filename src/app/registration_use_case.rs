use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::location_use_case::LocationState;
use crate::app::ports::{SubmissionPort, SubmissionReceipt};
use crate::coerce::{digits_only, parse_price};
use crate::constants::{PHONE_COUNTRY_PREFIX, PHONE_DIGITS};
use crate::domain::{AddressField, DayAvailability, GeoPoint, ResolvedAddress, WashType};
use crate::error::{RegistrationError, Result};
use crate::observability::metrics;
use crate::schedule::WeeklySchedule;

/// Editable fields of a wash type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WashField {
    Name,
    Price,
    Description,
}

/// Everything the operator has entered so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub name: String,
    phone_digits: String,
    pub address: ResolvedAddress,
    pub location: Option<GeoPoint>,
    wash_types: Vec<WashType>,
    pub schedule: WeeklySchedule,
}

impl Default for RegistrationDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone_digits: String::new(),
            address: ResolvedAddress::default(),
            location: None,
            wash_types: vec![WashType::default()],
            schedule: WeeklySchedule::new(),
        }
    }
}

/// The record handed to the submission sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSubmission {
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub street: String,
    pub street_number: String,
    pub city: String,
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
    pub wash_types: Vec<WashType>,
    pub availability: WeeklySchedule,
}

impl RegistrationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn phone_digits(&self) -> &str {
        &self.phone_digits
    }

    /// Keep the digits of `raw`. Input with more than ten digits is ignored and
    /// the previous number stays. Returns whether the value was taken.
    pub fn set_phone(&mut self, raw: &str) -> bool {
        let digits = digits_only(raw);
        if digits.len() > PHONE_DIGITS {
            debug!(len = digits.len(), "Ignoring over-long phone number");
            return false;
        }
        self.phone_digits = digits;
        true
    }

    pub fn override_address_field(&mut self, field: AddressField, value: &str) {
        self.address.set_field(field, value);
    }

    /// Take the selected point and its address. An unresolved point leaves
    /// the address empty so it never describes a different location.
    pub fn apply_location(&mut self, state: &LocationState) {
        self.location = state.current_location();
        self.address = match state.address() {
            Some(address) => address.clone(),
            None => {
                debug!("Selected point has no resolved address");
                ResolvedAddress::default()
            }
        };
    }

    pub fn wash_types(&self) -> &[WashType] {
        &self.wash_types
    }

    pub fn add_wash_type(&mut self) -> usize {
        self.wash_types.push(WashType::default());
        self.wash_types.len() - 1
    }

    pub fn remove_wash_type(&mut self, index: usize) -> Result<WashType> {
        self.wash_type_index(index)?;
        Ok(self.wash_types.remove(index))
    }

    /// Change one field of a wash type; price text goes through [`parse_price`].
    pub fn update_wash_type(&mut self, index: usize, field: WashField, value: &str) -> Result<&WashType> {
        self.wash_type_index(index)?;
        let wash = &mut self.wash_types[index];
        match field {
            WashField::Name => wash.name = value.to_string(),
            WashField::Price => wash.price = parse_price(value),
            WashField::Description => wash.description = value.to_string(),
        }
        Ok(&self.wash_types[index])
    }

    fn wash_type_index(&self, index: usize) -> Result<()> {
        if index >= self.wash_types.len() {
            return Err(RegistrationError::Validation(format!(
                "wash type {} does not exist ({} defined)",
                index,
                self.wash_types.len()
            )));
        }
        Ok(())
    }

    /// Problems that block submission, in form order. Empty when complete.
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push("name is required".to_string());
        }
        if self.phone_digits.len() != PHONE_DIGITS {
            issues.push(format!("phone number must have exactly {PHONE_DIGITS} digits"));
        }
        if self.address.display_address.trim().is_empty() {
            issues.push("address is required".to_string());
        }
        if self.location.is_none() {
            issues.push("location has not been selected".to_string());
        }
        if self.wash_types.is_empty() {
            issues.push("at least one wash type is required".to_string());
        }
        for (i, wash) in self.wash_types.iter().enumerate() {
            if wash.name.trim().is_empty() {
                issues.push(format!("wash type {} needs a name", i + 1));
            }
            if wash.price.is_none() {
                issues.push(format!("wash type {} needs a price", i + 1));
            }
        }
        if self.schedule.is_empty() {
            issues.push("availability needs at least one day".to_string());
        }
        for (i, day) in self.schedule.days().iter().enumerate() {
            if day.slots.is_empty() {
                issues.push(format!("day {} ({}) has no slots", i + 1, day.day));
            }
        }
        if self.schedule.has_duplicates() {
            issues.push("a day has two identical time slots".to_string());
        }
        issues
    }

    pub fn build_submission(&self) -> Result<RegistrationSubmission> {
        let issues = self.validation_issues();
        if !issues.is_empty() {
            return Err(RegistrationError::Validation(issues.join("; ")));
        }
        let location = self
            .location
            .ok_or_else(|| RegistrationError::Validation("location has not been selected".into()))?;

        metrics::submission::built();
        Ok(RegistrationSubmission {
            name: self.name.trim().to_string(),
            phone_number: format!("{PHONE_COUNTRY_PREFIX}{}", self.phone_digits),
            address: self.address.display_address.clone(),
            street: self.address.street.clone(),
            street_number: self.address.street_number.clone(),
            city: self.address.city.clone(),
            area: self.address.area.clone(),
            latitude: location.latitude(),
            longitude: location.longitude(),
            wash_types: self.wash_types.clone(),
            availability: self.schedule.clone(),
        })
    }
}

/// Price as written in a draft file: a number or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn as_text(&self) -> String {
        match self {
            PriceInput::Number(n) => n.to_string(),
            PriceInput::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftWashType {
    pub name: String,
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub description: String,
}

/// Registration draft as written in a TOML file for the CLI.
///
/// The location is given either as a search text, as coordinates, or by
/// asking for the device position.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftFile {
    pub name: String,
    pub phone: String,
    pub search: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub use_device: bool,
    #[serde(default)]
    pub wash_types: Vec<DraftWashType>,
    pub availability: Option<Vec<DayAvailability>>,
}

impl DraftFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replay the file through the draft's editing operations.
    pub fn into_draft(self) -> Result<RegistrationDraft> {
        let mut draft = RegistrationDraft::new();
        draft.set_name(&self.name);
        if !draft.set_phone(&self.phone) {
            return Err(RegistrationError::Validation(format!(
                "phone number has more than {PHONE_DIGITS} digits"
            )));
        }

        if !self.wash_types.is_empty() {
            draft.wash_types.clear();
            for wash in &self.wash_types {
                let index = draft.add_wash_type();
                draft.update_wash_type(index, WashField::Name, &wash.name)?;
                if let Some(price) = &wash.price {
                    draft.update_wash_type(index, WashField::Price, &price.as_text())?;
                }
                draft.update_wash_type(index, WashField::Description, &wash.description)?;
            }
        }

        if let Some(days) = self.availability {
            draft.schedule = WeeklySchedule::from_days(days);
        }
        Ok(draft)
    }
}

/// Builds the submission record and hands it to the sink.
pub struct RegistrationUseCase {
    sink: Box<dyn SubmissionPort>,
}

impl RegistrationUseCase {
    pub fn new(sink: Box<dyn SubmissionPort>) -> Self {
        Self { sink }
    }

    pub async fn submit(&self, draft: &RegistrationDraft) -> Result<SubmissionReceipt> {
        let submission = draft.build_submission()?;
        match self.sink.submit(&submission).await {
            Ok(receipt) => {
                info!(status = receipt.status, name = %submission.name, "Registration submitted");
                metrics::submission::sent();
                Ok(receipt)
            }
            Err(e) => {
                warn!("Registration submission failed: {}", e);
                metrics::submission::failed();
                Err(e)
            }
        }
    }
}
