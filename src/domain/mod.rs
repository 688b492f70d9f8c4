use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RegistrationError, Result};

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoPointRepr")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct GeoPointRepr {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<GeoPointRepr> for GeoPoint {
    type Error = RegistrationError;

    fn try_from(repr: GeoPointRepr) -> Result<Self> {
        GeoPoint::new(repr.latitude, repr.longitude)
    }
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(RegistrationError::InvalidCoordinates { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Parse the string coordinates geocoders return (`"30.0444"`, `"31.2357"`).
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = latitude.trim().parse::<f64>().map_err(|_| {
            RegistrationError::Validation(format!("latitude is not a number: {latitude:?}"))
        })?;
        let lon = longitude.trim().parse::<f64>().map_err(|_| {
            RegistrationError::Validation(format!("longitude is not a number: {longitude:?}"))
        })?;
        Self::new(lat, lon)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// One candidate location from a forward-geocode search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEntry {
    pub id: String,
    pub label: String,
    pub point: GeoPoint,
}

impl SuggestionEntry {
    /// First comma-separated segment of the label, used as the headline in lists.
    pub fn headline(&self) -> &str {
        self.label.split(',').next().unwrap_or("").trim()
    }
}

/// Structured address produced by reverse resolution. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub street: String,
    pub street_number: String,
    pub city: String,
    pub area: String,
    pub display_address: String,
}

/// Fields of [`ResolvedAddress`] a caller may override after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Street,
    StreetNumber,
    City,
    Area,
    DisplayAddress,
}

impl ResolvedAddress {
    pub fn set_field(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AddressField::Street => self.street = value,
            AddressField::StreetNumber => self.street_number = value,
            AddressField::City => self.city = value,
            AddressField::Area => self.area = value,
            AddressField::DisplayAddress => self.display_address = value,
        }
    }
}

/// Weekday label of a day entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DayLabel {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayLabel {
    pub const ALL: [DayLabel; 7] = [
        DayLabel::Monday,
        DayLabel::Tuesday,
        DayLabel::Wednesday,
        DayLabel::Thursday,
        DayLabel::Friday,
        DayLabel::Saturday,
        DayLabel::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayLabel::Monday => "Monday",
            DayLabel::Tuesday => "Tuesday",
            DayLabel::Wednesday => "Wednesday",
            DayLabel::Thursday => "Thursday",
            DayLabel::Friday => "Friday",
            DayLabel::Saturday => "Saturday",
            DayLabel::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayLabel {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        DayLabel::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RegistrationError::Validation(format!("unknown weekday: {s:?}")))
    }
}

/// A bookable window within one day entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    /// Number of cars that can be booked in this window.
    #[serde(rename = "slotNumber")]
    pub capacity: u32,
}

impl TimeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime, capacity: u32) -> Self {
        Self {
            start_time,
            end_time,
            capacity,
        }
    }

    /// Whether both slots cover the same window, ignoring capacity.
    pub fn same_window(&self, other: &TimeSlot) -> bool {
        self.start_time == other.start_time && self.end_time == other.end_time
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} (x{})",
            self.start_time.format(hhmm::FORMAT),
            self.end_time.format(hhmm::FORMAT),
            self.capacity
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: DayLabel,
    pub slots: Vec<TimeSlot>,
}

/// A wash service offered by the business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WashType {
    pub name: String,
    /// `None` until a positive price has been entered.
    pub price: Option<f64>,
    pub description: String,
}

/// Serde helpers for `HH:MM` clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid HH:MM time: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_geo_point_parse_strings() {
        let point = GeoPoint::parse(" 30.0444", "31.2357 ").unwrap();
        assert_eq!(point.latitude(), 30.0444);
        assert_eq!(point.longitude(), 31.2357);
        assert!(GeoPoint::parse("abc", "31.0").is_err());
    }

    #[test]
    fn test_day_label_from_str() {
        assert_eq!("friday".parse::<DayLabel>().unwrap(), DayLabel::Friday);
        assert_eq!(" Sunday ".parse::<DayLabel>().unwrap(), DayLabel::Sunday);
        assert!("Funday".parse::<DayLabel>().is_err());
    }

    #[test]
    fn test_time_slot_serializes_as_hhmm() {
        let slot = TimeSlot::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            2,
        );
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "10:30");
        assert_eq!(json["slotNumber"], 2);

        let back: TimeSlot = serde_json::from_value(json).unwrap();
        assert_eq!(back, slot);
    }

    #[test]
    fn test_suggestion_headline() {
        let entry = SuggestionEntry {
            id: "1".into(),
            label: "Tahrir Square, Downtown, Cairo".into(),
            point: GeoPoint::new(30.04, 31.23).unwrap(),
        };
        assert_eq!(entry.headline(), "Tahrir Square");
    }
}
