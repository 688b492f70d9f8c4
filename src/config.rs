use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::{
    DEFAULT_COUNTRY_CODES, DEFAULT_GEOCODER_BASE_URL, DEFAULT_SUBMISSION_URL,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT, MAX_SUGGESTIONS, REGION_MAX_LATITUDE,
    REGION_MAX_LONGITUDE, REGION_MIN_LATITUDE, REGION_MIN_LONGITUDE,
};
use crate::domain::GeoPoint;
use crate::error::{RegistrationError, Result};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub submission: SubmissionConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub language: Language,
    pub country_codes: String,
    pub viewbox: BoundingBox,
    /// Restrict search results to `viewbox` instead of only preferring it.
    pub bounded: bool,
    pub limit: usize,
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language: Language::En,
            country_codes: DEFAULT_COUNTRY_CODES.to_string(),
            viewbox: BoundingBox::default(),
            bounded: true,
            limit: MAX_SUGGESTIONS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Language requested from the geocoder for labels and address parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    /// Arabic locales map to `ar`, everything else to `en`.
    pub fn from_locale(locale: &str) -> Self {
        let primary = locale.split(['-', '_']).next().unwrap_or("");
        if primary.eq_ignore_ascii_case("ar") {
            Language::Ar
        } else {
            Language::En
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_latitude: REGION_MIN_LATITUDE,
            max_latitude: REGION_MAX_LATITUDE,
            min_longitude: REGION_MIN_LONGITUDE,
            max_longitude: REGION_MAX_LONGITUDE,
        }
    }
}

impl BoundingBox {
    /// `left,top,right,bottom` as the geocoder's `viewbox` parameter expects.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_longitude, self.max_latitude, self.max_longitude, self.min_latitude
        )
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude())
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SUBMISSION_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Position reported by the fixed device-location adapter. Unset means unsupported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Config {
    /// Load `path`, or `config.toml` when it exists, then apply environment overrides.
    ///
    /// A `.env` file is read first so its values take part in the overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RegistrationError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GEOCODER_*`, `SUBMISSION_URL` and `DEVICE_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GEOCODER_BASE_URL") {
            self.geocoder.base_url = url;
        }
        if let Some(agent) = lookup("GEOCODER_USER_AGENT") {
            self.geocoder.user_agent = agent;
        }
        if let Some(locale) = lookup("GEOCODER_LANGUAGE") {
            self.geocoder.language = Language::from_locale(&locale);
        }
        if let Some(url) = lookup("SUBMISSION_URL") {
            self.submission.url = url;
        }
        if let Some(lat) = lookup("DEVICE_LATITUDE") {
            self.device.latitude = Some(parse_env_f64("DEVICE_LATITUDE", &lat)?);
        }
        if let Some(lon) = lookup("DEVICE_LONGITUDE") {
            self.device.longitude = Some(parse_env_f64("DEVICE_LONGITUDE", &lon)?);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.geocoder.base_url.trim().is_empty() {
            return Err(RegistrationError::Config("geocoder.base_url is empty".into()));
        }
        if self.geocoder.limit == 0 || self.geocoder.limit > MAX_SUGGESTIONS {
            return Err(RegistrationError::Config(format!(
                "geocoder.limit must be between 1 and {MAX_SUGGESTIONS}, got {}",
                self.geocoder.limit
            )));
        }
        let vb = &self.geocoder.viewbox;
        if vb.min_latitude > vb.max_latitude || vb.min_longitude > vb.max_longitude {
            return Err(RegistrationError::Config(format!(
                "geocoder.viewbox corners are swapped: {}",
                vb.to_viewbox()
            )));
        }
        Ok(())
    }
}

fn parse_env_f64(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| RegistrationError::Config(format!("{key} is not a number: {value:?}")))
}
