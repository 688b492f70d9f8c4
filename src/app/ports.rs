use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::registration_use_case::RegistrationSubmission;
use crate::config::{BoundingBox, GeocoderConfig, Language};
use crate::constants::REVERSE_ZOOM;
use crate::domain::{GeoPoint, SuggestionEntry};
use crate::error::{DeviceLocationFailure, GeocodeError, Result};

/// Forward-geocode request for search-as-you-type.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardQuery {
    pub text: String,
    pub country_codes: String,
    pub viewbox: BoundingBox,
    pub bounded: bool,
    pub language: Language,
    pub limit: usize,
}

impl ForwardQuery {
    pub fn from_config(text: &str, config: &GeocoderConfig) -> Self {
        Self {
            text: text.trim().to_string(),
            country_codes: config.country_codes.clone(),
            viewbox: config.viewbox,
            bounded: config.bounded,
            language: config.language,
            limit: config.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverseQuery {
    pub point: GeoPoint,
    pub language: Language,
    pub zoom: u8,
    /// Ask for the broken-down address mapping, not just the display string.
    pub address_details: bool,
}

impl ReverseQuery {
    pub fn from_config(point: GeoPoint, config: &GeocoderConfig) -> Self {
        Self {
            point,
            language: config.language,
            zoom: REVERSE_ZOOM,
            address_details: true,
        }
    }
}

/// Raw reverse-geocode payload: `display_name` plus an `address` mapping.
pub type RawReverseResponse = serde_json::Value;

#[async_trait]
pub trait GeocoderPort: Send + Sync {
    /// Ranked candidates for `query`, at most `query.limit` of them.
    async fn search(&self, query: &ForwardQuery) -> std::result::Result<Vec<SuggestionEntry>, GeocodeError>;

    async fn reverse(&self, query: &ReverseQuery) -> std::result::Result<RawReverseResponse, GeocodeError>;
}

#[async_trait]
pub trait DeviceLocationPort: Send + Sync {
    async fn current_position(&self) -> std::result::Result<GeoPoint, DeviceLocationFailure>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub body: serde_json::Value,
}

#[async_trait]
pub trait SubmissionPort: Send + Sync {
    async fn submit(&self, submission: &RegistrationSubmission) -> Result<SubmissionReceipt>;
}
