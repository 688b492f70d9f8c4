use thiserror::Error;

use crate::schedule::ScheduleError;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Coordinates out of range: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Schedule rejected the change: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("API error: {message}")]
    Api { message: String },
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Failure of a forward or reverse geocode call. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("request could not be sent: {0}")]
    Transport(String),

    #[error("provider answered with status {0}")]
    Status(u16),

    #[error("response could not be parsed: {0}")]
    Malformed(String),
}

/// Ways the device location capability can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceLocationFailure {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location information is unavailable")]
    PositionUnavailable,

    #[error("the request to get the location timed out")]
    Timeout,

    #[error("geolocation is not supported on this device")]
    Unsupported,
}
