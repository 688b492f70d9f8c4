//! Defaults shared by the configuration layer, the geocoder adapter and the editors.

// Geocoding provider
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("carwash-registration/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_COUNTRY_CODES: &str = "eg";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Search results are capped at this many suggestions.
pub const MAX_SUGGESTIONS: usize = 5;

/// Reverse lookups ask for street-level detail.
pub const REVERSE_ZOOM: u8 = 18;

// Cairo and Giza service region (south-west and north-east corners)
pub const REGION_MIN_LATITUDE: f64 = 29.8;
pub const REGION_MAX_LATITUDE: f64 = 30.3;
pub const REGION_MIN_LONGITUDE: f64 = 30.5;
pub const REGION_MAX_LONGITUDE: f64 = 31.5;

// Submission
pub const DEFAULT_SUBMISSION_URL: &str = "http://localhost:4000/v1/api/carwash/";
pub const PHONE_COUNTRY_PREFIX: &str = "+20";
pub const PHONE_DIGITS: usize = 10;

// Slots
pub const DEFAULT_SLOT_CAPACITY: u32 = 2;
pub const NEW_DAY_SLOT_START_HOUR: u32 = 9;
pub const ADDED_SLOT_START_HOUR: u32 = 12;
/// Candidate windows tried before `add_slot` gives up (one per hour of the day).
pub const ADDED_SLOT_ATTEMPTS: u32 = 24;

// Logging
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "registration.log";
pub const DEFAULT_LOG_FILTER: &str = "carwash_registration=info";
