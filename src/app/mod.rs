pub mod ports;
pub mod location_use_case;
pub mod registration_use_case;
