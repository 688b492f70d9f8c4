pub mod device_location;
pub mod http_client;
pub mod nominatim_client;
pub mod submission_client;
