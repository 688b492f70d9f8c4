use async_trait::async_trait;
use tracing::debug;

use crate::app::ports::DeviceLocationPort;
use crate::config::DeviceConfig;
use crate::domain::GeoPoint;
use crate::error::DeviceLocationFailure;

/// Device-location adapter that reports a configured position.
///
/// Hosts without a positioning capability (servers, the CLI) configure the
/// coordinates instead. With nothing configured it reports `Unsupported`.
pub struct FixedDeviceLocation {
    configured: Option<(f64, f64)>,
}

impl FixedDeviceLocation {
    pub fn new(config: &DeviceConfig) -> Self {
        let configured = match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };
        Self { configured }
    }
}

#[async_trait]
impl DeviceLocationPort for FixedDeviceLocation {
    async fn current_position(&self) -> Result<GeoPoint, DeviceLocationFailure> {
        let (lat, lon) = self.configured.ok_or(DeviceLocationFailure::Unsupported)?;
        debug!(lat, lon, "Using configured device position");
        GeoPoint::new(lat, lon).map_err(|_| DeviceLocationFailure::PositionUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_position() {
        let device = FixedDeviceLocation::new(&DeviceConfig {
            latitude: Some(30.05),
            longitude: Some(31.24),
        });
        let point = device.current_position().await.unwrap();
        assert_eq!(point, GeoPoint::new(30.05, 31.24).unwrap());
    }

    #[tokio::test]
    async fn test_missing_position_is_unsupported() {
        let device = FixedDeviceLocation::new(&DeviceConfig {
            latitude: Some(30.05),
            longitude: None,
        });
        assert_eq!(
            device.current_position().await,
            Err(DeviceLocationFailure::Unsupported)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_position_is_unavailable() {
        let device = FixedDeviceLocation::new(&DeviceConfig {
            latitude: Some(130.0),
            longitude: Some(31.24),
        });
        assert_eq!(
            device.current_position().await,
            Err(DeviceLocationFailure::PositionUnavailable)
        );
    }
}
