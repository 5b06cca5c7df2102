//! Platform collaborators that produce location and orientation data.

use thiserror::Error;

use ferry_types::{LocationFix, ProviderId, SensorRate};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("orientation sensor unavailable")]
    SensorUnavailable,
    #[error("location provider '{0}' unavailable")]
    ProviderUnavailable(ProviderId),
}

/// Platform position service. Updates are delivered back through
/// [`LocationService`](crate::LocationService) callbacks on the UI thread.
pub trait PositionProvider {
    fn subscribe(
        &mut self,
        provider: ProviderId,
        min_interval_ms: u64,
        min_distance_m: f32,
    ) -> Result<(), LocationError>;

    fn unsubscribe(&mut self, provider: ProviderId);

    /// Cached fix, if the platform has one.
    fn last_known(&self, provider: ProviderId) -> Option<LocationFix>;

    fn is_available(&self, provider: ProviderId) -> bool;
}

/// Platform compass/rotation sensor.
pub trait OrientationSensor {
    fn subscribe(&mut self, rate: SensorRate) -> Result<(), LocationError>;

    fn unsubscribe(&mut self);
}
