//! Location and orientation fusion for Ferry.
//!
//! Platform providers report position fixes, satellite status and raw compass
//! samples on the UI thread. [`LocationFusion`] decides which fixes reach the
//! consumer (the primary provider wins while it holds a fix) and corrects the
//! magnetic azimuth to true north using the declination at the last forwarded fix.
//! [`LocationService`] owns the subscriptions.

mod declination;
mod fusion;
mod provider;
mod service;

pub use declination::{ConstantDeclination, DeclinationModel, DipoleModel, normalize_degrees};
pub use fusion::{DEFAULT_DUPLICATE_WINDOW_MS, LocationFusion};
pub use provider::{LocationError, OrientationSensor, PositionProvider};
pub use service::{LocationService, LocationSettings, ServiceState};
