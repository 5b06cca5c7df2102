//! Subscription lifecycle around [`LocationFusion`].

use ferry_types::{LocationFix, OrientationSample, ProviderId, SensorRate};

use crate::fusion::{DEFAULT_DUPLICATE_WINDOW_MS, LocationFusion};
use crate::provider::{LocationError, OrientationSensor, PositionProvider};

/// Subscription parameters, usually from the `[location]` config section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSettings {
    pub min_interval_ms: u64,
    pub min_distance_m: f32,
    pub fallback_provider: ProviderId,
    pub orientation_rate: SensorRate,
    pub duplicate_window_ms: i64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            min_distance_m: 1.0,
            fallback_provider: ProviderId::Fused,
            orientation_rate: SensorRate::Ui,
            duplicate_window_ms: DEFAULT_DUPLICATE_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running {
        fallback_subscribed: bool,
        orientation_subscribed: bool,
    },
    /// Waiting for the platform to report that permission was granted.
    Suspended,
}

/// Owns the platform subscriptions and routes their callbacks into fusion.
pub struct LocationService<P, O> {
    positions: P,
    sensor: O,
    fusion: LocationFusion,
    settings: LocationSettings,
    state: ServiceState,
}

impl<P: PositionProvider, O: OrientationSensor> LocationService<P, O> {
    pub fn new(positions: P, sensor: O, fusion: LocationFusion, settings: LocationSettings) -> Self {
        Self {
            positions,
            sensor,
            fusion: fusion.with_duplicate_window(settings.duplicate_window_ms),
            settings,
            state: ServiceState::Stopped,
        }
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.state
    }

    #[must_use]
    pub fn fusion(&self) -> &LocationFusion {
        &self.fusion
    }

    #[must_use]
    pub fn positions(&self) -> &P {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut P {
        &mut self.positions
    }

    #[must_use]
    pub fn sensor(&self) -> &O {
        &self.sensor
    }

    /// Subscribe the primary and fallback providers and the orientation sensor, then
    /// seed fusion with the last known fix.
    ///
    /// `PermissionDenied` suspends the service until
    /// [`LocationService::on_permission_granted`]. A missing orientation sensor only
    /// disables orientation updates.
    pub fn start(&mut self) -> Result<(), LocationError> {
        if matches!(self.state, ServiceState::Running { .. }) {
            return Ok(());
        }
        let LocationSettings {
            min_interval_ms,
            min_distance_m,
            fallback_provider,
            orientation_rate,
            ..
        } = self.settings;

        let primary_subscribed =
            match self
                .positions
                .subscribe(ProviderId::Gps, min_interval_ms, min_distance_m)
            {
                Ok(()) => true,
                Err(LocationError::PermissionDenied) => return Err(self.suspend(&[])),
                Err(e) => {
                    tracing::warn!("Primary location provider not subscribed: {e}");
                    false
                }
            };

        let mut fallback_subscribed = false;
        if self.positions.is_available(fallback_provider) {
            match self
                .positions
                .subscribe(fallback_provider, min_interval_ms, min_distance_m)
            {
                Ok(()) => fallback_subscribed = true,
                Err(LocationError::PermissionDenied) => {
                    let subscribed: &[ProviderId] = if primary_subscribed {
                        &[ProviderId::Gps]
                    } else {
                        &[]
                    };
                    return Err(self.suspend(subscribed));
                }
                Err(e) => tracing::warn!("Fallback location provider not subscribed: {e}"),
            }
        }

        let seed_provider = if fallback_subscribed {
            fallback_provider
        } else {
            ProviderId::Gps
        };
        let seed = self.positions.last_known(seed_provider);
        self.fusion.on_location(seed);

        let orientation_subscribed = match self.sensor.subscribe(orientation_rate) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Orientation updates disabled: {e}");
                false
            }
        };

        tracing::info!(
            primary = primary_subscribed,
            fallback = fallback_subscribed,
            orientation = orientation_subscribed,
            "Location service started"
        );
        self.state = ServiceState::Running {
            fallback_subscribed,
            orientation_subscribed,
        };
        Ok(())
    }

    fn suspend(&mut self, subscribed: &[ProviderId]) -> LocationError {
        for provider in subscribed {
            self.positions.unsubscribe(*provider);
        }
        tracing::warn!("Location permission denied; service suspended");
        self.state = ServiceState::Suspended;
        LocationError::PermissionDenied
    }

    /// Restart a suspended service with the same parameters.
    pub fn on_permission_granted(&mut self) -> Result<(), LocationError> {
        if self.state != ServiceState::Suspended {
            return Ok(());
        }
        tracing::info!("Location permission granted; restarting");
        self.state = ServiceState::Stopped;
        self.start()
    }

    pub fn stop(&mut self) {
        if let ServiceState::Running {
            fallback_subscribed,
            orientation_subscribed,
        } = self.state
        {
            self.positions.unsubscribe(ProviderId::Gps);
            if fallback_subscribed {
                self.positions.unsubscribe(self.settings.fallback_provider);
            }
            if orientation_subscribed {
                self.sensor.unsubscribe();
            }
            tracing::info!("Location service stopped");
        }
        self.fusion.reset();
        self.state = ServiceState::Stopped;
    }

    // ── Platform callbacks ──────────────────────────────────────────────

    pub fn on_location_changed(&mut self, fix: Option<LocationFix>) {
        self.fusion.on_location(fix);
    }

    pub fn on_gps_status(&mut self, satellites_visible: i32, satellites_used: i32) {
        self.fusion.on_gps_status(satellites_visible, satellites_used);
    }

    pub fn on_provider_enabled(&mut self, provider: ProviderId) {
        self.fusion.on_provider_enabled(provider);
    }

    pub fn on_provider_disabled(&mut self, provider: ProviderId) {
        self.fusion.on_provider_disabled(provider);
    }

    pub fn on_sensor_changed(&mut self, raw: OrientationSample) {
        self.fusion.on_orientation(raw);
    }
}
