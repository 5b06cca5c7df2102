//! Which fixes reach the consumer, and what azimuth it sees.

use std::sync::Arc;

use ferry_types::{ConsumerEvent, EventSink, GpsStatus, LocationFix, OrientationSample, ProviderId};

use crate::declination::{DeclinationModel, DipoleModel, normalize_degrees};

/// Window inside which an identical fix is treated as a repeat.
pub const DEFAULT_DUPLICATE_WINDOW_MS: i64 = 100;

/// Fusion state for one consumer. Lives on the UI thread.
///
/// - While the primary provider holds a fix (last satellite report had
///   `satellites_used > 0`), fixes from any other provider are discarded.
/// - Each forwarded fix sets the declination applied to later orientation samples.
pub struct LocationFusion {
    sink: Arc<dyn EventSink>,
    model: Box<dyn DeclinationModel>,
    duplicate_window_ms: i64,
    has_fix: bool,
    declination: f32,
    last_forwarded: Option<LocationFix>,
}

impl LocationFusion {
    /// Fusion with the dipole declination model.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_model(sink, Box::new(DipoleModel::default()))
    }

    pub fn with_model(sink: Arc<dyn EventSink>, model: Box<dyn DeclinationModel>) -> Self {
        Self {
            sink,
            model,
            duplicate_window_ms: DEFAULT_DUPLICATE_WINDOW_MS,
            has_fix: false,
            declination: 0.0,
            last_forwarded: None,
        }
    }

    #[must_use]
    pub fn with_duplicate_window(mut self, window_ms: i64) -> Self {
        self.duplicate_window_ms = window_ms;
        self
    }

    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.has_fix
    }

    /// Degrees added to raw azimuth. Zero until the first fix is forwarded.
    #[must_use]
    pub fn declination(&self) -> f32 {
        self.declination
    }

    #[must_use]
    pub fn last_forwarded(&self) -> Option<&LocationFix> {
        self.last_forwarded.as_ref()
    }

    /// A position report. `None` (an empty last-known query) is ignored.
    pub fn on_location(&mut self, fix: Option<LocationFix>) {
        let Some(fix) = fix else {
            tracing::trace!("No location available");
            return;
        };

        if self.has_fix && !fix.provider.is_primary() {
            tracing::debug!(provider = %fix.provider, "Primary provider has a fix; fallback update discarded");
            return;
        }

        if let Some(last) = &self.last_forwarded
            && fix.time_ms.abs_diff(last.time_ms) < self.duplicate_window_ms.max(0) as u64
            && fix.same_position(last)
        {
            tracing::trace!(provider = %fix.provider, "Repeated fix dropped");
            return;
        }

        self.declination = self
            .model
            .declination(fix.lat, fix.lng, fix.altitude, fix.time_ms);
        self.last_forwarded = Some(fix);
        self.sink.deliver(ConsumerEvent::Location(fix));
    }

    /// Satellite status from the primary provider.
    pub fn on_gps_status(&mut self, satellites_visible: i32, satellites_used: i32) {
        let status = GpsStatus::new(satellites_visible, satellites_used);
        if status.has_fix != self.has_fix {
            tracing::debug!(has_fix = status.has_fix, satellites_used, "GPS fix changed");
        }
        self.has_fix = status.has_fix;
        self.sink.deliver(ConsumerEvent::GpsStatus(status));
    }

    pub fn on_provider_disabled(&mut self, provider: ProviderId) {
        tracing::info!(%provider, "Location provider disabled");
        if provider.is_primary() {
            self.has_fix = false;
            self.sink
                .deliver(ConsumerEvent::GpsStatus(GpsStatus::disabled()));
        }
    }

    pub fn on_provider_enabled(&mut self, provider: ProviderId) {
        tracing::info!(%provider, "Location provider enabled");
    }

    /// A raw magnetic sample; forwarded with the azimuth corrected to true north.
    pub fn on_orientation(&mut self, raw: OrientationSample) {
        let corrected = OrientationSample {
            azimuth: normalize_degrees(raw.azimuth + self.declination),
            ..raw
        };
        self.sink.deliver(ConsumerEvent::Orientation(corrected));
    }

    /// Forget the fix state. The declination is kept.
    pub fn reset(&mut self) {
        self.has_fix = false;
        self.last_forwarded = None;
    }
}
