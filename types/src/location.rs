//! Position, satellite status and orientation records.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Providers
// ============================================================================

/// Source of a [`LocationFix`].
///
/// `Gps` is the primary provider. `Fused` and `Network` are fallback candidates;
/// which one is used is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gps,
    Fused,
    Network,
}

impl ProviderId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Fused => "fused",
            Self::Network => "network",
        }
    }

    #[must_use]
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Gps)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown location provider '{0}'; expected one of: gps, fused, network")]
pub struct UnknownProviderError(String);

impl FromStr for ProviderId {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gps" => Ok(Self::Gps),
            "fused" => Ok(Self::Fused),
            "network" => Ok(Self::Network),
            _ => Err(UnknownProviderError(s.to_string())),
        }
    }
}

/// Requested delivery rate for the orientation sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorRate {
    Normal,
    #[default]
    Ui,
    Game,
    Fastest,
}

impl SensorRate {
    /// Nominal sampling period in microseconds.
    #[must_use]
    pub const fn period_us(self) -> u32 {
        match self {
            Self::Normal => 200_000,
            Self::Ui => 66_667,
            Self::Game => 20_000,
            Self::Fastest => 0,
        }
    }
}

// ============================================================================
// LocationFix
// ============================================================================

/// One position report. Angles in degrees, distances in meters, speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Milliseconds since the Unix epoch.
    pub time_ms: i64,
    pub lat: f64,
    pub lng: f64,
    pub pos_error: f32,
    pub altitude: f64,
    pub alt_error: f32,
    /// Direction of travel.
    pub bearing: f32,
    pub bearing_error: f32,
    pub speed: f32,
    pub speed_error: f32,
    pub provider: ProviderId,
}

impl LocationFix {
    /// A fix with only position and time; every other field is zero.
    #[must_use]
    pub fn at(provider: ProviderId, time_ms: i64, lat: f64, lng: f64) -> Self {
        Self {
            time_ms,
            lat,
            lng,
            pos_error: 0.0,
            altitude: 0.0,
            alt_error: 0.0,
            bearing: 0.0,
            bearing_error: 0.0,
            speed: 0.0,
            speed_error: 0.0,
            provider,
        }
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: f64, alt_error: f32) -> Self {
        self.altitude = altitude;
        self.alt_error = alt_error;
        self
    }

    #[must_use]
    pub fn with_accuracy(mut self, pos_error: f32) -> Self {
        self.pos_error = pos_error;
        self
    }

    #[must_use]
    pub fn with_motion(mut self, bearing: f32, speed: f32) -> Self {
        self.bearing = bearing;
        self.speed = speed;
        self
    }

    /// Same position and altitude as `other` (exact comparison).
    #[must_use]
    pub fn same_position(&self, other: &Self) -> bool {
        self.lat == other.lat && self.lng == other.lng && self.altitude == other.altitude
    }
}

// ============================================================================
// GpsStatus
// ============================================================================

/// Satellite status of the primary provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsStatus {
    /// `-1` tells the consumer to hide its fix indicator.
    pub satellites_visible: i32,
    pub satellites_used: i32,
    pub has_fix: bool,
}

impl GpsStatus {
    #[must_use]
    pub const fn new(satellites_visible: i32, satellites_used: i32) -> Self {
        Self {
            satellites_visible,
            satellites_used,
            has_fix: satellites_used > 0,
        }
    }

    /// Status emitted when the primary provider is disabled.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            satellites_visible: -1,
            satellites_used: 0,
            has_fix: false,
        }
    }

    #[must_use]
    pub const fn hides_indicator(self) -> bool {
        self.satellites_visible < 0
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// Device orientation in degrees.
///
/// Raw samples carry the magnetic azimuth; samples delivered to the consumer carry
/// the declination-corrected azimuth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    pub time_ms: i64,
    pub azimuth: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl OrientationSample {
    #[must_use]
    pub const fn new(time_ms: i64, azimuth: f32, pitch: f32, roll: f32) -> Self {
        Self {
            time_ms,
            azimuth,
            pitch,
            roll,
        }
    }
}
