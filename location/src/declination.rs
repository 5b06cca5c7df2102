//! Magnetic declination models.

use chrono::{DateTime, Datelike, NaiveDate};

/// Angle between magnetic and true north, in degrees, positive east.
pub trait DeclinationModel: Send + Sync {
    fn declination(&self, lat: f64, lng: f64, altitude_m: f64, time_ms: i64) -> f32;
}

/// Same declination everywhere. For platforms that compute it themselves and for
/// tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDeclination(pub f32);

impl DeclinationModel for ConstantDeclination {
    fn declination(&self, _lat: f64, _lng: f64, _altitude_m: f64, _time_ms: i64) -> f32 {
        self.0
    }
}

/// Centered tilted dipole from the degree-1 IGRF Gauss coefficients.
///
/// The horizontal field of a centered dipole points along the great circle to the
/// geomagnetic north pole, so declination is the initial bearing to that pole.
/// Accurate to a few degrees away from the poles; altitude has no effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleModel {
    epoch: f64,
    g10: f64,
    g11: f64,
    h11: f64,
    /// Secular variation, nT/year.
    g10_sv: f64,
    g11_sv: f64,
    h11_sv: f64,
}

impl Default for DipoleModel {
    /// IGRF-13, epoch 2020.0.
    fn default() -> Self {
        Self {
            epoch: 2020.0,
            g10: -29_404.8,
            g11: -1_450.9,
            h11: 4_652.5,
            g10_sv: 5.7,
            g11_sv: 7.4,
            h11_sv: -25.9,
        }
    }
}

impl DipoleModel {
    /// Geomagnetic north pole `(lat, lng)` in degrees at a decimal year.
    #[must_use]
    pub fn pole(&self, year: f64) -> (f64, f64) {
        let dt = year - self.epoch;
        let g10 = self.g10 + self.g10_sv * dt;
        let g11 = self.g11 + self.g11_sv * dt;
        let h11 = self.h11 + self.h11_sv * dt;
        let b0 = (g10 * g10 + g11 * g11 + h11 * h11).sqrt();
        let colat = (-g10 / b0).acos();
        let lat = 90.0 - colat.to_degrees();
        let lng = (-h11).atan2(-g11).to_degrees();
        (lat, lng)
    }
}

impl DeclinationModel for DipoleModel {
    fn declination(&self, lat: f64, lng: f64, _altitude_m: f64, time_ms: i64) -> f32 {
        let year = decimal_year(time_ms).unwrap_or(self.epoch);
        let (pole_lat, pole_lng) = self.pole(year);
        initial_bearing(lat, lng, pole_lat, pole_lng) as f32
    }
}

/// Great-circle initial bearing from point 1 to point 2, in `(-180, 180]`.
fn initial_bearing(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlambda = (lng2 - lng1).to_radians();
    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    y.atan2(x).to_degrees()
}

fn decimal_year(time_ms: i64) -> Option<f64> {
    let date = DateTime::from_timestamp_millis(time_ms)?.date_naive();
    let days = NaiveDate::from_ymd_opt(date.year(), 12, 31)?.ordinal();
    Some(f64::from(date.year()) + f64::from(date.ordinal0()) / f64::from(days))
}

/// Wrap an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
