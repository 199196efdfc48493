use chrono::{Datelike, Timelike};
use tracing::debug;

use crate::error::Result;
use crate::types::{SunPosition, SunPositionMethod, Timestamp};

pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.01;
pub const ASTRONOMICAL_UNIT_KM: f64 = 149_597_890.0;
pub const J2000_JULIAN_DATE: f64 = 2_451_545.0;

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * (180.0 / std::f64::consts::PI)
}

/// Maps any angle into [0, 360).
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

pub fn decimal_hours(ts: &Timestamp) -> f64 {
    ts.hour() as f64 + (ts.minute() as f64 + ts.second() as f64 / 60.0) / 60.0
}

/// Julian date with truncating integer division on the civil date.
pub fn julian_date(ts: &Timestamp) -> f64 {
    let year = ts.year() as i64;
    let month = ts.month() as i64;
    let day = ts.day() as i64;
    let aux1 = (month - 14) / 12;
    let aux2 = (1461 * (year + 4800 + aux1)) / 4 + (367 * (month - 2 - 12 * aux1)) / 12
        - (3 * ((year + 4900 + aux1) / 100)) / 4
        + day
        - 32075;
    aux2 as f64 - 0.5 + decimal_hours(ts) / 24.0
}

pub fn elapsed_julian_days(ts: &Timestamp) -> f64 {
    julian_date(ts) - J2000_JULIAN_DATE
}

/// Returns `(right_ascension, declination)` in radians.
pub fn celestial_coordinates(elapsed_days: f64) -> (f64, f64) {
    let n = elapsed_days;
    let omega = 2.1429 - 0.0010394594 * n;
    let mean_longitude = 4.8950630 + 0.017202791698 * n;
    let mean_anomaly = 6.2400600 + 0.0172019699 * n;
    let ecliptic_longitude = mean_longitude
        + 0.03341607 * mean_anomaly.sin()
        + 0.00034894 * (2.0 * mean_anomaly).sin()
        - 0.0001134
        - 0.0000203 * omega.sin();
    let ecliptic_obliquity = 0.4090928 - 6.2140e-9 * n + 0.0000396 * omega.cos();

    let sin_ecliptic_longitude = ecliptic_longitude.sin();
    let y = ecliptic_obliquity.cos() * sin_ecliptic_longitude;
    let x = ecliptic_longitude.cos();
    let mut right_ascension = y.atan2(x);
    if right_ascension < 0.0 {
        right_ascension += 2.0 * std::f64::consts::PI;
    }
    let declination = (ecliptic_obliquity.sin() * sin_ecliptic_longitude).asin();
    (right_ascension, declination)
}

/// PSA algorithm (Blanco-Muriel et al. 2001). `timestamp` is UTC.
pub fn sun_position(timestamp: Timestamp, latitude: f64, longitude: f64) -> SunPosition {
    let hours = decimal_hours(&timestamp);
    let n = elapsed_julian_days(&timestamp);
    let (right_ascension, declination) = celestial_coordinates(n);

    let gmst = 6.6974243242 + 0.0657098283 * n + hours;
    let lmst = deg_to_rad(gmst * 15.0 + longitude);
    let hour_angle = lmst - right_ascension;

    let lat_rad = deg_to_rad(latitude);
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let cos_ha = hour_angle.cos();

    let cos_zenith = cos_lat * cos_ha * declination.cos() + declination.sin() * sin_lat;
    let zenith = cos_zenith.clamp(-1.0, 1.0).acos();
    let y = -hour_angle.sin();
    let x = declination.tan() * cos_lat - sin_lat * cos_ha;
    let azimuth = normalize_angle(rad_to_deg(y.atan2(x)));

    let parallax = (EARTH_MEAN_RADIUS_KM / ASTRONOMICAL_UNIT_KM) * zenith.sin();
    let zenith = rad_to_deg(zenith + parallax);

    SunPosition {
        timestamp,
        azimuth,
        zenith,
    }
}

/// One position per timestamp, in input order.
///
/// Latitude must be within [-90, 90] and longitude within [-180, 180];
/// neither is checked here.
pub fn compute_positions(
    timestamps: &[Timestamp],
    latitude: f64,
    longitude: f64,
    method: SunPositionMethod,
) -> Vec<SunPosition> {
    debug!(
        count = timestamps.len(),
        latitude,
        longitude,
        method = method.as_str(),
        "computing sun positions"
    );
    match method {
        SunPositionMethod::Psa => timestamps
            .iter()
            .map(|&ts| sun_position(ts, latitude, longitude))
            .collect(),
    }
}

/// Same as [`compute_positions`] with the method given by name.
/// Unknown names fail before anything is computed.
pub fn compute_positions_by_name(
    timestamps: &[Timestamp],
    latitude: f64,
    longitude: f64,
    method: &str,
) -> Result<Vec<SunPosition>> {
    let method = method.parse::<SunPositionMethod>()?;
    Ok(compute_positions(timestamps, latitude, longitude, method))
}
