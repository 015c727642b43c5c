use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Mean Earth radius in meters, the usual haversine constant.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Rejects out-of-range values; NaN fails both comparisons and is
    /// rejected too.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AttendanceError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AttendanceError::InvalidCoordinate);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Outcome of a geofence check: whether the point is inside the radius, and
/// how far from the center it was measured.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GeoCheck {
    pub accepted: bool,
    pub distance_m: f64,
}

/// Great-circle distance in meters between two coordinates.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Pure inside/outside decision against a circular fence around `center`.
pub fn validate(
    point: Coordinate,
    center: Coordinate,
    radius_m: f64,
) -> Result<GeoCheck, AttendanceError> {
    // Re-validated here so callers constructing Coordinate directly from
    // deserialized payloads still cannot smuggle bad values through.
    let point = Coordinate::new(point.latitude, point.longitude)?;
    let center = Coordinate::new(center.latitude, center.longitude)?;

    let distance_m = haversine_m(point, center);
    Ok(GeoCheck {
        accepted: distance_m <= radius_m,
        distance_m,
    })
}
