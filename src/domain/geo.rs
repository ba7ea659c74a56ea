//! Great-circle distance and waypoint proximity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Radius within which a tourist counts as standing at a key point, in meters.
pub const PROXIMITY_THRESHOLD_METERS: f64 = 15.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both coordinates are finite and within the WGS84
    /// ranges (`[-90, 90]` and `[-180, 180]`).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two points in meters.
///
/// NaN coordinates propagate to a NaN distance.
#[must_use]
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let half_chord = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_METERS * angle
}

/// Returns `true` iff the two points are at most
/// [`PROXIMITY_THRESHOLD_METERS`] apart. A NaN distance is never nearby.
#[must_use]
pub fn is_nearby(a: GeoPoint, b: GeoPoint) -> bool {
    haversine_distance(a, b) <= PROXIMITY_THRESHOLD_METERS
}
