//! Unit-sphere geometry shared by the loader and the mesh queries.
//!
//! Longitude is measured eastward from the prime meridian and latitude
//! northward from the equator, both in degrees.

/// Mean Earth radius in meters, used as the reference sphere.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Reduce a longitude into the half-open interval (-180, 180].
///
/// Values already in range are returned unchanged, so the function is
/// idempotent. Non-finite input is passed through.
pub fn normalize_longitude(lon: f64) -> f64 {
    if !lon.is_finite() || (lon > -180.0 && lon <= 180.0) {
        return lon;
    }
    let wrapped = lon.rem_euclid(360.0);
    if wrapped > 180.0 {
        // rem_euclid can round up to exactly 360.0 for tiny negative input
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped - 360.0
        }
    } else {
        wrapped
    }
}

/// Project a (longitude, latitude) pair in degrees onto the unit sphere.
pub fn project(lon_deg: f64, lat_deg: f64) -> [f64; 3] {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

/// Convert a great-circle arc length on the Earth to the equivalent chord
/// length on the unit sphere.
pub fn chord_length(meters: f64) -> f64 {
    chord_length_with_radius(meters, EARTH_RADIUS_M)
}

/// Same as [`chord_length`] for an arbitrary reference radius.
pub fn chord_length_with_radius(meters: f64, reference_radius: f64) -> f64 {
    2.0 * ((meters / reference_radius) / 2.0).sin()
}

/// Squared Euclidean distance between two points of the embedding.
pub fn distance_squared(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
