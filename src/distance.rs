// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in kilometers.
pub const EARTH_RADIUS: f64 = 6371.0;

/// Mean diameter of Earth, in kilometers.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Number of meters in a kilometer, used to convert [earth_distance]
/// into the unit of [Edge lengths](crate::Edge).
pub const METERS_PER_KILOMETER: f64 = 1000.0;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in kilometers.
///
/// Coincident positions are exactly 0 apart, and the function is symmetric.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Rounding may push h slightly outside of asin's domain for antipodal points.
    EARTH_DIAMETER * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Returns a lower bound of the distance (in kilometers) from a position
/// to any point on the great circle through both poles and `meridian_lon`.
pub(crate) fn meridian_distance(lat: f64, lon: f64, meridian_lon: f64) -> f64 {
    let dlon = (lon - meridian_lon).to_radians();
    let x = (dlon.sin().abs() * lat.to_radians().cos()).clamp(0.0, 1.0);
    EARTH_RADIUS * x.asin()
}

/// Returns the distance (in kilometers) from a position to the parallel at `parallel_lat`.
pub(crate) fn parallel_distance(lat: f64, parallel_lat: f64) -> f64 {
    EARTH_RADIUS * (lat - parallel_lat).to_radians().abs()
}
