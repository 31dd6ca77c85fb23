//! Great-circle distance between report and issue locations.

use crate::constants::EARTH_MEAN_RADIUS_METERS;
use civic_types::Coordinates;

/// Haversine distance between two points, in meters.
///
/// Uses a spherical Earth with the IUGG mean radius. At dedup radii (tens to hundreds of meters)
/// the difference from an ellipsoidal distance is well below GPS error.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lng = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `h` a hair above 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_MEAN_RADIUS_METERS * c
}

/// Point `meters` north of `origin`. Test and tooling helper for building nearby reports.
pub fn offset_north(origin: Coordinates, meters: f64) -> Option<Coordinates> {
    let d_lat = (meters / EARTH_MEAN_RADIUS_METERS).to_degrees();
    Coordinates::new(origin.latitude() + d_lat, origin.longitude()).ok()
}
