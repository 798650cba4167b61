use serde::{Deserialize, Serialize};

/// A "part" of a coordinate
pub type CoordinateComponent = f64;

/// Mean radius of the Earth in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Walking speed assumed when estimating how long reaching a place takes
pub const WALK_SPEED_KMH: f64 = 5.0;

/// Distance below which the user counts as having reached a place (50 meters)
pub const ARRIVAL_THRESHOLD_KM: f64 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, specta::Type)]
/// Some point in the world as gotten from a Geolocation API
pub struct Coordinate {
    /// Latitude in degrees
    pub lat: CoordinateComponent,
    /// Longitude in degrees
    pub long: CoordinateComponent,
}

/// Great-circle distance between two coordinates in kilometers (haversine)
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_long = (to.long - from.long).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_long / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimated minutes to cover `distance_km` on foot, straight line, no routing
pub fn walk_eta_minutes(distance_km: f64) -> u32 {
    (distance_km / WALK_SPEED_KMH * 60.0).round() as u32
}

/// Whether `distance_km` is close enough to count as arrived
pub fn within_arrival(distance_km: f64) -> bool {
    distance_km < ARRIVAL_THRESHOLD_KM
}

#[derive(Debug, Clone, PartialEq)]
/// A single update from a live position feed
pub enum LocationUpdate {
    /// A new position fix
    Fix(Coordinate),
    /// The platform refused to provide positions
    PermissionDenied,
    /// The feed shut down and will produce no more fixes
    Ended,
}

pub trait LocationFeed: Send + Sync {
    /// Wait for the next update from the feed
    fn next_update(&self) -> impl Future<Output = LocationUpdate>;

    /// Tear the feed down, releasing the underlying platform watcher
    fn stop(&self) -> impl Future<Output = ()> {
        async {}
    }
}
