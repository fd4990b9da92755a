//! Great-circle distance and proximity grouping.
//!
//! Provides:
//! - Haversine distance between two coordinates
//! - Pairwise neighbour search over a named set of places
//! - Loading a city map and writing the nearby report as JSON

mod distance;
mod nearby;

pub use distance::{distance_km, Coordinate, EARTH_RADIUS_KM};
pub use nearby::{
    find_nearby, load_places, parse_places, write_report, NearbyPlace, NearbyReport, NearbySummary, PlaceReport,
    DEFAULT_THRESHOLD_KM,
};
