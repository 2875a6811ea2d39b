#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Spatial primitives for accident risk scoring.
//!
//! Provides haversine great-circle distance, the conservative bounding
//! boxes used to prefilter store lookups, exact radius neighbor search,
//! and the deterministic cell keys that bucket coordinates into roughly
//! 100m x 100m segments.

pub mod cell;
pub mod search;

use accident_risk_accident_models::Coordinate;

pub use cell::{DEFAULT_CELL_PRECISION, cell_key, cell_origin, round_to};
pub use search::{Neighbor, find_nearby, search_bounds};

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers, using the
/// haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
///
/// The endpoints are put in a canonical order first, so
/// `distance_km(a, b)` and `distance_km(b, a)` are bit-identical.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let (a, b) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Arithmetic midpoint of two coordinates.
///
/// Adequate for the short legs of a route; it does not follow the great
/// circle and is not meant for legs crossing the antimeridian.
#[must_use]
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}
