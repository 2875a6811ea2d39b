//! Exact radius search over the accident store.
//!
//! The store can only answer axis-aligned bounding-box queries, so a search
//! runs in two stages: a conservative box around the center pulls
//! candidates, then every candidate's exact haversine distance decides
//! membership. The box must never be tighter than the circle, otherwise
//! true neighbors would be lost before the exact check sees them.

use std::f64::consts::FRAC_PI_2;

use accident_risk_accident_models::{AccidentRecord, Coordinate};
use accident_risk_database::{AccidentStore, StoreError};
use accident_risk_database_models::BoundingBox;

use crate::{EARTH_RADIUS_KM, distance_km};

/// Approximate kilometers per degree of latitude (true value ~111.195, so
/// dividing by this slightly overestimates the degree offset).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Lower bound for `cos(latitude)` so the longitude offset stays finite
/// near the poles.
const MIN_COS_LATITUDE: f64 = 1e-6;

/// Relative slack added to the exact longitude extent to absorb rounding.
const LONGITUDE_SLACK: f64 = 1e-9;

/// An accident returned by [`find_nearby`], annotated with its distance
/// from the query center. The annotation belongs to this query result
/// only.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The accident snapshot.
    pub accident: AccidentRecord,
    /// Exact great-circle distance from the query center.
    pub distance_km: f64,
}

/// Bounding boxes that together cover every point within `radius_km` of
/// `center`.
///
/// Usually a single box. Boxes crossing the antimeridian are split in two,
/// and a circle reaching a pole widens to every longitude. Returns no
/// boxes for a negative or NaN radius.
#[must_use]
pub fn search_bounds(center: Coordinate, radius_km: f64) -> Vec<BoundingBox> {
    if radius_km.is_nan() || radius_km < 0.0 {
        return Vec::new();
    }

    let lat_offset = radius_km / KM_PER_DEGREE;
    let south = (center.latitude - lat_offset).max(-90.0);
    let north = (center.latitude + lat_offset).min(90.0);

    let Some(lon_offset) = longitude_offset(center.latitude, radius_km) else {
        return vec![BoundingBox::new(-180.0, south, 180.0, north)];
    };
    if south <= -90.0 || north >= 90.0 || lon_offset >= 180.0 {
        return vec![BoundingBox::new(-180.0, south, 180.0, north)];
    }

    let west = center.longitude - lon_offset;
    let east = center.longitude + lon_offset;

    if west < -180.0 {
        vec![
            BoundingBox::new(west + 360.0, south, 180.0, north),
            BoundingBox::new(-180.0, south, east, north),
        ]
    } else if east > 180.0 {
        vec![
            BoundingBox::new(west, south, 180.0, north),
            BoundingBox::new(-180.0, south, east - 360.0, north),
        ]
    } else {
        vec![BoundingBox::new(west, south, east, north)]
    }
}

/// Longitude half-width in degrees, or `None` when the circle contains a
/// pole and every longitude is reachable.
///
/// Takes the larger of the flat-earth estimate `r / (111 * cos(lat))` and
/// the exact spherical-cap extent `asin(sin(r / R) / cos(lat))`; the flat
/// estimate alone undershoots at high latitudes.
fn longitude_offset(latitude: f64, radius_km: f64) -> Option<f64> {
    let cos_lat = latitude.to_radians().cos().abs().max(MIN_COS_LATITUDE);
    let flat = radius_km / (KM_PER_DEGREE * cos_lat);

    let angular = radius_km / EARTH_RADIUS_KM;
    if angular >= FRAC_PI_2 {
        return None;
    }
    let ratio = angular.sin() / cos_lat;
    if ratio >= 1.0 {
        return None;
    }
    let exact = ratio.asin().to_degrees() * (1.0 + LONGITUDE_SLACK);

    Some(flat.max(exact))
}

/// Accidents within `radius_km` of `center`, nearest first, at most
/// `limit` of them.
///
/// Ties in distance are broken by accident id so results are
/// reproducible.
///
/// # Errors
///
/// Returns [`StoreError`] if the store lookup fails.
pub fn find_nearby(
    store: &dyn AccidentStore,
    center: Coordinate,
    radius_km: f64,
    limit: usize,
) -> Result<Vec<Neighbor>, StoreError> {
    let mut neighbors = Vec::new();
    let mut candidates = 0_usize;

    for bbox in search_bounds(center, radius_km) {
        for accident in store.query_by_bounding_box(&bbox)? {
            candidates += 1;
            let distance_km = distance_km(center, accident.location);
            if distance_km <= radius_km {
                neighbors.push(Neighbor {
                    accident,
                    distance_km,
                });
            }
        }
    }

    neighbors.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.accident.id.cmp(&b.accident.id))
    });
    neighbors.dedup_by_key(|n| n.accident.id);
    neighbors.truncate(limit);

    log::debug!(
        "find_nearby({:.5}, {:.5}, {radius_km} km): {candidates} candidates, {} within radius",
        center.latitude,
        center.longitude,
        neighbors.len()
    );

    Ok(neighbors)
}
