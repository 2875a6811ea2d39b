#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident risk engine.
//!
//! [`RiskEngine`] ties the accident store, the risk model and the engine
//! settings together and exposes the operations the HTTP layer calls:
//! point and route assessment, cell recomputation, accident reporting and
//! removal, statistics and listings.
//!
//! Every operation that depends on the current time takes `now`
//! explicitly, which keeps recomputation idempotent and tests
//! deterministic.
//!
//! Membership changes (reporting, removal, rebuilds) and the cell
//! recomputes they trigger run under one engine-wide lock, so a recompute
//! never writes back statistics read before a concurrent change.

pub mod aggregate;
pub mod classify;
pub mod messages;
pub mod route;
pub mod settings;
pub mod stats;

use std::sync::{Arc, Mutex, MutexGuard};

use accident_risk_accident_models::scoring::SCORING_TABLES;
use accident_risk_accident_models::{
    AccidentRecord, Coordinate, InvalidCoordinateError, NewAccident, RoadType, WeatherCondition,
};
use accident_risk_database::{AccidentStore, StoreError};
use accident_risk_database_models::{AccidentQuery, BoundingBox, CellQuery, SpatialCell};
use accident_risk_engine_models::{
    AccidentStatistics, PointQuery, RiskAssessment, RouteAssessment, RoutePoint,
};
use accident_risk_model::{ModelHandle, ModelInput};
use accident_risk_spatial::{Neighbor, cell_key, cell_origin, find_nearby};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::classify::RiskThresholds;
use crate::route::RouteParams;
use crate::settings::RiskSettings;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller supplied unusable input. Nothing was computed.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong.
        message: String,
    },

    /// Thresholds violate `0 <= low < high <= max`.
    #[error("Invalid thresholds: low {low}, high {high} (need 0 <= low < high <= {max})")]
    InvalidThresholds {
        /// Low threshold.
        low: f64,
        /// High threshold.
        high: f64,
        /// Upper end of the scale.
        max: f64,
    },

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<InvalidCoordinateError> for EngineError {
    fn from(e: InvalidCoordinateError) -> Self {
        Self::InvalidInput {
            message: e.to_string(),
        }
    }
}

/// Rejects coordinates outside the WGS84 ranges.
pub(crate) fn check_coordinate(location: Coordinate) -> Result<Coordinate, EngineError> {
    Coordinate::validated(location.latitude, location.longitude).map_err(Into::into)
}

/// The risk engine context: store, model and settings.
pub struct RiskEngine {
    store: Arc<dyn AccidentStore>,
    model: Arc<ModelHandle>,
    settings: RiskSettings,
    point_thresholds: RiskThresholds,
    route_thresholds: RiskThresholds,
    membership: Mutex<()>,
}

impl std::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RiskEngine {
    /// Creates an engine over `store` and `model`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if `settings` fail validation.
    pub fn new(
        store: Arc<dyn AccidentStore>,
        model: Arc<ModelHandle>,
        settings: RiskSettings,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self {
            point_thresholds: settings.point_thresholds()?,
            route_thresholds: settings.route_thresholds()?,
            store,
            model,
            settings,
            membership: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn store(&self) -> &dyn AccidentStore {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    #[must_use]
    pub const fn settings(&self) -> &RiskSettings {
        &self.settings
    }

    /// Reloads the model from the configured artifact paths. Returns
    /// whether a trained model is now active.
    pub fn reload_model(&self) -> bool {
        self.model
            .reload(&self.settings.model_path, &self.settings.scaler_path)
    }

    /// Assesses the accident risk at a single location.
    ///
    /// Unset conditions default to `now`, clear weather and an urban road.
    /// Time-of-day rules read the query timestamp's own wall clock.
    /// Historical context is the number of accidents within the configured
    /// radius.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for an out-of-range coordinate
    /// or [`EngineError::Store`] if the neighbor lookup fails.
    pub fn assess_point(
        &self,
        query: &PointQuery,
        now: DateTime<Utc>,
    ) -> Result<RiskAssessment, EngineError> {
        let location = check_coordinate(query.location)?;
        let nearby = find_nearby(
            self.store(),
            location,
            self.settings.nearby_radius_km,
            self.settings.nearby_limit,
        )?;
        let nearby_accidents = u32::try_from(nearby.len()).unwrap_or(u32::MAX);
        let assessed_at = query.timestamp.unwrap_or_else(|| now.fixed_offset());

        let prediction = self.model.predict(&ModelInput {
            location,
            timestamp: Some(assessed_at.naive_local()),
            now: now.naive_utc(),
            weather: Some(query.weather.unwrap_or(WeatherCondition::Clear)),
            road_type: Some(query.road_type.unwrap_or(RoadType::Urban)),
            historical_accidents: nearby_accidents,
        });
        let risk_level = self.point_thresholds.classify(prediction.probability);

        log::debug!(
            "assess_point({:.5}, {:.5}): p={:.3} ({risk_level}, {:?}), {nearby_accidents} nearby",
            location.latitude,
            location.longitude,
            prediction.probability,
            prediction.source
        );

        Ok(RiskAssessment {
            location,
            risk_level,
            risk_probability: prediction.probability,
            risk_score: prediction.probability * 100.0,
            source: prediction.source,
            nearby_accidents,
            cell_key: Some(cell_key(location, self.settings.cell_precision)),
            message: messages::risk_message(risk_level, self.settings.language),
            assessed_at,
        })
    }

    /// Assesses a route of at least two points.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for fewer than two points or
    /// an out-of-range coordinate, or [`EngineError::Store`] if a neighbor
    /// lookup fails.
    pub fn assess_route(
        &self,
        points: &[RoutePoint],
        now: DateTime<Utc>,
    ) -> Result<RouteAssessment, EngineError> {
        route::analyze_route(self.store(), &self.model, &self.route_params(), points, now)
    }

    fn route_params(&self) -> RouteParams {
        RouteParams {
            leg_radius_km: self.settings.route_leg_radius_km,
            nearby_limit: self.settings.nearby_limit,
            average_speed_kmh: self.settings.average_speed_kmh,
            leg_thresholds: self.point_thresholds,
            route_thresholds: self.route_thresholds,
            language: self.settings.language,
        }
    }

    /// Recomputes the statistics of cell `key` as of `now`. Returns the
    /// updated cell, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read or
    /// written.
    pub fn recompute_cell(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SpatialCell>, EngineError> {
        let _membership = self.lock_membership()?;
        self.recompute_locked(key, now)
    }

    fn recompute_locked(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SpatialCell>, EngineError> {
        Ok(aggregate::recompute(
            self.store(),
            key,
            self.settings.cell_padding_deg,
            &SCORING_TABLES,
            &self.point_thresholds,
            now,
        )?)
    }

    /// Stores a new accident, creating its cell if needed, and recomputes
    /// every cell whose padded bounds contain it.
    ///
    /// The cell is created before the record is stored, so a failure there
    /// leaves no record behind.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for an out-of-range coordinate
    /// or [`EngineError::Store`] if the store fails.
    pub fn report_accident(
        &self,
        accident: NewAccident,
        now: DateTime<Utc>,
    ) -> Result<AccidentRecord, EngineError> {
        check_coordinate(accident.location)?;
        let _membership = self.lock_membership()?;
        self.ensure_cell(
            accident.location,
            accident.road_name.as_deref(),
            accident.road_type,
        )?;
        let record = self.store.insert_accident(accident)?;
        let updated = self.recompute_around(record.location, now)?;

        log::info!(
            "Reported accident {} ({}) at {:.5}, {:.5}; {updated} cell(s) recomputed",
            record.id,
            record.severity,
            record.location.latitude,
            record.location.longitude
        );

        Ok(record)
    }

    /// Removes an accident and recomputes the cells it counted toward.
    /// Returns the removed record, or `None` if no such accident exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store fails.
    pub fn remove_accident(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<AccidentRecord>, EngineError> {
        let _membership = self.lock_membership()?;
        let Some(record) = self.store.remove_accident(id)? else {
            return Ok(None);
        };
        let updated = self.recompute_around(record.location, now)?;
        log::info!("Removed accident {id}; {updated} cell(s) recomputed");
        Ok(Some(record))
    }

    /// Creates a cell for every stored accident that lacks one, then
    /// recomputes every cell. Returns the number of cells.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store fails.
    pub fn rebuild_cells(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let _membership = self.lock_membership()?;
        for record in self.store.list_accidents(&AccidentQuery::default())? {
            self.ensure_cell(record.location, record.road_name.as_deref(), record.road_type)?;
        }

        let cells = self.store.list_cells(&CellQuery::default())?;
        for cell in &cells {
            self.recompute_locked(&cell.key, now)?;
        }

        log::info!("Rebuilt {} cell(s)", cells.len());
        Ok(cells.len())
    }

    /// Accidents within `radius_km` of `center`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for an out-of-range coordinate
    /// or a non-positive radius, or [`EngineError::Store`] if the lookup
    /// fails.
    pub fn nearby(
        &self,
        center: Coordinate,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<Neighbor>, EngineError> {
        let center = check_coordinate(center)?;
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(EngineError::InvalidInput {
                message: format!("radius must be a positive number of kilometers, got {radius_km}"),
            });
        }
        Ok(find_nearby(self.store(), center, radius_km, limit)?)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read.
    pub fn get_accident(&self, id: i64) -> Result<Option<AccidentRecord>, EngineError> {
        Ok(self.store.get_accident(id)?)
    }

    /// Accidents matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read.
    pub fn list_accidents(&self, query: &AccidentQuery) -> Result<Vec<AccidentRecord>, EngineError> {
        Ok(self.store.list_accidents(query)?)
    }

    /// Cells matching `query`, highest risk first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read.
    pub fn list_cells(&self, query: &CellQuery) -> Result<Vec<SpatialCell>, EngineError> {
        Ok(self.store.list_cells(query)?)
    }

    /// Statistics for the `days` before `now`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the store cannot be read.
    pub fn statistics(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<AccidentStatistics, EngineError> {
        Ok(stats::accident_statistics(self.store(), days, now)?)
    }

    fn lock_membership(&self) -> Result<MutexGuard<'_, ()>, EngineError> {
        self.membership
            .lock()
            .map_err(|_| EngineError::Store(StoreError::Poisoned))
    }

    /// Creates the cell containing `location` if it does not exist yet.
    fn ensure_cell(
        &self,
        location: Coordinate,
        road_name: Option<&str>,
        road_type: Option<RoadType>,
    ) -> Result<(), EngineError> {
        let precision = self.settings.cell_precision;
        let key = cell_key(location, precision);
        if self.store.get_cell(&key)?.is_some() {
            return Ok(());
        }

        let origin = cell_origin(location, precision);
        let mut cell = SpatialCell::new(key, origin, origin);
        cell.road_name = road_name.map(str::to_string);
        cell.road_type = road_type;
        log::debug!("Creating cell {}", cell.key);
        self.store.upsert_cell(cell)?;
        Ok(())
    }

    /// Recomputes every existing cell whose padded bounds contain
    /// `location`. Returns how many were recomputed. The caller holds the
    /// membership lock.
    fn recompute_around(
        &self,
        location: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let padding = self.settings.cell_padding_deg;
        // coarse; the padded-bounds test below decides
        let search = BoundingBox::from_corners(location, location).padded(padding * 2.0);
        let affected: Vec<String> = self
            .store
            .cells_intersecting(&search)?
            .into_iter()
            .filter(|cell| cell.bounds(padding).contains(location))
            .map(|cell| cell.key)
            .collect();

        for key in &affected {
            self.recompute_locked(key, now)?;
        }
        Ok(affected.len())
    }
}
