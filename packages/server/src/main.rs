#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident risk API server binary.
//!
//! Loads settings and the risk model, optionally seeds the in-memory store
//! from an accident CSV, rebuilds the segment statistics and serves the
//! API.

use std::path::PathBuf;
use std::sync::Arc;

use accident_risk_database::import::read_accidents_csv_file;
use accident_risk_database::memory::MemoryStore;
use accident_risk_engine::RiskEngine;
use accident_risk_engine::settings::RiskSettings;
use accident_risk_model::ModelHandle;
use accident_risk_server::{AppState, run_server};
use actix_web::web;
use chrono::Utc;
use clap::Parser;

#[derive(Parser)]
#[command(name = "accident_risk_server")]
#[command(about = "Serve traffic accident risk predictions over HTTP")]
struct Cli {
    /// TOML settings file layered over the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accident CSV loaded into the store at startup.
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let settings = RiskSettings::load(cli.config.as_deref())?;

    let store = match &cli.seed {
        Some(path) => {
            let store = MemoryStore::with_accidents(read_accidents_csv_file(path)?.accidents);
            log::info!("Seeded store with {} accidents", store.accident_count()?);
            store
        }
        None => MemoryStore::new(),
    };

    log::info!("Loading risk model...");
    let model = ModelHandle::load(&settings.model_path, &settings.scaler_path);

    let engine = RiskEngine::new(Arc::new(store), Arc::new(model), settings)?;

    log::info!("Rebuilding segment statistics...");
    engine.rebuild_cells(Utc::now())?;

    run_server(web::Data::new(AppState::new(engine))).await?;
    Ok(())
}
