#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the accident risk engine.
//!
//! A thin HTTP layer over [`RiskEngine`]: request bodies are validated and
//! converted here, every computation happens in the engine. Routes live
//! under `/api`.

mod handlers;

use std::sync::Arc;

use accident_risk_engine::RiskEngine;
use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};

/// Shared application state.
pub struct AppState {
    /// The engine every handler runs against.
    pub engine: Arc<RiskEngine>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: RiskEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Registers the `/api` routes and the JSON/query extractor error
/// handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "error": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "error": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/model/reload", web::post().to(handlers::reload_model))
            .service(
                web::scope("/prediction")
                    .route("/risk", web::post().to(handlers::predict_risk))
                    .route("/route-analysis", web::post().to(handlers::analyze_route)),
            )
            .service(
                web::scope("/accidents")
                    .route("", web::post().to(handlers::create_accident))
                    .route("", web::get().to(handlers::list_accidents))
                    .route("/nearby", web::post().to(handlers::nearby_accidents))
                    .route("/statistics", web::get().to(handlers::statistics))
                    .route("/segments", web::get().to(handlers::list_segments))
                    .route("/{id}", web::delete().to(handlers::delete_accident)),
            )
            .route(
                "/segments/{key}/recompute",
                web::post().to(handlers::recompute_segment),
            ),
    );
}

/// Starts the HTTP server on `BIND_ADDR`:`PORT` (default
/// `127.0.0.1:8080`). The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(state: web::Data<AppState>) -> std::io::Result<()> {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
