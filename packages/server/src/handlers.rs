//! HTTP handler functions for the accident risk API.

use accident_risk_accident_models::NewAccident;
use accident_risk_engine::EngineError;
use accident_risk_server_models::{
    AccidentCreate, AccidentListParams, ApiAccident, ApiDeleted, ApiHealth, ApiModelReload,
    ApiSegment, ApiStatistics, NearbyRequest, PredictionRequest, PredictionResponse,
    RequestError, RouteAnalysisRequest, RouteAnalysisResponse, SegmentListParams,
    StatisticsParams,
};
use actix_web::{HttpResponse, web};
use chrono::Utc;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.engine.model().is_trained(),
        timestamp: Utc::now(),
    })
}

/// `POST /api/model/reload`
///
/// Reloads the model artifacts from the configured paths.
pub async fn reload_model(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiModelReload {
        model_loaded: state.engine.reload_model(),
    })
}

/// `POST /api/prediction/risk`
///
/// Predicts the accident risk at a single location.
pub async fn predict_risk(
    state: web::Data<AppState>,
    body: web::Json<PredictionRequest>,
) -> HttpResponse {
    let query = match body.to_query() {
        Ok(query) => query,
        Err(e) => return rejected(&e),
    };

    match state.engine.assess_point(&query, Utc::now()) {
        Ok(assessment) => HttpResponse::Ok().json(PredictionResponse::from(assessment)),
        Err(e) => engine_failure(&e, "predict risk"),
    }
}

/// `POST /api/prediction/route-analysis`
///
/// Scores every leg of a route and the route as a whole.
pub async fn analyze_route(
    state: web::Data<AppState>,
    body: web::Json<RouteAnalysisRequest>,
) -> HttpResponse {
    match state.engine.assess_route(&body.points(), Utc::now()) {
        Ok(route) => HttpResponse::Ok().json(RouteAnalysisResponse::from(route)),
        Err(e) => engine_failure(&e, "analyze route"),
    }
}

/// `POST /api/accidents`
///
/// Stores a reported accident and recomputes the affected segments.
pub async fn create_accident(
    state: web::Data<AppState>,
    body: web::Json<AccidentCreate>,
) -> HttpResponse {
    let accident = match NewAccident::try_from(body.into_inner()) {
        Ok(accident) => accident,
        Err(e) => return rejected(&e),
    };

    match state.engine.report_accident(accident, Utc::now()) {
        Ok(record) => HttpResponse::Ok().json(ApiAccident::from(record)),
        Err(e) => engine_failure(&e, "create accident"),
    }
}

/// `POST /api/accidents/nearby`
///
/// Accidents within the requested radius, nearest first.
pub async fn nearby_accidents(
    state: web::Data<AppState>,
    body: web::Json<NearbyRequest>,
) -> HttpResponse {
    let center = match body.center() {
        Ok(center) => center,
        Err(e) => return rejected(&e),
    };

    match state
        .engine
        .nearby(center, body.radius_km, body.limit as usize)
    {
        Ok(neighbors) => {
            let accidents: Vec<ApiAccident> =
                neighbors.into_iter().map(ApiAccident::from).collect();
            HttpResponse::Ok().json(accidents)
        }
        Err(e) => engine_failure(&e, "fetch nearby accidents"),
    }
}

/// `GET /api/accidents`
///
/// Lists accidents newest first, with severity and date filters.
pub async fn list_accidents(
    state: web::Data<AppState>,
    params: web::Query<AccidentListParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return rejected(&e),
    };

    match state.engine.list_accidents(&query) {
        Ok(records) => {
            let accidents: Vec<ApiAccident> = records.into_iter().map(ApiAccident::from).collect();
            HttpResponse::Ok().json(accidents)
        }
        Err(e) => engine_failure(&e, "list accidents"),
    }
}

/// `GET /api/accidents/statistics`
pub async fn statistics(
    state: web::Data<AppState>,
    params: web::Query<StatisticsParams>,
) -> HttpResponse {
    let days = match params.days() {
        Ok(days) => days,
        Err(e) => return rejected(&e),
    };

    match state.engine.statistics(days, Utc::now()) {
        Ok(stats) => HttpResponse::Ok().json(ApiStatistics::from(stats)),
        Err(e) => engine_failure(&e, "get statistics"),
    }
}

/// `GET /api/accidents/segments`
///
/// Lists road segments by descending risk score.
pub async fn list_segments(
    state: web::Data<AppState>,
    params: web::Query<SegmentListParams>,
) -> HttpResponse {
    let query = match params.to_query() {
        Ok(query) => query,
        Err(e) => return rejected(&e),
    };

    match state.engine.list_cells(&query) {
        Ok(cells) => {
            let segments: Vec<ApiSegment> = cells.into_iter().map(ApiSegment::from).collect();
            HttpResponse::Ok().json(segments)
        }
        Err(e) => engine_failure(&e, "list segments"),
    }
}

/// `DELETE /api/accidents/{id}`
pub async fn delete_accident(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    match state.engine.remove_accident(id, Utc::now()) {
        Ok(Some(_)) => HttpResponse::Ok().json(ApiDeleted {
            message: "Accident deleted successfully".to_string(),
            id,
        }),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Accident not found"
        })),
        Err(e) => engine_failure(&e, "delete accident"),
    }
}

/// `POST /api/segments/{key}/recompute`
pub async fn recompute_segment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    match state.engine.recompute_cell(&path, Utc::now()) {
        Ok(Some(cell)) => HttpResponse::Ok().json(ApiSegment::from(cell)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Segment not found"
        })),
        Err(e) => engine_failure(&e, "recompute segment"),
    }
}

fn rejected(e: &RequestError) -> HttpResponse {
    log::warn!("Rejected request: {e}");
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": e.to_string()
    }))
}

fn engine_failure(e: &EngineError, action: &str) -> HttpResponse {
    if let EngineError::InvalidInput { message } = e {
        log::warn!("Failed to {action}: {message}");
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": message
        }));
    }

    log::error!("Failed to {action}: {e}");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": format!("Failed to {action}")
    }))
}
