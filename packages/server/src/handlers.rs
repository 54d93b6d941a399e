//! HTTP handler functions for the safety map API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use safety_map_risk::{RiskError, SafetyEngine};
use safety_map_risk_models::RiskSample;
use safety_map_server_models::{
    ApiAreaAnalysis, ApiChoropleth, ApiError, ApiFacility, ApiHealth, ApiNearbyIncidents,
    ApiPointRisk, ApiSafetyZones, AreaQueryParams,
};
use safety_map_store::InMemoryStore;
use serde::Serialize;

use crate::AppState;

type Engine = SafetyEngine<InMemoryStore>;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let store = state.engine.store();
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        incident_count: store.incident_count(),
        facility_count: store.facility_count(),
    })
}

/// `GET /api/safety/risk`
///
/// Risk score and level at a single point.
pub async fn risk(state: web::Data<AppState>, params: web::Query<AreaQueryParams>) -> HttpResponse {
    let point = match params.point() {
        Ok(point) => point,
        Err(e) => return error_response("compute point risk", &e.into()),
    };

    run_query(&state, "compute point risk", move |engine| {
        let score = engine.risk_at(point)?;
        Ok(ApiPointRisk::from(RiskSample::new(point, score)))
    })
    .await
}

/// `GET /api/safety/choropleth`
///
/// Classified risk grid around a point.
pub async fn choropleth(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let (center, radius) = match params.area(state.engine.config().default_query_radius_meters) {
        Ok(area) => area,
        Err(e) => return error_response("build choropleth", &e.into()),
    };

    run_query(&state, "build choropleth", move |engine| {
        let samples = engine.sample_grid(center, radius)?;
        Ok(ApiChoropleth::new(
            samples,
            engine.config().grid.cell_size_degrees,
        ))
    })
    .await
}

/// `GET /api/safety/zones`
///
/// Safe zones around facilities and danger zones around incident clusters.
pub async fn zones(state: web::Data<AppState>, params: web::Query<AreaQueryParams>) -> HttpResponse {
    let (center, radius) = match params.area(state.engine.config().default_query_radius_meters) {
        Ok(area) => area,
        Err(e) => return error_response("build safety zones", &e.into()),
    };

    run_query(&state, "build safety zones", move |engine| {
        engine
            .safety_zones(center, radius, Utc::now())
            .map(ApiSafetyZones::from)
    })
    .await
}

/// `GET /api/safety/analyze`
///
/// Risk and infrastructure summary for an area.
pub async fn analyze(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let (center, radius) = match params.area(state.engine.config().default_query_radius_meters) {
        Ok(area) => area,
        Err(e) => return error_response("analyze area", &e.into()),
    };

    run_query(&state, "analyze area", move |engine| {
        engine
            .analyze_area(center, radius)
            .map(ApiAreaAnalysis::from)
    })
    .await
}

/// `GET /api/safety/nearby-incidents`
///
/// Reports and open SOS alerts around a point, newest first.
pub async fn nearby_incidents(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let (center, radius) = match params.area(state.engine.config().default_query_radius_meters) {
        Ok(area) => area,
        Err(e) => return error_response("list nearby incidents", &e.into()),
    };

    run_query(&state, "list nearby incidents", move |engine| {
        engine
            .nearby_incidents(center, radius)
            .map(ApiNearbyIncidents::from)
    })
    .await
}

/// `GET /api/safety/facilities`
///
/// Hospitals and police stations around a point, nearest first.
pub async fn facilities(
    state: web::Data<AppState>,
    params: web::Query<AreaQueryParams>,
) -> HttpResponse {
    let (center, radius) = match params.area(state.engine.config().default_query_radius_meters) {
        Ok(area) => area,
        Err(e) => return error_response("list facilities", &e.into()),
    };

    run_query(&state, "list facilities", move |engine| {
        let facilities = engine.nearby_facilities(center, radius)?;
        Ok(facilities
            .into_iter()
            .map(ApiFacility::from)
            .collect::<Vec<_>>())
    })
    .await
}

/// Runs `query` on the blocking pool and renders its result as JSON.
async fn run_query<T, F>(state: &web::Data<AppState>, action: &'static str, query: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Engine) -> Result<T, RiskError> + Send + 'static,
{
    let engine = state.engine.clone();
    match web::block(move || query(&engine)).await {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => error_response(action, &e),
        Err(e) => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(format!("Failed to {action}")))
        }
    }
}

fn error_response(action: &str, error: &RiskError) -> HttpResponse {
    match error {
        RiskError::Validation(e) => {
            log::warn!("Rejected request to {action}: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
        RiskError::Store(e) => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::BadGateway().json(ApiError::new(format!("Failed to {action}")))
        }
        RiskError::Config(e) => {
            log::error!("Failed to {action}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(format!("Failed to {action}")))
        }
    }
}
