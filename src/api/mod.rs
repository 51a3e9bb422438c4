//! JSON endpoints consumed by the map UI

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::WaterSeekerAgent;
use crate::generation::{AccessToken, WatsonxClient};
use crate::location_resolver::LocationResolver;
use crate::models::{Coordinate, LocationQuery, ResultBundle};
use crate::{VERSION, WaterSeekerError};

/// Long-lived collaborators shared by all requests
pub struct AppState {
    pub client: WatsonxClient,
    /// Acquired once at start-up; every run works on its own copy
    pub token: AccessToken,
    pub resolver: LocationResolver,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub locations: Vec<ApiLocation>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub bundle: ResultBundle,
    /// 0-based index of the highlighted point
    pub recommended_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": VERSION }))
}

async fn analyze(
    State(state): State<SharedState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    let query = to_query(&request).map_err(reject)?;
    info!("Analyze request for {} location(s)", query.len());

    let session = state.client.session(state.token.clone());
    let bundle = WaterSeekerAgent::new(session, &state.resolver)
        .run(&query)
        .await
        .map_err(reject)?;

    Ok(Json(AnalyzeResponse {
        recommended_index: bundle.recommended_index(),
        bundle,
    }))
}

fn to_query(request: &AnalyzeRequest) -> crate::Result<LocationQuery> {
    let mut query = LocationQuery::new();
    for location in &request.locations {
        let coordinate = Coordinate::new(location.latitude, location.longitude)?;
        if !query.push(coordinate)? {
            info!("Ignoring duplicate location {}", coordinate);
        }
    }
    Ok(query)
}

fn status_for(error: &WaterSeekerError) -> StatusCode {
    match error {
        WaterSeekerError::Validation { .. } => StatusCode::BAD_REQUEST,
        WaterSeekerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        WaterSeekerError::Api { .. } | WaterSeekerError::Authentication { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: WaterSeekerError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&error);
    warn!("Analyze request failed ({}): {}", status, error);
    (
        status,
        Json(ApiError {
            error: error.user_message(),
        }),
    )
}
