use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::bail_server;
use crate::error::ServerResult;
use crate::inference::task::predict::{is_empty_input, PredictHandler, PredictResponse};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) model: Arc<dyn PredictHandler>,
}

#[derive(Deserialize, Serialize, Debug)]
pub(crate) struct HealthResponse {
    pub(crate) status: String,
}

pub(crate) fn router(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handle_predict_request))
        .route("/health", get(handle_health_request))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[axum_macros::debug_handler]
#[tracing::instrument(level = "info", skip(state, body))]
async fn handle_predict_request(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<(StatusCode, Json<PredictResponse>)> {
    // Oversized or unreadable bodies still answer with the JSON error shape
    let body = match body {
        Ok(body) => body,
        Err(rejection) => bail_server!(rejection.status(), rejection.body_text()),
    };

    // Unparseable bodies are treated the same as missing ones
    let input = match serde_json::from_slice::<Value>(&body) {
        Ok(input) if !is_empty_input(&input) => input,
        _ => bail_server!(StatusCode::BAD_REQUEST, "No input data provided"),
    };

    let model = state.model.clone();
    let prediction = tokio::task::spawn_blocking(move || model.run_predict(&input)).await??;
    let prediction = prediction.into_json()?;
    debug!("Prediction done");

    Ok((
        StatusCode::OK,
        Json(PredictResponse {
            success: true,
            prediction,
        }),
    ))
}

#[axum_macros::debug_handler]
async fn handle_health_request() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".into(),
        }),
    )
}
