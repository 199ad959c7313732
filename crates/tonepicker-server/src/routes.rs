use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use tonepicker_core::{AdjustmentResult, ErrorBody, HealthStatus};
use tonepicker_suggest::{AdjustError, AdjustmentRequest, ToneAdjuster};

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    adjuster: Arc<ToneAdjuster>,
}

/// Maps handler errors onto status codes. Only the public message is sent;
/// upstream details stay in the logs.
pub struct ApiError(AdjustError);

impl From<AdjustError> for ApiError {
    fn from(err: AdjustError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AdjustError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AdjustError::UpstreamAuth => StatusCode::UNAUTHORIZED,
            AdjustError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AdjustError::UpstreamUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}

/// POST /api/adjust-tone
async fn adjust_tone(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AdjustmentResult>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(%rejection, "rejected request body");
        AdjustError::InvalidInput("Invalid request body".to_string())
    })?;
    let request = AdjustmentRequest::from_body(&body)?;
    let result = state.adjuster.adjust(request).await?;
    Ok(Json(result))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        cache_size: state.adjuster.cache().len().await,
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Endpoint not found")))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Something went wrong!")),
    )
        .into_response()
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

/// Wrap a router with the shared middleware stack: panic catching, CORS,
/// body limit and request tracing.
pub fn layered(router: Router, origins: &[String]) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors(origins))
        .layer(TraceLayer::new_for_http())
}

pub fn build_app(adjuster: Arc<ToneAdjuster>, origins: &[String]) -> Router {
    let state = AppState { adjuster };
    let api = Router::new()
        .route("/api/adjust-tone", post(adjust_tone).fallback(not_found))
        .route("/api/health", get(health).fallback(not_found))
        .fallback(not_found)
        .with_state(state);
    layered(api, origins)
}
