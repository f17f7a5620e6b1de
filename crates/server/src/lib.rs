//! HTTP surface for face-presence verification.
//!
//! One JSON endpoint, `POST /verify-face`, wraps [`VerifyFaceUseCase`]. The
//! use case is shared across requests and runs on the blocking thread pool
//! because ONNX inference is CPU-bound.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use facecheck_core::pipeline::verify_face_use_case::{VerifyFaceUseCase, INVALID_IMAGE_MESSAGE};
use facecheck_core::verification::domain::verdict::Verdict;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

#[derive(Clone)]
pub struct AppState {
    pub use_case: Arc<VerifyFaceUseCase>,
}

impl AppState {
    pub fn new(use_case: VerifyFaceUseCase) -> Self {
        Self {
            use_case: Arc::new(use_case),
        }
    }
}

/// Router-level settings that do not affect verification itself.
#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
}

/// The `image` member of a `/verify-face` body.
#[derive(Debug, PartialEq)]
pub enum ImageField {
    /// No body, a body that is not a JSON object, or no `image` key.
    Missing,
    Text(String),
    /// The key is present but not a string, `null` included.
    NotText,
}

impl ImageField {
    pub fn from_body(body: &[u8]) -> Self {
        let mut object = match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(object) => object,
            Err(e) => {
                log::debug!("Unreadable request body ({} bytes): {e}", body.len());
                return ImageField::Missing;
            }
        };
        match object.remove("image") {
            None => ImageField::Missing,
            Some(Value::String(image)) => ImageField::Text(image),
            Some(_) => ImageField::NotText,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn create_router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/verify-face", post(verify_face))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(options.max_body_bytes))
        .layer(cors_layer(&options.cors_origins))
        .with_state(state)
}

/// The body is parsed by hand so a missing or malformed payload becomes a
/// verdict instead of axum's plain-text rejection.
async fn verify_face(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Verdict>) {
    let image = match ImageField::from_body(&body) {
        ImageField::Missing => None,
        ImageField::Text(image) => Some(image),
        ImageField::NotText => {
            log::debug!("Request image is not a string");
            return (
                StatusCode::BAD_REQUEST,
                Json(Verdict::error(INVALID_IMAGE_MESSAGE)),
            )
        }
    };

    let use_case = Arc::clone(&state.use_case);
    let verdict =
        match tokio::task::spawn_blocking(move || use_case.execute(image.as_deref())).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::error!("Verification task failed: {e}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Verdict::error(INTERNAL_ERROR_MESSAGE)),
                );
            }
        };

    log::debug!("Verdict: {}", verdict.message());
    let status = if verdict.is_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(verdict))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(600));

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}
