//! HTTP routes for Gatehouse

pub mod accounts;
pub mod health;
pub mod status;

pub use accounts::{handle_claim, handle_clear_cache, handle_update};
pub use health::health_check;
pub use status::status_check;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::types::GatehouseError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// Response Helpers
// =============================================================================

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// `{ status: false, message }` with the error's HTTP status
pub fn error_response(err: GatehouseError) -> Response<BoxBody> {
    if err.status_code().is_server_error() {
        error!(error = %err, "Request failed");
    }
    let (status, message) = err.into_status_code_and_body();
    json_response(
        status,
        &serde_json::json!({ "status": false, "message": message }),
    )
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read and decode a JSON request body, refusing bodies over `MAX_BODY_BYTES`.
pub async fn parse_json_body<T, B>(body: B) -> Result<T, GatehouseError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                GatehouseError::BadRequest("Request body too large".into())
            } else {
                GatehouseError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?
        .to_bytes();

    serde_json::from_slice(&bytes)
        .map_err(|e| GatehouseError::BadRequest(format!("Invalid JSON: {}", e)))
}
