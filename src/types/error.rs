//! Error types for Gatehouse

use hyper::StatusCode;

/// Main error type for Gatehouse operations
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Loading a partition from the backing store failed or timed out.
    /// Retryable; never answered from a stale partition.
    #[error("Data load failed: {0}")]
    RemoteFetch(String),

    /// A write-back call to the backing store failed.
    #[error("Data write failed: {0}")]
    RemoteWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatehouseError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
            Self::RemoteWrite(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers.
    ///
    /// Remote failures are collapsed to a generic text so store details
    /// never leak into responses.
    pub fn public_message(&self) -> String {
        match self {
            Self::RemoteFetch(_) => "data load failed".to_string(),
            Self::RemoteWrite(_) => "data write failed".to_string(),
            Self::Internal(_) | Self::Config(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = self.public_message();
        (status, body)
    }
}

impl From<std::io::Error> for GatehouseError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GatehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for GatehouseError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for GatehouseError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteFetch(err.to_string())
    }
}

/// Result type alias for Gatehouse operations
pub type Result<T> = std::result::Result<T, GatehouseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatehouseError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatehouseError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatehouseError::RemoteFetch("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_remote_fetch_hides_details() {
        let (status, body) =
            GatehouseError::RemoteFetch("sheets 429: quota exceeded".into()).into_status_code_and_body();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "data load failed");
    }

    #[test]
    fn test_json_error_is_bad_request() {
        let err: GatehouseError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, GatehouseError::BadRequest(_)));
    }
}
