use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorEnvelope;

/// Failures a scan request can end in. There is no partial success: a scan
/// either yields every probe result or one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Missing or unparseable target URL, or a malformed request body.
    #[error("{0}")]
    InvalidInput(String),

    /// Anything that went wrong after the input was accepted.
    #[error("{0}")]
    InternalFailure(String),
}

impl ScanError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScanError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ScanError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let err = ScanError::InvalidInput("URL is required".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "URL is required");
    }

    #[test]
    fn internal_failure_passes_message_through() {
        let err = ScanError::InternalFailure("probe exploded".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "probe exploded");
    }
}
