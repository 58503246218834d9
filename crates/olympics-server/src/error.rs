use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;

use olympics_store::StoreError;

use crate::verifier::VerifierError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// The verifier rejected the proof or it disclosed too little.
    #[error("{message}")]
    Verification {
        message: String,
        details: Option<Value>,
    },

    #[error("Verification service unavailable: {0}")]
    VerifierUnavailable(#[from] VerifierError),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn verification(message: impl Into<String>, details: Option<Value>) -> Self {
        Self::Verification {
            message: message.into(),
            details,
        }
    }

    /// Adapter for `map_err` that tags a store failure with what was being
    /// attempted.
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Storage { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "error": message }),
            ),
            ApiError::Verification { message, details } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "error": message, "details": details }),
            ),
            ApiError::VerifierUnavailable(e) => {
                tracing::error!(error = %e, "identity verifier unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({
                        "success": false,
                        "error": "Verification service unavailable",
                        "details": e.to_string(),
                    }),
                )
            }
            ApiError::Storage { context, source } => {
                tracing::error!(error = %source, "{context}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({
                        "success": false,
                        "error": context,
                        "details": source.to_string(),
                    }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
