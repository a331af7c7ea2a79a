use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cms_core::CmsError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct CmsAxumError(pub anyhow::Error);

impl From<anyhow::Error> for CmsAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<CmsError> for CmsAxumError {
    fn from(e: CmsError) -> Self {
        Self(e.into_anyhow())
    }
}

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub(crate) fn error_response(err: &CmsError) -> Response {
    let safe = err.sanitize_for_client();
    let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(safe.to_json())).into_response()
}

impl IntoResponse for CmsAxumError {
    fn into_response(self) -> Response {
        // Keep the structured fields even when the CmsError is wrapped in context.
        if let Some(cms) = CmsError::from_anyhow(&self.0) {
            if cms.code() >= 500 {
                error!(error = ?self.0, "request failed");
            }
            return error_response(cms);
        }

        error!(error = ?self.0, "unhandled error");
        error_response(&CmsError::general_error(INTERNAL_ERROR_MESSAGE))
    }
}

/// Body parse failures answer 400 with the parser's message under `_schema`.
pub fn map_json_rejection(rejection: JsonRejection) -> CmsAxumError {
    CmsError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}
