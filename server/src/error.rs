use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mapscale_shared::api::ErrorBody;

const MAX_UPSTREAM_DETAIL_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("ORS_API_KEY is not configured")]
    MissingApiKey,
    /// OpenRouteService answered with a non-success status.
    #[error("ORS Error: {0}")]
    Rejected(String),
    #[error("Area too large, Overpass timed out")]
    OverpassTimeout,
    #[error("upstream status {status}: {preview}")]
    Status { status: u16, preview: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            UpstreamError::Rejected(_) => StatusCode::BAD_REQUEST,
            UpstreamError::OverpassTimeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Status { .. }
            | UpstreamError::Transport(_)
            | UpstreamError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Truncated, lossy view of an upstream body for error details and logs.
pub fn body_preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(MAX_UPSTREAM_DETAIL_CHARS)
        .collect()
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
