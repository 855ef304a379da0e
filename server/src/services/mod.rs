pub mod ors;
pub mod overpass;

use crate::error::{UpstreamError, body_preview};

/// Upstream response body parsed as JSON, passed through to the client untouched.
fn decode_json(bytes: &[u8]) -> Result<serde_json::Value, UpstreamError> {
    serde_json::from_slice(bytes).map_err(|e| {
        UpstreamError::Decode(format!("{e}; body preview: {}", body_preview(bytes)))
    })
}
