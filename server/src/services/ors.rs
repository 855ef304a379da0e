//! OpenRouteService isochrone and directions calls.

use mapscale_shared::TravelMode;
use mapscale_shared::api::{AreaQuery, DirectionsQuery};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::decode_json;
use crate::error::{UpstreamError, body_preview};
use crate::state::AppState;

pub fn isochrone_url(base_url: &str, mode: TravelMode) -> String {
    format!("{base_url}/v2/isochrones/{}", mode.ors_profile())
}

pub fn directions_url(base_url: &str, mode: TravelMode) -> String {
    format!("{base_url}/v2/directions/{}/geojson", mode.ors_profile())
}

/// A single time range in seconds around one location.
pub fn isochrone_body(query: &AreaQuery) -> Value {
    json!({
        "locations": [[query.lng, query.lat]],
        "range": [u64::from(query.minutes) * 60],
        "range_type": "time",
    })
}

pub fn directions_body(query: &DirectionsQuery) -> Value {
    json!({
        "coordinates": [
            [query.start_lng, query.start_lat],
            [query.end_lng, query.end_lat],
        ],
    })
}

pub async fn fetch_isochrone(state: &AppState, query: &AreaQuery) -> Result<Value, UpstreamError> {
    let url = isochrone_url(&state.upstream.ors_base_url, query.profile);
    debug!(%url, minutes = query.minutes, "requesting isochrone");
    post(state, &url, &isochrone_body(query)).await
}

pub async fn fetch_directions(
    state: &AppState,
    query: &DirectionsQuery,
) -> Result<Value, UpstreamError> {
    let url = directions_url(&state.upstream.ors_base_url, query.mode);
    debug!(%url, "requesting directions");
    post(state, &url, &directions_body(query)).await
}

async fn post(state: &AppState, url: &str, body: &Value) -> Result<Value, UpstreamError> {
    let api_key = state
        .upstream
        .ors_api_key
        .as_deref()
        .ok_or(UpstreamError::MissingApiKey)?;

    let resp = state
        .http_client
        .post(url)
        .header(reqwest::header::AUTHORIZATION, api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| UpstreamError::Transport(e.to_string()))?;
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| UpstreamError::Transport(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        let preview = body_preview(&bytes);
        warn!(%status, body = %preview, "openrouteservice rejected request");
        return Err(UpstreamError::Rejected(preview));
    }

    decode_json(&bytes)
}
