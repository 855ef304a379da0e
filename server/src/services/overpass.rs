//! Overpass API lookup of supermarkets, convenience stores and gyms.

use mapscale_shared::api::AreaQuery;
use serde_json::Value;
use tracing::{debug, warn};

use super::decode_json;
use crate::error::{UpstreamError, body_preview};
use crate::state::AppState;

/// Overpass QL for shop and gym nodes within the radius the mode can cover in time.
pub fn build_query(query: &AreaQuery) -> String {
    let radius = query.params().search_radius_m();
    let (lat, lng) = (query.lat, query.lng);
    format!(
        r#"[out:json];
(
  node["shop"~"supermarket|convenience"](around:{radius}, {lat}, {lng});
  node["leisure"="fitness_centre"](around:{radius}, {lat}, {lng});
  node["amenity"="gym"](around:{radius}, {lat}, {lng});
);
out body;
"#
    )
}

pub async fn fetch_pois(state: &AppState, query: &AreaQuery) -> Result<Value, UpstreamError> {
    let ql = build_query(query);
    debug!(radius_m = query.params().search_radius_m(), "querying overpass");

    let resp = state
        .http_client
        .post(&state.upstream.overpass_url)
        .timeout(state.upstream.overpass_timeout)
        .form(&[("data", ql.as_str())])
        .send()
        .await
        .map_err(|e| classify(state, e))?;
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(|e| classify(state, e))?;

    if !status.is_success() {
        let preview = body_preview(&bytes);
        warn!(%status, body = %preview, "overpass returned an error status");
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            preview,
        });
    }

    decode_json(&bytes)
}

fn classify(state: &AppState, e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        warn!("Overpass API timed out");
        state.observability.record_overpass_timeout();
        UpstreamError::OverpassTimeout
    } else {
        UpstreamError::Transport(e.to_string())
    }
}
