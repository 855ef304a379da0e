use std::fmt::Write as _;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use mapscale_shared::api::{AnalysisResponse, AreaQuery, DirectionsQuery};
use serde_json::Value;
use tracing::warn;

use crate::error::UpstreamError;
use crate::services::{ors, overpass};
use crate::state::{AppState, Endpoint, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "ors_configured": state.upstream.ors_api_key.is_some(),
        "observability": {
            "isochrone_requests_total": observability.isochrone_requests_total,
            "pois_requests_total": observability.pois_requests_total,
            "directions_requests_total": observability.directions_requests_total,
            "analysis_requests_total": observability.analysis_requests_total,
            "upstream_errors_total": observability.upstream_errors_total,
            "overpass_timeouts_total": observability.overpass_timeouts_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.upstream.ors_api_key.is_some(),
        state.observability.snapshot(),
    );
    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(ors_configured: bool, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP mapscale_ors_configured Whether an OpenRouteService key is configured (1 or 0)."
    );
    let _ = writeln!(body, "# TYPE mapscale_ors_configured gauge");
    let _ = writeln!(
        body,
        "mapscale_ors_configured {}",
        u8::from(ors_configured)
    );

    let counters = [
        (
            "mapscale_isochrone_requests_total",
            "Total isochrone API requests.",
            observability.isochrone_requests_total,
        ),
        (
            "mapscale_pois_requests_total",
            "Total POI API requests.",
            observability.pois_requests_total,
        ),
        (
            "mapscale_directions_requests_total",
            "Total directions API requests.",
            observability.directions_requests_total,
        ),
        (
            "mapscale_analysis_requests_total",
            "Total combined analysis API requests.",
            observability.analysis_requests_total,
        ),
        (
            "mapscale_upstream_errors_total",
            "Total failed upstream calls.",
            observability.upstream_errors_total,
        ),
        (
            "mapscale_overpass_timeouts_total",
            "Total Overpass calls that timed out.",
            observability.overpass_timeouts_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }
    body
}

fn record_failure(state: &AppState, endpoint: Endpoint, error: &UpstreamError) {
    state.observability.record_upstream_error();
    warn!(?endpoint, status = %error.status_code(), error = %error, "upstream call failed");
}

pub async fn get_isochrone(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Value>, UpstreamError> {
    state.observability.record_request(Endpoint::Isochrone);
    ors::fetch_isochrone(&state, &query)
        .await
        .map(Json)
        .inspect_err(|e| record_failure(&state, Endpoint::Isochrone, e))
}

pub async fn get_pois(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Value>, UpstreamError> {
    state.observability.record_request(Endpoint::Pois);
    overpass::fetch_pois(&state, &query)
        .await
        .map(Json)
        .inspect_err(|e| record_failure(&state, Endpoint::Pois, e))
}

pub async fn get_directions(
    State(state): State<AppState>,
    Query(query): Query<DirectionsQuery>,
) -> Result<Json<Value>, UpstreamError> {
    state.observability.record_request(Endpoint::Directions);
    ors::fetch_directions(&state, &query)
        .await
        .map(Json)
        .inspect_err(|e| record_failure(&state, Endpoint::Directions, e))
}

/// Isochrone and POIs in one round trip; fails if either half fails.
pub async fn get_analysis(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<AnalysisResponse>, UpstreamError> {
    state.observability.record_request(Endpoint::Analysis);
    let (iso, pois) = tokio::join!(
        ors::fetch_isochrone(&state, &query),
        overpass::fetch_pois(&state, &query)
    );
    let combined = iso.and_then(|iso| pois.map(|pois| AnalysisResponse { iso, pois }));
    combined
        .map(Json)
        .inspect_err(|e| record_failure(&state, Endpoint::Analysis, e))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use mapscale_shared::api::{AnalysisResponse, ErrorBody};
    use mapscale_shared::{Isochrone, PoiResponse};
    use serde_json::{Value, json};

    use super::render_prometheus_metrics;
    use crate::config::UpstreamConfig;
    use crate::state::{AppState, ObservabilitySnapshot};

    #[derive(Clone, Default)]
    struct Recorded {
        ors: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
        overpass: Arc<Mutex<Vec<String>>>,
    }

    fn square_isochrone() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"value": 600.0},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[4.85, 52.3], [4.95, 52.3], [4.95, 52.4], [4.85, 52.4], [4.85, 52.3]]]
                }
            }]
        })
    }

    fn overpass_payload() -> Value {
        json!({
            "elements": [
                {"type": "node", "id": 1, "lon": 4.9, "lat": 52.35, "tags": {"shop": "supermarket", "name": "Inside"}},
                {"type": "node", "id": 2, "lon": 5.2, "lat": 52.35, "tags": {"amenity": "gym", "name": "Outside"}}
            ]
        })
    }

    async fn spawn_router(router: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve test app");
        });
        (addr, handle)
    }

    async fn ors_handler(
        State(recorded): State<Recorded>,
        uri: axum::http::Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        recorded
            .ors
            .lock()
            .expect("ors log lock")
            .push((uri.path().to_string(), auth, body));
        Json(square_isochrone())
    }

    async fn overpass_handler(
        State(recorded): State<Recorded>,
        Form(form): Form<std::collections::HashMap<String, String>>,
    ) -> Json<Value> {
        recorded
            .overpass
            .lock()
            .expect("overpass log lock")
            .push(form.get("data").cloned().unwrap_or_default());
        Json(overpass_payload())
    }

    async fn spawn_upstream(recorded: Recorded) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let router = Router::new()
            .route("/v2/isochrones/{profile}", post(ors_handler))
            .route("/v2/directions/{profile}/geojson", post(ors_handler))
            .route("/interpreter", post(overpass_handler))
            .with_state(recorded);
        spawn_router(router).await
    }

    fn upstream_config(addr: SocketAddr, api_key: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            ors_base_url: format!("http://{addr}"),
            ors_api_key: api_key.map(str::to_owned),
            overpass_url: format!("http://{addr}/interpreter"),
            overpass_timeout: Duration::from_secs(5),
        }
    }

    async fn spawn_app(config: UpstreamConfig) -> (String, tokio::task::JoinHandle<()>) {
        let state = AppState::new(config, PathBuf::from("client/dist"));
        let (addr, handle) = spawn_router(crate::app::build_app(state)).await;
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let metrics = render_prometheus_metrics(
            true,
            ObservabilitySnapshot {
                isochrone_requests_total: 4,
                pois_requests_total: 3,
                directions_requests_total: 9,
                analysis_requests_total: 1,
                upstream_errors_total: 2,
                overpass_timeouts_total: 1,
            },
        );
        assert!(metrics.contains("# TYPE mapscale_ors_configured gauge"));
        assert!(metrics.contains("mapscale_ors_configured 1"));
        assert!(metrics.contains("# TYPE mapscale_directions_requests_total counter"));
        assert!(metrics.contains("mapscale_isochrone_requests_total 4"));
        assert!(metrics.contains("mapscale_directions_requests_total 9"));
        assert!(metrics.contains("mapscale_overpass_timeouts_total 1"));
    }

    #[tokio::test]
    async fn click_query_forwards_parameters_and_filters_to_polygon() {
        let recorded = Recorded::default();
        let (upstream_addr, upstream) = spawn_upstream(recorded.clone()).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, Some("test-key"))).await;
        let client = reqwest::Client::new();
        let params = [("lng", "4.90"), ("lat", "52.35"), ("minutes", "10"), ("profile", "walking")];

        let iso = client
            .get(format!("{base_url}/api/isochrone"))
            .query(&params)
            .send()
            .await
            .expect("isochrone request")
            .error_for_status()
            .expect("isochrone status")
            .json::<Isochrone>()
            .await
            .expect("parse isochrone");
        let pois = client
            .get(format!("{base_url}/api/pois"))
            .query(&params)
            .send()
            .await
            .expect("pois request")
            .error_for_status()
            .expect("pois status")
            .json::<PoiResponse>()
            .await
            .expect("parse pois")
            .into_pois();

        {
            let ors = recorded.ors.lock().expect("ors log lock");
            assert_eq!(ors.len(), 1);
            let (path, auth, body) = &ors[0];
            assert_eq!(path, "/v2/isochrones/foot-walking");
            assert_eq!(auth.as_deref(), Some("test-key"));
            assert_eq!(body["locations"], json!([[4.9, 52.35]]));
            assert_eq!(body["range"], json!([600]));
        }
        {
            let overpass = recorded.overpass.lock().expect("overpass log lock");
            assert_eq!(overpass.len(), 1);
            assert!(overpass[0].contains("around:800, 52.35, 4.9"));
        }

        let inside = iso.filter_within(&pois).expect("filter should succeed");
        assert_eq!(inside.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn directions_use_mode_profile() {
        let recorded = Recorded::default();
        let (upstream_addr, upstream) = spawn_upstream(recorded.clone()).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, Some("test-key"))).await;

        let resp = reqwest::Client::new()
            .get(format!("{base_url}/api/directions"))
            .query(&[
                ("start_lng", "4.9"),
                ("start_lat", "52.35"),
                ("end_lng", "4.91"),
                ("end_lat", "52.36"),
                ("mode", "cycling"),
            ])
            .send()
            .await
            .expect("directions request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let ors = recorded.ors.lock().expect("ors log lock");
        let (path, _, body) = &ors[0];
        assert_eq!(path, "/v2/directions/cycling-regular/geojson");
        assert_eq!(body["coordinates"], json!([[4.9, 52.35], [4.91, 52.36]]));
        drop(ors);

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn analysis_returns_both_payloads() {
        let recorded = Recorded::default();
        let (upstream_addr, upstream) = spawn_upstream(recorded.clone()).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, Some("test-key"))).await;

        let analysis = reqwest::Client::new()
            .get(format!("{base_url}/api/analysis"))
            .query(&[("lng", "4.9"), ("lat", "52.35")])
            .send()
            .await
            .expect("analysis request")
            .error_for_status()
            .expect("analysis status")
            .json::<AnalysisResponse>()
            .await
            .expect("parse analysis");

        assert_eq!(analysis.iso, square_isochrone());
        assert_eq!(analysis.pois, overpass_payload());

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn missing_api_key_is_service_unavailable() {
        let recorded = Recorded::default();
        let (upstream_addr, upstream) = spawn_upstream(recorded.clone()).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, None)).await;

        let resp = reqwest::Client::new()
            .get(format!("{base_url}/api/isochrone"))
            .query(&[("lng", "4.9"), ("lat", "52.35")])
            .send()
            .await
            .expect("isochrone request");
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        let body = resp.json::<ErrorBody>().await.expect("parse error body");
        assert_eq!(body.detail, "ORS_API_KEY is not configured");
        assert!(recorded.ors.lock().expect("ors log lock").is_empty());

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn ors_rejection_becomes_bad_request_with_detail() {
        let router = Router::new().route(
            "/v2/isochrones/{profile}",
            post(|| async { (StatusCode::FORBIDDEN, r#"{"error":"Access to this API has been disallowed"}"#) }),
        );
        let (upstream_addr, upstream) = spawn_router(router).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, Some("revoked"))).await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{base_url}/api/isochrone"))
            .query(&[("lng", "4.9"), ("lat", "52.35")])
            .send()
            .await
            .expect("isochrone request");
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body = resp.json::<ErrorBody>().await.expect("parse error body");
        assert!(body.detail.starts_with("ORS Error: "));
        assert!(body.detail.contains("disallowed"));

        let health = client
            .get(format!("{base_url}/api/health"))
            .send()
            .await
            .expect("health request")
            .json::<Value>()
            .await
            .expect("parse health");
        assert_eq!(health["observability"]["upstream_errors_total"], 1);
        assert_eq!(health["observability"]["isochrone_requests_total"], 1);

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn slow_overpass_maps_to_gateway_timeout() {
        let router = Router::new().route(
            "/interpreter",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"elements": []}))
            }),
        );
        let (upstream_addr, upstream) = spawn_router(router).await;
        let mut config = upstream_config(upstream_addr, Some("test-key"));
        config.overpass_timeout = Duration::from_millis(200);
        let (base_url, app) = spawn_app(config).await;

        let resp = reqwest::Client::new()
            .get(format!("{base_url}/api/pois"))
            .query(&[("lng", "4.9"), ("lat", "52.35"), ("minutes", "30"), ("profile", "driving")])
            .send()
            .await
            .expect("pois request");
        assert_eq!(resp.status(), reqwest::StatusCode::GATEWAY_TIMEOUT);
        let body = resp.json::<ErrorBody>().await.expect("parse error body");
        assert_eq!(body.detail, "Area too large, Overpass timed out");

        app.abort();
        upstream.abort();
    }

    #[tokio::test]
    async fn missing_coordinates_are_rejected_before_upstream() {
        let recorded = Recorded::default();
        let (upstream_addr, upstream) = spawn_upstream(recorded.clone()).await;
        let (base_url, app) = spawn_app(upstream_config(upstream_addr, Some("test-key"))).await;

        let resp = reqwest::Client::new()
            .get(format!("{base_url}/api/pois"))
            .query(&[("lat", "52.35")])
            .send()
            .await
            .expect("pois request");
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert!(recorded.overpass.lock().expect("overpass log lock").is_empty());

        app.abort();
        upstream.abort();
    }
}
