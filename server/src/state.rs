use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::config::{UpstreamConfig, upstream_connect_timeout, upstream_http_timeout};

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    pub upstream: Arc<UpstreamConfig>,
    /// Directory holding the compiled client bundle.
    pub static_dir: PathBuf,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Isochrone,
    Pois,
    Directions,
    Analysis,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    isochrone_requests_total: AtomicU64,
    pois_requests_total: AtomicU64,
    directions_requests_total: AtomicU64,
    analysis_requests_total: AtomicU64,
    upstream_errors_total: AtomicU64,
    overpass_timeouts_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObservabilitySnapshot {
    pub isochrone_requests_total: u64,
    pub pois_requests_total: u64,
    pub directions_requests_total: u64,
    pub analysis_requests_total: u64,
    pub upstream_errors_total: u64,
    pub overpass_timeouts_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            isochrone_requests_total: self.isochrone_requests_total.load(Ordering::Relaxed),
            pois_requests_total: self.pois_requests_total.load(Ordering::Relaxed),
            directions_requests_total: self.directions_requests_total.load(Ordering::Relaxed),
            analysis_requests_total: self.analysis_requests_total.load(Ordering::Relaxed),
            upstream_errors_total: self.upstream_errors_total.load(Ordering::Relaxed),
            overpass_timeouts_total: self.overpass_timeouts_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_request(&self, endpoint: Endpoint) {
        let counter = match endpoint {
            Endpoint::Isochrone => &self.isochrone_requests_total,
            Endpoint::Pois => &self.pois_requests_total,
            Endpoint::Directions => &self.directions_requests_total,
            Endpoint::Analysis => &self.analysis_requests_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overpass_timeout(&self) {
        self.overpass_timeouts_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(upstream: UpstreamConfig, static_dir: PathBuf) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("mapscale/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            http_client,
            upstream: Arc::new(upstream),
            static_dir,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}
