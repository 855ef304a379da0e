use std::path::PathBuf;
use std::time::Duration;

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
// Overpass is slow for large radii; driving at 30 minutes covers 24 km.
pub const DEFAULT_OVERPASS_TIMEOUT_SECS: u64 = 20;

/// Where the proxy forwards to, and with which credentials.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub ors_base_url: String,
    pub ors_api_key: Option<String>,
    pub overpass_url: String,
    pub overpass_timeout: Duration,
}

impl UpstreamConfig {
    pub fn from_env() -> Self {
        Self {
            ors_base_url: ors_base_url(),
            ors_api_key: ors_api_key(),
            overpass_url: overpass_url(),
            overpass_timeout: overpass_timeout(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn ors_api_key() -> Option<String> {
    non_empty_var("ORS_API_KEY")
}

pub fn ors_base_url() -> String {
    non_empty_var("ORS_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| ORS_BASE_URL.to_string())
}

pub fn overpass_url() -> String {
    non_empty_var("OVERPASS_URL").unwrap_or_else(|| OVERPASS_URL.to_string())
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> PathBuf {
    non_empty_var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

fn secs_var(name: &str, default_secs: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

pub fn upstream_http_timeout() -> Duration {
    secs_var(
        "UPSTREAM_HTTP_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS,
    )
}

pub fn upstream_connect_timeout() -> Duration {
    secs_var(
        "UPSTREAM_CONNECT_TIMEOUT_SECS",
        DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
    )
}

pub fn overpass_timeout() -> Duration {
    secs_var("OVERPASS_TIMEOUT_SECS", DEFAULT_OVERPASS_TIMEOUT_SECS)
}
