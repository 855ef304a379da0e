use futures::future::join;
use geojson::GeoJson;
use gloo_net::http::{Request, RequestBuilder};
use serde::de::DeserializeOwned;

use mapscale_shared::api::{AreaQuery, DIRECTIONS_PATH, DirectionsQuery, ISOCHRONE_PATH, POIS_PATH};
use mapscale_shared::geocode::{self, DEFAULT_COUNTRY_CODES, GeocodeCandidate, NOMINATIM_SEARCH_URL};
use mapscale_shared::{Isochrone, LngLat, Poi, PoiResponse};

use crate::query::AreaData;

async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, String> {
    let resp = request
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

pub async fn fetch_isochrone(query: &AreaQuery) -> Result<Isochrone, String> {
    get_json(Request::get(ISOCHRONE_PATH).query(query.to_query_pairs())).await
}

pub async fn fetch_pois(query: &AreaQuery) -> Result<Vec<Poi>, String> {
    get_json::<PoiResponse>(Request::get(POIS_PATH).query(query.to_query_pairs()))
        .await
        .map(PoiResponse::into_pois)
}

/// Isochrone and POIs for one cycle, requested concurrently. Either failure fails the cycle.
pub async fn fetch_area(query: &AreaQuery) -> Result<AreaData, String> {
    let (isochrone, pois) = join(fetch_isochrone(query), fetch_pois(query)).await;
    let isochrone = isochrone.map_err(|e| format!("isochrone {e}"))?;
    let pois = pois.map_err(|e| format!("pois {e}"))?;
    Ok(AreaData { isochrone, pois })
}

pub async fn fetch_route(query: &DirectionsQuery) -> Result<GeoJson, String> {
    get_json(Request::get(DIRECTIONS_PATH).query(query.to_query_pairs())).await
}

/// First Nominatim hit for `text` within the default country, if any.
pub async fn geocode(text: &str) -> Result<Option<LngLat>, String> {
    let candidates: Vec<GeocodeCandidate> = get_json(
        Request::get(NOMINATIM_SEARCH_URL).query(geocode::search_params(text, DEFAULT_COUNTRY_CODES)),
    )
    .await?;
    Ok(geocode::first_match(&candidates))
}
