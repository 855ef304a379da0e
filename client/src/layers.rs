//! Keeps the isochrone fill and route-preview line layers in step with query state.

use geojson::GeoJson;
use mapscale_shared::{Isochrone, TravelMode};
use serde_json::{Value, json};

use crate::colors::{ISOCHRONE_FILL_OPACITY, ROUTE_PREVIEW, mode_fill};

pub const ISO_SOURCE: &str = "iso";
pub const ISO_LAYER: &str = "iso-layer";
pub const ROUTE_SOURCE: &str = "route-preview";
pub const ROUTE_LAYER: &str = "route-preview-layer";

/// The slice of the map engine's style API the synchronizer needs.
pub trait MapLayers {
    fn has_source(&self, id: &str) -> bool;
    fn add_source(&self, id: &str, source: &Value) -> Result<(), String>;
    fn set_source_data(&self, id: &str, data: &Value) -> Result<(), String>;
    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&self, layer: &Value, before: Option<&str>) -> Result<(), String>;
    fn set_paint_property(&self, layer: &str, name: &str, value: &Value) -> Result<(), String>;
}

fn empty_collection() -> Value {
    json!({"type": "FeatureCollection", "features": []})
}

fn geojson_source(data: Value) -> Value {
    json!({"type": "geojson", "data": data})
}

fn iso_layer_def(mode: TravelMode) -> Value {
    let color = mode_fill(mode);
    json!({
        "id": ISO_LAYER,
        "type": "fill",
        "source": ISO_SOURCE,
        "paint": {
            "fill-color": color,
            "fill-opacity": ISOCHRONE_FILL_OPACITY,
            "fill-outline-color": color,
        }
    })
}

fn route_layer_def() -> Value {
    json!({
        "id": ROUTE_LAYER,
        "type": "line",
        "source": ROUTE_SOURCE,
        "layout": {
            "line-join": "round",
            "line-cap": "round",
        },
        "paint": {
            "line-color": ROUTE_PREVIEW,
            "line-width": 4,
            "line-dasharray": [2, 1],
        }
    })
}

/// Adds the empty route-preview source and layer. Safe to call repeatedly.
pub fn install_route_preview(map: &impl MapLayers) -> Result<(), String> {
    if !map.has_source(ROUTE_SOURCE) {
        map.add_source(ROUTE_SOURCE, &geojson_source(empty_collection()))?;
    }
    if !map.has_layer(ROUTE_LAYER) {
        map.add_layer(&route_layer_def(), None)?;
    }
    Ok(())
}

/// Shows `isochrone` filled in the colour of `mode`. The fill goes beneath the
/// route preview when that layer already exists.
pub fn sync_isochrone(map: &impl MapLayers, isochrone: &Isochrone, mode: TravelMode) -> Result<(), String> {
    let data = serde_json::to_value(isochrone).map_err(|e| format!("encode isochrone: {e}"))?;

    if map.has_source(ISO_SOURCE) {
        map.set_source_data(ISO_SOURCE, &data)?;
    } else {
        map.add_source(ISO_SOURCE, &geojson_source(data))?;
    }

    if map.has_layer(ISO_LAYER) {
        let color = json!(mode_fill(mode));
        map.set_paint_property(ISO_LAYER, "fill-color", &color)?;
        map.set_paint_property(ISO_LAYER, "fill-outline-color", &color)?;
    } else {
        let before = map.has_layer(ROUTE_LAYER).then_some(ROUTE_LAYER);
        map.add_layer(&iso_layer_def(mode), before)?;
    }
    Ok(())
}

/// Empties the isochrone source after a failed cycle. No-op before the first fill.
pub fn clear_isochrone(map: &impl MapLayers) -> Result<(), String> {
    if map.has_source(ISO_SOURCE) {
        map.set_source_data(ISO_SOURCE, &empty_collection())?;
    }
    Ok(())
}

pub fn sync_route_preview(map: &impl MapLayers, route: Option<&GeoJson>) -> Result<(), String> {
    install_route_preview(map)?;
    let data = match route {
        Some(route) => serde_json::to_value(route).map_err(|e| format!("encode route: {e}"))?,
        None => empty_collection(),
    };
    map.set_source_data(ROUTE_SOURCE, &data)
}
