//! Bindings to the `maplibregl` global loaded from index.html.

use js_sys::{Array, Function, Object, Reflect};
use mapscale_shared::LngLat;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::layers::MapLayers;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl)]
    #[derive(Clone)]
    pub type Map;

    #[wasm_bindgen(constructor, catch, js_namespace = maplibregl)]
    pub fn new(options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &Map, event: &str, handler: &Function);

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &Map, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source_js(this: &Map, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &Map, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer_js(this: &Map, layer: &JsValue, before_id: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setPaintProperty)]
    fn set_paint_property_js(this: &Map, layer: &str, name: &str, value: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to_js(this: &Map, options: &JsValue);

    #[wasm_bindgen(method)]
    pub fn remove(this: &Map);

    #[wasm_bindgen(js_namespace = maplibregl)]
    type GeoJSONSource;

    #[wasm_bindgen(method, catch, js_name = setData)]
    fn set_data(this: &GeoJSONSource, data: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = maplibregl)]
    #[derive(Clone)]
    pub type Marker;

    #[wasm_bindgen(constructor, js_namespace = maplibregl)]
    fn new(options: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &Marker, lng_lat: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Marker, map: &Map) -> Marker;

    #[wasm_bindgen(method)]
    pub fn remove(this: &Marker) -> Marker;

    #[wasm_bindgen(js_namespace = maplibregl)]
    #[derive(Clone)]
    pub type Popup;

    #[wasm_bindgen(constructor, js_namespace = maplibregl)]
    fn new(options: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &Popup, lng_lat: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setHTML)]
    fn set_html(this: &Popup, html: &str) -> Popup;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Popup, map: &Map) -> Popup;

    #[wasm_bindgen(method)]
    pub fn remove(this: &Popup) -> Popup;

    pub type MapMouseEvent;

    #[wasm_bindgen(method, getter, js_name = lngLat)]
    fn lng_lat(this: &MapMouseEvent) -> JsLngLat;

    type JsLngLat;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLngLat) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLngLat) -> f64;
}

/// Plain JS object from any serializable value; maps become objects, not `Map`s.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("serialize error: {e}"))
}

fn lng_lat_js(location: LngLat) -> JsValue {
    Array::of2(&location.lng.into(), &location.lat.into()).into()
}

fn js_error(context: &str, err: JsValue) -> String {
    format!("{context}: {err:?}")
}

impl MapMouseEvent {
    pub fn location(&self) -> LngLat {
        let lng_lat = self.lng_lat();
        LngLat::new(lng_lat.lng(), lng_lat.lat())
    }
}

impl Map {
    /// Mounts a map into `container`; `options` carries everything but the element.
    pub fn mount(container: &web_sys::HtmlElement, options: &Value) -> Result<Map, String> {
        let options = to_js(options)?;
        Reflect::set(&options, &"container".into(), container)
            .map_err(|e| js_error("set container", e))?;
        Map::new(&options).map_err(|e| js_error("create map", e))
    }

    pub fn fly_to(&self, center: LngLat, zoom: f64) {
        let options = Object::new();
        let _ = Reflect::set(&options, &"center".into(), &lng_lat_js(center));
        let _ = Reflect::set(&options, &"zoom".into(), &zoom.into());
        self.fly_to_js(&options);
    }
}

impl MapLayers for Map {
    fn has_source(&self, id: &str) -> bool {
        !self.get_source(id).is_undefined()
    }

    fn add_source(&self, id: &str, source: &Value) -> Result<(), String> {
        self.add_source_js(id, &to_js(source)?)
            .map_err(|e| js_error("addSource", e))
    }

    fn set_source_data(&self, id: &str, data: &Value) -> Result<(), String> {
        let source = self.get_source(id);
        if source.is_undefined() {
            return Err(format!("no source {id}"));
        }
        source
            .unchecked_into::<GeoJSONSource>()
            .set_data(&to_js(data)?)
            .map_err(|e| js_error("setData", e))
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.get_layer(id).is_undefined()
    }

    fn add_layer(&self, layer: &Value, before: Option<&str>) -> Result<(), String> {
        self.add_layer_js(&to_js(layer)?, before.map(str::to_string))
            .map_err(|e| js_error("addLayer", e))
    }

    fn set_paint_property(&self, layer: &str, name: &str, value: &Value) -> Result<(), String> {
        self.set_paint_property_js(layer, name, &to_js(value)?)
            .map_err(|e| js_error("setPaintProperty", e))
    }
}

impl Marker {
    /// Marker using a caller-built element.
    pub fn with_element(element: &web_sys::HtmlElement, at: LngLat, map: &Map) -> Marker {
        let options = Object::new();
        let _ = Reflect::set(&options, &"element".into(), element);
        let marker = Marker::new(&options);
        marker.set_lng_lat(&lng_lat_js(at));
        marker.add_to(map);
        marker
    }

    /// Default pin in a flat colour.
    pub fn pin(color: &str, at: LngLat, map: &Map) -> Marker {
        let options = Object::new();
        let _ = Reflect::set(&options, &"color".into(), &color.into());
        let marker = Marker::new(&options);
        marker.set_lng_lat(&lng_lat_js(at));
        marker.add_to(map);
        marker
    }
}

impl Popup {
    /// Detached popup; shown with [`Popup::show`].
    pub fn detached(html: &str) -> Popup {
        let options = Object::new();
        let _ = Reflect::set(&options, &"closeButton".into(), &false.into());
        let _ = Reflect::set(&options, &"closeOnClick".into(), &false.into());
        let _ = Reflect::set(&options, &"offset".into(), &JsValue::from(15));
        let popup = Popup::new(&options);
        popup.set_html(html);
        popup
    }

    pub fn show(&self, at: LngLat, map: &Map) {
        self.set_lng_lat(&lng_lat_js(at));
        self.add_to(map);
    }
}
