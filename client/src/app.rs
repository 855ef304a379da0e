use std::cell::RefCell;

use leptos::prelude::*;
use mapscale_shared::travel::{MAX_MINUTES, MIN_MINUTES, MINUTES_STEP};
use mapscale_shared::{LngLat, Poi, TravelMode};
use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::colors::mode_fill;
use crate::fetch;
use crate::layers;
use crate::maplibre::{Map, MapMouseEvent};
use crate::markers::{self, MAX_MARKERS};
use crate::query::{FetchTicket, QueryState, Resolution};

const MAP_STYLE_URL: &str = "https://tiles.openfreemap.org/styles/positron";
const INITIAL_CENTER: [f64; 2] = [4.936, 52.338];
const INITIAL_ZOOM: f64 = 12.0;
const SEARCH_ZOOM: f64 = 14.0;

/// Newtype wrappers so Leptos context can tell the signals apart.
#[derive(Clone, Copy)]
pub(crate) struct Query(pub RwSignal<QueryState>);
#[derive(Clone, Copy)]
pub(crate) struct MapReady(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct FilteredPois(pub Memo<Vec<Poi>>);

struct MapBinding {
    map: Map,
    on_load: Closure<dyn Fn()>,
    on_click: Closure<dyn Fn(MapMouseEvent)>,
}

impl MapBinding {
    fn release(self) {
        self.map.off("load", self.on_load.as_ref().unchecked_ref());
        self.map.off("click", self.on_click.as_ref().unchecked_ref());
        self.map.remove();
    }
}

thread_local! {
    static MAP_BINDING: RefCell<Option<MapBinding>> = const { RefCell::new(None) };
}

fn with_map<R>(f: impl FnOnce(&Map) -> R) -> Option<R> {
    MAP_BINDING.with(|slot| slot.borrow().as_ref().map(|binding| f(&binding.map)))
}

fn release_map() {
    let binding = MAP_BINDING.with(|slot| slot.borrow_mut().take());
    if let Some(binding) = binding {
        binding.release();
    }
}

/// Fetches isochrone and POIs for `ticket` and hands the outcome back to the state.
fn run_cycle(query: RwSignal<QueryState>, ticket: FetchTicket) {
    spawn_local(async move {
        let outcome = fetch::fetch_area(&ticket.area_query()).await;
        if let Err(e) = &outcome {
            web_sys::console::error_1(&format!("Area fetch failed: {e}").into());
        }
        if let Some(Resolution::Stale) = query.try_update(|s| s.resolve(&ticket, outcome)) {
            web_sys::console::info_1(
                &format!("Dropped response for superseded cycle {}", ticket.generation).into(),
            );
        }
    });
}

fn start_query(query: RwSignal<QueryState>, center: LngLat) {
    if let Some(ticket) = query.try_update(|s| s.start(center)) {
        run_cycle(query, ticket);
    }
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        window.alert_with_message(message).ok();
    }
}

fn mount_map(container: &web_sys::HtmlElement, query: RwSignal<QueryState>, map_ready: RwSignal<bool>) {
    let options = json!({
        "style": MAP_STYLE_URL,
        "center": INITIAL_CENTER,
        "zoom": INITIAL_ZOOM,
    });
    let map = match Map::mount(container, &options) {
        Ok(map) => map,
        Err(e) => {
            web_sys::console::error_1(&format!("Map init failed: {e}").into());
            return;
        }
    };

    let on_load = {
        let map = map.clone();
        Closure::<dyn Fn()>::new(move || {
            if let Err(e) = layers::install_route_preview(&map) {
                web_sys::console::warn_1(&format!("Route preview layer: {e}").into());
            }
            map_ready.try_set(true);
        })
    };
    let on_click = Closure::<dyn Fn(MapMouseEvent)>::new(move |e: MapMouseEvent| {
        start_query(query, e.location());
    });
    map.on("load", on_load.as_ref().unchecked_ref());
    map.on("click", on_click.as_ref().unchecked_ref());

    MAP_BINDING.with(|slot| {
        let previous = slot.borrow_mut().replace(MapBinding {
            map,
            on_load,
            on_click,
        });
        if let Some(previous) = previous {
            previous.release();
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let query = RwSignal::new(QueryState::default());
    let map_ready = RwSignal::new(false);

    let center = Memo::new(move |_| query.with(|s| s.center()));
    let isochrone = Memo::new(move |_| {
        query.with(|s| s.isochrone().cloned().map(|iso| (iso, s.isochrone_mode())))
    });
    let filtered = Memo::new(move |_| {
        query.with(|s| {
            s.filtered_pois().unwrap_or_else(|e| {
                web_sys::console::warn_1(&format!("POI filter failed: {e}").into());
                Vec::new()
            })
        })
    });
    let route = Memo::new(move |_| query.with(|s| s.hovered_route().cloned()));

    provide_context(Query(query));
    provide_context(MapReady(map_ready));
    provide_context(FilteredPois(filtered));

    // Isochrone fill
    Effect::new(move || {
        let ready = map_ready.get();
        let current = isochrone.get();
        if !ready {
            return;
        }
        let result = with_map(|map| match &current {
            Some((iso, mode)) => layers::sync_isochrone(map, iso, *mode),
            None => layers::clear_isochrone(map),
        });
        if let Some(Err(e)) = result {
            web_sys::console::warn_1(&format!("Isochrone layer: {e}").into());
        }
    });

    // POI markers, capped
    Effect::new(move || {
        let ready = map_ready.get();
        filtered.with(|pois| {
            if !ready {
                return;
            }
            let visible = &pois[..pois.len().min(MAX_MARKERS)];
            with_map(|map| markers::sync(map, visible, query));
        });
    });

    // Route preview
    Effect::new(move || {
        let ready = map_ready.get();
        let current = route.get();
        if !ready {
            return;
        }
        if let Some(Err(e)) = with_map(|map| layers::sync_route_preview(map, current.as_ref())) {
            web_sys::console::warn_1(&format!("Route preview layer: {e}").into());
        }
    });

    // Center marker
    Effect::new(move || {
        let current = center.get();
        with_map(|map| markers::set_center(map, current));
    });

    on_cleanup(|| {
        markers::clear_all();
        release_map();
    });

    view! {
        <div style="position: relative; width: 100%; height: 100vh; background-color: #eee;">
            <MapView />
            <SearchBar />
            <div style="position: absolute; top: 20px; left: 20px; background-color: white; padding: 20px; border-radius: 12px; box-shadow: 0 4px 12px rgba(0,0,0,0.1); z-index: 10; width: 220px; font-family: system-ui, sans-serif;">
                <h3 style="margin-top: 0;">"MapScale Analysis"</h3>
                <AnalysisPanel />
                <StatusLine />
            </div>
        </div>
    }
}

#[component]
fn MapView() -> impl IntoView {
    let Query(query) = expect_context();
    let MapReady(map_ready) = expect_context();
    let map_ref = NodeRef::<leptos::html::Div>::new();

    Effect::new(move || {
        let Some(container) = map_ref.get() else {
            return;
        };
        if with_map(|_| ()).is_some() {
            return;
        }
        mount_map(&container, query, map_ready);
    });

    view! { <div node_ref=map_ref style="width: 100%; height: 100%;" /> }
}

#[component]
fn SearchBar() -> impl IntoView {
    let Query(query) = expect_context();
    let text = RwSignal::new(String::new());
    let searching = RwSignal::new(false);

    let submit = move || {
        let address = text.get_untracked().trim().to_string();
        if address.is_empty() || searching.get_untracked() {
            return;
        }
        searching.set(true);
        spawn_local(async move {
            let found = fetch::geocode(&address).await;
            searching.try_set(false);
            match found {
                Ok(found) => match query.try_update(|s| s.geocoded(found)).flatten() {
                    Some(ticket) => {
                        with_map(|map| map.fly_to(ticket.center, SEARCH_ZOOM));
                        run_cycle(query, ticket);
                    }
                    None => alert("Address not found."),
                },
                Err(e) => {
                    web_sys::console::error_1(&format!("Geocoding failed: {e}").into());
                }
            }
        });
    };

    view! {
        <div style="position: absolute; top: 20px; right: 20px; z-index: 10; display: flex; gap: 8px; align-items: center;">
            <div style="position: relative;">
                <input
                    type="text"
                    placeholder="Search address (e.g. 1112XC)..."
                    style="padding: 12px 15px; border-radius: 12px; border: none; outline: none; font-size: 14px; box-shadow: 0 4px 15px rgba(0,0,0,0.15); width: 280px;"
                    prop:value=move || text.get()
                    on:input=move |ev| text.set(event_target_value(&ev))
                    on:keydown=move |ev: leptos::ev::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            submit();
                        }
                    }
                />
                {move || {
                    (!text.get().is_empty()).then(|| view! {
                        <button
                            style="position: absolute; right: 10px; top: 50%; transform: translateY(-50%); border: none; background: none; color: #ccc; cursor: pointer;"
                            on:click=move |_| text.set(String::new())
                        >
                            "\u{2715}"
                        </button>
                    })
                }}
            </div>
            <button
                style="padding: 12px 20px; border-radius: 12px; border: none; background-color: #6a0dad; color: white; cursor: pointer; font-weight: bold; box-shadow: 0 4px 15px rgba(106, 13, 173, 0.3);"
                disabled=move || searching.get()
                on:click=move |_| submit()
            >
                {move || if searching.get() { "Searching..." } else { "Search" }}
            </button>
        </div>
    }
}

#[component]
fn AnalysisPanel() -> impl IntoView {
    let Query(query) = expect_context();
    let params = Memo::new(move |_| query.with(|s| s.params()));

    let on_mode = move |ev: leptos::ev::Event| {
        let Ok(mode) = event_target_value(&ev).parse::<TravelMode>() else {
            return;
        };
        if let Some(Some(ticket)) = query.try_update(|s| s.set_mode(mode)) {
            run_cycle(query, ticket);
        }
    };

    let on_minutes = move |ev: leptos::ev::Event| {
        let Ok(minutes) = event_target_value(&ev).trim().parse::<u32>() else {
            return;
        };
        if let Some(Some(ticket)) = query.try_update(|s| s.set_minutes(minutes)) {
            run_cycle(query, ticket);
        }
    };

    view! {
        <div style="padding: 15px; background: #f8f9fa; border-radius: 8px; margin-bottom: 20px; border: 1px solid #e9ecef;">
            <h4 style="margin: 0 0 12px 0; font-size: 14px; color: #333;">"Analysis Params"</h4>
            <div style="margin-bottom: 15px;">
                <label style="display: block; font-size: 11px; color: #666; margin-bottom: 5px;">"Mode"</label>
                <select
                    style="width: 100%; padding: 6px; border-radius: 4px; border: 1px solid #ddd; font-size: 13px;"
                    prop:value=move || params.get().mode.as_str()
                    on:change=on_mode
                >
                    {TravelMode::ALL
                        .into_iter()
                        .map(|mode| view! { <option value=mode.as_str()>{mode.label()}</option> })
                        .collect_view()}
                </select>
            </div>
            <div style="margin-bottom: 10px;">
                <div style="display: flex; justify-content: space-between; margin-bottom: 5px;">
                    <label style="font-size: 11px; color: #666;">"Time Range"</label>
                    <span
                        style="font-size: 12px; font-weight: bold;"
                        style:color=move || mode_fill(params.get().mode)
                    >
                        {move || format!("{} mins", params.get().minutes)}
                    </span>
                </div>
                <input
                    type="range"
                    min=MIN_MINUTES
                    max=MAX_MINUTES
                    step=MINUTES_STEP
                    style="width: 100%; cursor: pointer;"
                    style:accent-color=move || mode_fill(params.get().mode)
                    prop:value=move || params.get().minutes.to_string()
                    on:change=on_minutes
                />
            </div>
        </div>
    }
}

#[component]
fn StatusLine() -> impl IntoView {
    let Query(query) = expect_context();
    let FilteredPois(filtered) = expect_context();
    let loading = Memo::new(move |_| query.with(|s| s.is_loading()));

    view! {
        {move || {
            if loading.get() {
                view! { <p style="color: #6a0dad; font-weight: bold;">"Analyzing Area..."</p> }.into_any()
            } else {
                let count = filtered.with(Vec::len);
                view! { <p>"Found " <b>{count}</b> " locations."</p> }.into_any()
            }
        }}
    }
}
