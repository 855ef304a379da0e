//! POI marker lifecycle: one DOM marker and popup per visible POI, released as
//! soon as the POI leaves the visible set.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::NaiveDateTime;
use leptos::prelude::*;
use mapscale_shared::{OpenStatus, Poi, PoiId, hours};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::colors::kind_marker;
use crate::fetch;
use crate::hover::HoverTracker;
use crate::maplibre::{Map, Marker, Popup};
use crate::query::QueryState;

pub const MAX_MARKERS: usize = 40;

const DOT_SIZE_PX: u32 = 14;
const DOT_HOVER_SIZE_PX: u32 = 20;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub added: usize,
    pub removed: usize,
    pub failed: Vec<String>,
}

/// Handles keyed by POI id. Dropping a handle is what releases it.
pub struct MarkerSet<H> {
    entries: HashMap<PoiId, (Poi, H)>,
}

impl<H> Default for MarkerSet<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> MarkerSet<H> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: PoiId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Makes the set match `visible`: drops handles for POIs no longer present,
    /// acquires handles for new ones and replaces handles whose POI data changed.
    pub fn reconcile<F>(&mut self, visible: &[Poi], mut acquire: F) -> ReconcileSummary
    where
        F: FnMut(&Poi) -> Result<H, String>,
    {
        let mut summary = ReconcileSummary::default();
        let wanted: HashSet<PoiId> = visible.iter().map(|poi| poi.id).collect();

        let before = self.entries.len();
        self.entries.retain(|id, _| wanted.contains(id));
        summary.removed = before - self.entries.len();

        for poi in visible {
            if let Some((current, _)) = self.entries.get(&poi.id) {
                if current == poi {
                    continue;
                }
                self.entries.remove(&poi.id);
                summary.removed += 1;
            }
            match acquire(poi) {
                Ok(handle) => {
                    self.entries.insert(poi.id, (poi.clone(), handle));
                    summary.added += 1;
                }
                Err(e) => summary.failed.push(format!("poi {}: {e}", poi.id)),
            }
        }
        summary
    }
}

/// Status as shown in the popup. Unparseable hours are logged and shown as Info.
pub fn marker_status(poi: &Poi, now: NaiveDateTime) -> OpenStatus {
    hours::status_for(poi.opening_hours(), now).unwrap_or_else(|e| {
        web_sys::console::warn_1(&format!("poi {}: {e}", poi.id).into());
        OpenStatus::Info
    })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn popup_html(poi: &Poi, status: OpenStatus) -> String {
    let kind = poi.kind();
    let mut html = format!(
        "<div class=\"poi-popup\"><strong>{}</strong><br>\
         <span style=\"color: {}; font-weight: 600;\">{}</span><br>\
         <span class=\"poi-kind\" style=\"color: {};\">{}</span>",
        escape_html(poi.name()),
        status.color(),
        status.label(),
        kind_marker(kind),
        kind.label(),
    );
    if let Some(address) = poi.address_line() {
        html.push_str("<br><small>");
        html.push_str(&escape_html(&address));
        html.push_str("</small>");
    }
    html.push_str("</div>");
    html
}

fn set_dot_size(dot: &web_sys::HtmlElement, px: u32) {
    let size = format!("{px}px");
    let style = dot.style();
    style.set_property("width", &size).ok();
    style.set_property("height", &size).ok();
}

/// A POI marker on the map with its popup and hover listeners.
pub struct PoiMarker {
    marker: Marker,
    popup: Popup,
    container: web_sys::HtmlElement,
    tracker: Rc<RefCell<HoverTracker>>,
    query: RwSignal<QueryState>,
    on_enter: Closure<dyn Fn()>,
    on_leave: Closure<dyn Fn()>,
}

impl PoiMarker {
    pub fn attach(map: &Map, poi: &Poi, query: RwSignal<QueryState>, now: NaiveDateTime) -> Result<Self, String> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;
        let container = document
            .create_element("div")
            .map_err(|e| format!("create marker element: {e:?}"))?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| "marker element is not an HtmlElement".to_string())?;
        let dot = document
            .create_element("div")
            .map_err(|e| format!("create marker dot: {e:?}"))?
            .dyn_into::<web_sys::HtmlElement>()
            .map_err(|_| "marker dot is not an HtmlElement".to_string())?;
        container.set_class_name("poi-marker");
        dot.set_class_name("poi-marker-dot");
        dot.style()
            .set_property("background", kind_marker(poi.kind()))
            .ok();
        set_dot_size(&dot, DOT_SIZE_PX);
        container
            .append_child(&dot)
            .map_err(|e| format!("attach marker dot: {e:?}"))?;

        let location = poi.location();
        let popup = Popup::detached(&popup_html(poi, marker_status(poi, now)));
        let tracker = Rc::new(RefCell::new(HoverTracker::default()));

        let on_enter = {
            let dot = dot.clone();
            let popup = popup.clone();
            let map = map.clone();
            let tracker = tracker.clone();
            Closure::<dyn Fn()>::new(move || {
                set_dot_size(&dot, DOT_HOVER_SIZE_PX);
                popup.show(location, &map);

                let Some((center, mode)) = query.try_with_untracked(|s| (s.center(), s.params().mode)) else {
                    return;
                };
                let Some(request) = tracker.borrow_mut().enter(center, location, mode) else {
                    return;
                };
                let tracker = tracker.clone();
                spawn_local(async move {
                    match fetch::fetch_route(&request.query).await {
                        Ok(route) => {
                            if tracker.borrow().accepts(&request) {
                                query.try_update(|s| s.show_route(request.from(), route));
                            }
                        }
                        Err(e) => {
                            web_sys::console::warn_1(&format!("Route preview failed: {e}").into());
                        }
                    }
                });
            })
        };

        let on_leave = {
            let dot = dot.clone();
            let popup = popup.clone();
            let tracker = tracker.clone();
            Closure::<dyn Fn()>::new(move || {
                set_dot_size(&dot, DOT_SIZE_PX);
                popup.remove();
                tracker.borrow_mut().leave();
                query.try_update(QueryState::clear_route);
            })
        };

        container
            .add_event_listener_with_callback("mouseenter", on_enter.as_ref().unchecked_ref())
            .map_err(|e| format!("bind mouseenter: {e:?}"))?;
        container
            .add_event_listener_with_callback("mouseleave", on_leave.as_ref().unchecked_ref())
            .map_err(|e| format!("bind mouseleave: {e:?}"))?;

        let marker = Marker::with_element(&container, location, map);
        Ok(Self {
            marker,
            popup,
            container,
            tracker,
            query,
            on_enter,
            on_leave,
        })
    }
}

impl Drop for PoiMarker {
    fn drop(&mut self) {
        self.container
            .remove_event_listener_with_callback("mouseenter", self.on_enter.as_ref().unchecked_ref())
            .ok();
        self.container
            .remove_event_listener_with_callback("mouseleave", self.on_leave.as_ref().unchecked_ref())
            .ok();
        // Removed nodes never fire mouseleave.
        if let Ok(mut tracker) = self.tracker.try_borrow_mut() {
            if tracker.is_hovering() {
                self.query.try_update(QueryState::clear_route);
            }
            tracker.leave();
        }
        self.popup.remove();
        self.marker.remove();
    }
}

thread_local! {
    static MARKERS: RefCell<MarkerSet<PoiMarker>> = RefCell::new(MarkerSet::default());
    static CENTER_MARKER: RefCell<Option<Marker>> = const { RefCell::new(None) };
}

/// Brings the on-map markers in line with `visible`.
pub fn sync(map: &Map, visible: &[Poi], query: RwSignal<QueryState>) {
    let now = chrono::Local::now().naive_local();
    let summary = MARKERS.with(|slot| {
        slot.borrow_mut()
            .reconcile(visible, |poi| PoiMarker::attach(map, poi, query, now))
    });
    for failure in &summary.failed {
        web_sys::console::error_1(&format!("Marker creation failed: {failure}").into());
    }
}

pub fn set_center(map: &Map, center: Option<mapscale_shared::LngLat>) {
    CENTER_MARKER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(old) = slot.take() {
            old.remove();
        }
        if let Some(center) = center {
            *slot = Some(Marker::pin(crate::colors::CENTER_MARKER, center, map));
        }
    });
}

/// Releases every marker, including the center marker.
pub fn clear_all() {
    // Take first so handle drops run without the registry borrowed.
    let markers = MARKERS.with(|slot| std::mem::take(&mut *slot.borrow_mut()));
    drop(markers);
    CENTER_MARKER.with(|slot| {
        if let Some(marker) = slot.borrow_mut().take() {
            marker.remove();
        }
    });
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use mapscale_shared::{OpenStatus, Poi};

    use super::{MarkerSet, ReconcileSummary, popup_html};

    struct Handle {
        live: Rc<Cell<usize>>,
    }

    impl Handle {
        fn new(live: &Rc<Cell<usize>>) -> Self {
            live.set(live.get() + 1);
            Self { live: live.clone() }
        }
    }

    impl Drop for Handle {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    fn poi(id: u64, name: &str) -> Poi {
        Poi {
            id,
            lon: 4.9,
            lat: 52.35,
            tags: HashMap::from([
                ("name".to_string(), name.to_string()),
                ("shop".to_string(), "supermarket".to_string()),
            ]),
        }
    }

    #[test]
    fn handles_follow_visible_set() {
        let live = Rc::new(Cell::new(0));
        let mut set = MarkerSet::default();

        let summary = set.reconcile(&[poi(1, "A"), poi(2, "B")], |_| Ok(Handle::new(&live)));
        assert_eq!(summary.added, 2);
        assert_eq!(set.len(), 2);
        assert_eq!(live.get(), 2);

        let summary = set.reconcile(&[poi(2, "B"), poi(3, "C")], |_| Ok(Handle::new(&live)));
        assert_eq!(
            summary,
            ReconcileSummary {
                added: 1,
                removed: 1,
                failed: vec![],
            }
        );
        assert_eq!(live.get(), 2);
        assert!(!set.contains(1));
        assert!(set.contains(3));

        set.reconcile(&[], |_| Ok(Handle::new(&live)));
        assert!(set.is_empty());
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn unchanged_pois_keep_their_handle() {
        let live = Rc::new(Cell::new(0));
        let mut set = MarkerSet::default();
        set.reconcile(&[poi(1, "A")], |_| Ok(Handle::new(&live)));

        let mut acquired = 0;
        set.reconcile(&[poi(1, "A")], |_| {
            acquired += 1;
            Ok(Handle::new(&live))
        });
        assert_eq!(acquired, 0);

        let summary = set.reconcile(&[poi(1, "A renamed")], |_| Ok(Handle::new(&live)));
        assert_eq!((summary.added, summary.removed), (1, 1));
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn failed_acquire_is_reported_and_skipped() {
        let live = Rc::new(Cell::new(0));
        let mut set: MarkerSet<Handle> = MarkerSet::default();
        let summary = set.reconcile(&[poi(7, "A")], |_| Err("no document".to_string()));
        assert_eq!(summary.failed, vec!["poi 7: no document".to_string()]);
        assert!(set.is_empty());

        set.reconcile(&[poi(8, "B")], |_| Ok(Handle::new(&live)));
        assert_eq!(live.get(), 1);
        drop(set);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn popup_lists_name_status_kind_and_address() {
        let mut shop = poi(1, "Albert <Heijn>");
        shop.tags.insert("addr:street".into(), "Ouddiemerlaan".into());
        shop.tags.insert("addr:housenumber".into(), "104".into());
        shop.tags.insert("addr:city".into(), "Diemen".into());

        let html = popup_html(&shop, OpenStatus::Open);
        assert!(html.contains("Albert &lt;Heijn&gt;"));
        assert!(html.contains(OpenStatus::Open.label()));
        assert!(html.contains("#27ae60"));
        assert!(html.contains("#FFD700"));
        assert!(html.contains("Ouddiemerlaan 104, Diemen"));
    }

    #[test]
    fn popup_without_address_has_no_address_line() {
        let html = popup_html(&poi(2, "Gym"), OpenStatus::Unknown);
        assert!(!html.contains("<small>"));
        assert!(html.contains("#999"));
    }
}
