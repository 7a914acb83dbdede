//! Leaflet bindings and the [`MapSurface`] they back.

use std::collections::HashMap;
use std::rc::Rc;

use atlas_shared::config::CameraConfig;
use atlas_shared::geo::{Bounds, LatLng};
use atlas_shared::surface::{Handle, MapEvent, MapEventKind, MapSurface, PathStyle};
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors &copy; CARTO";
const TILE_MAX_ZOOM: f64 = 18.0;
const EASE_LINEARITY: f64 = 0.25;

#[wasm_bindgen]
extern "C" {
    type LMap;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    fn create_map(container_id: &str, options: &JsValue) -> Result<LMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LMap, center: &JsValue, zoom: f64);

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &LMap, center: &JsValue, zoom: f64, options: &JsValue);

    #[wasm_bindgen(method, js_name = flyToBounds)]
    fn fly_to_bounds(this: &LMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LMap, bounds: &JsValue);

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &LMap) -> f64;

    #[wasm_bindgen(method, js_name = getMaxZoom)]
    fn get_max_zoom(this: &LMap) -> f64;

    #[wasm_bindgen(method)]
    fn on(this: &LMap, event: &str, callback: &Function);

    type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = polyline)]
    fn polyline(points: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LMap);

    #[wasm_bindgen(method)]
    fn remove(this: &Layer);

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Layer, style: &JsValue);

    #[wasm_bindgen(method, js_name = bringToFront)]
    fn bring_to_front(this: &Layer);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str);

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &Layer);

    #[wasm_bindgen(method, js_name = getElement)]
    fn get_element(this: &Layer) -> Option<web_sys::Element>;

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, callback: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &Layer);
}

/// A Leaflet option value before it crosses into JS.
#[derive(Debug, Clone, PartialEq)]
enum OptionValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl From<&OptionValue> for JsValue {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Number(n) => JsValue::from_f64(*n),
            OptionValue::Text(s) => JsValue::from_str(s),
            OptionValue::Flag(b) => JsValue::from_bool(*b),
        }
    }
}

/// Leaflet path options for the fields a style sets.
fn style_entries(style: &PathStyle) -> Vec<(&'static str, OptionValue)> {
    let mut entries = Vec::new();
    let mut number = |key: &'static str, value: Option<f64>| {
        if let Some(v) = value {
            entries.push((key, OptionValue::Number(v)));
        }
    };
    number("weight", style.weight);
    number("opacity", style.opacity);
    number("fillOpacity", style.fill_opacity);
    number("radius", style.radius);

    for (key, value) in [
        ("color", &style.color),
        ("fillColor", &style.fill_color),
        ("dashArray", &style.dash_array),
        ("className", &style.class_name),
    ] {
        if let Some(v) = value {
            entries.push((key, OptionValue::Text(v.clone())));
        }
    }
    if let Some(interactive) = style.interactive {
        entries.push(("interactive", OptionValue::Flag(interactive)));
    }
    entries
}

fn event_name(kind: MapEventKind) -> &'static str {
    match kind {
        MapEventKind::MouseOver => "mouseover",
        MapEventKind::MouseOut => "mouseout",
        MapEventKind::Click => "click",
        MapEventKind::PopupOpen => "popupopen",
        MapEventKind::PopupClose => "popupclose",
    }
}

fn js_object(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        let _ = Reflect::set(&object, &JsValue::from_str(key), value);
    }
    object.into()
}

fn style_object(style: &PathStyle) -> JsValue {
    let entries: Vec<(&str, JsValue)> = style_entries(style)
        .iter()
        .map(|(key, value)| (*key, JsValue::from(value)))
        .collect();
    js_object(&entries)
}

fn lat_lng(p: LatLng) -> JsValue {
    Array::of2(&p.lat.into(), &p.lng.into()).into()
}

fn bounds(b: Bounds) -> JsValue {
    Array::of2(
        &lat_lng(LatLng::new(b.south, b.west)),
        &lat_lng(LatLng::new(b.north, b.east)),
    )
    .into()
}

fn fly_options(duration_secs: f64) -> JsValue {
    js_object(&[
        ("duration", duration_secs.into()),
        ("easeLinearity", EASE_LINEARITY.into()),
    ])
}

type Callback = Closure<dyn FnMut(JsValue)>;

struct Entry {
    layer: Layer,
    on_map: bool,
    listeners: Vec<Callback>,
}

/// Leaflet map plus every primitive drawn on it, keyed by handle.
pub struct Leaflet {
    map: LMap,
    entries: HashMap<Handle, Entry>,
    next: u32,
    on_event: Rc<dyn Fn(MapEvent)>,
    _move_end: Callback,
}

impl Leaflet {
    /// Create the map inside `container_id` at the default view and report
    /// interaction through `on_event`.
    pub fn new(
        container_id: &str,
        camera: &CameraConfig,
        on_event: Rc<dyn Fn(MapEvent)>,
    ) -> Result<Self, String> {
        let world = bounds(Bounds {
            south: -85.0,
            west: -180.0,
            north: 85.0,
            east: 180.0,
        });
        let options = js_object(&[
            ("zoomControl", true.into()),
            ("minZoom", camera.min_zoom.into()),
            ("maxZoom", camera.max_zoom.into()),
            ("maxBounds", world),
            ("maxBoundsViscosity", 0.9_f64.into()),
        ]);
        let map = create_map(container_id, &options)
            .map_err(|e| format!("Failed to create map: {:?}", e))?;
        map.set_view(&lat_lng(camera.default_center()), camera.default_zoom);

        let tiles = tile_layer(
            TILE_URL,
            &js_object(&[
                ("maxZoom", TILE_MAX_ZOOM.into()),
                ("attribution", TILE_ATTRIBUTION.into()),
                ("subdomains", "abcd".into()),
                ("detectRetina", true.into()),
            ]),
        );
        tiles.add_to(&map);

        let moved = on_event.clone();
        let move_end = Closure::<dyn FnMut(JsValue)>::new(move |_| moved(MapEvent::MoveEnd));
        map.on("moveend", move_end.as_ref().unchecked_ref());

        Ok(Self {
            map,
            entries: HashMap::new(),
            next: 0,
            on_event,
            _move_end: move_end,
        })
    }

    fn insert(&mut self, layer: Layer) -> Handle {
        layer.add_to(&self.map);
        let handle = Handle(self.next);
        self.next += 1;
        self.entries.insert(
            handle,
            Entry {
                layer,
                on_map: true,
                listeners: Vec::new(),
            },
        );
        handle
    }

    fn on_map(&self, handle: Handle) -> Option<&Layer> {
        self.entries
            .get(&handle)
            .filter(|e| e.on_map)
            .map(|e| &e.layer)
    }
}

impl MapSurface for Leaflet {
    fn draw_line(&mut self, points: &[LatLng], style: &PathStyle) -> Handle {
        let points: Array = points.iter().map(|p| lat_lng(*p)).collect();
        self.insert(polyline(&points, &style_object(style)))
    }

    fn draw_point(&mut self, at: LatLng, style: &PathStyle) -> Handle {
        self.insert(circle_marker(&lat_lng(at), &style_object(style)))
    }

    fn draw_region(&mut self, at: LatLng, radius: f64, style: &PathStyle) -> Handle {
        let style = PathStyle {
            radius: Some(radius),
            ..style.clone()
        };
        self.insert(circle_marker(&lat_lng(at), &style_object(&style)))
    }

    fn set_style(&mut self, handle: Handle, style: &PathStyle) {
        if let Some(entry) = self.entries.get(&handle) {
            entry.layer.set_style(&style_object(style));
        }
    }

    fn set_class(&mut self, handle: Handle, class: &str, on: bool) {
        let element = self.entries.get(&handle).and_then(|e| e.layer.get_element());
        if let Some(element) = element {
            let _ = element.class_list().toggle_with_force(class, on);
        }
    }

    fn bring_to_front(&mut self, handle: Handle) {
        if let Some(layer) = self.on_map(handle) {
            layer.bring_to_front();
        }
    }

    fn show(&mut self, handle: Handle) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            if !entry.on_map {
                entry.layer.add_to(&self.map);
                entry.on_map = true;
            }
        }
    }

    fn hide(&mut self, handle: Handle) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            if entry.on_map {
                entry.layer.remove();
                entry.on_map = false;
            }
        }
    }

    fn destroy(&mut self, handle: Handle) {
        if let Some(entry) = self.entries.remove(&handle) {
            entry.layer.off();
            entry.layer.remove();
        }
    }

    fn bind_popup(&mut self, handle: Handle, html: &str) {
        if let Some(entry) = self.entries.get(&handle) {
            entry.layer.bind_popup(html);
        }
    }

    fn open_popup(&mut self, handle: Handle) {
        if let Some(layer) = self.on_map(handle) {
            layer.open_popup();
        }
    }

    fn listen(&mut self, handle: Handle, kinds: &[MapEventKind]) {
        let Some(entry) = self.entries.get_mut(&handle) else {
            return;
        };
        for &kind in kinds {
            let on_event = self.on_event.clone();
            let callback = Closure::<dyn FnMut(JsValue)>::new(move |_| {
                on_event(MapEvent::Primitive { handle, kind })
            });
            entry
                .layer
                .on(event_name(kind), callback.as_ref().unchecked_ref());
            entry.listeners.push(callback);
        }
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_secs: f64) {
        self.map
            .fly_to(&lat_lng(center), zoom, &fly_options(duration_secs));
    }

    fn fly_to_bounds(&mut self, target: Bounds, duration_secs: f64) {
        self.map
            .fly_to_bounds(&bounds(target), &fly_options(duration_secs));
    }

    fn fit_bounds(&mut self, target: Bounds) {
        self.map.fit_bounds(&bounds(target));
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.map.set_view(&lat_lng(center), zoom);
    }

    fn zoom(&self) -> f64 {
        self.map.get_zoom()
    }

    fn max_zoom(&self) -> f64 {
        self.map.get_max_zoom()
    }
}
