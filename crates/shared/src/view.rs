//! The atlas controller: view state plus every transition between views.
//!
//! [`Atlas`] owns the loaded entities, their map layers, the sidebar state
//! and the audio coordinator. All user and map input goes through it, so
//! the map, the sidebar and the audio never disagree about what is focused.

use crate::audio::{AudioCoordinator, AudioSink};
use crate::config::{AtlasConfig, UndatedRoutes};
use crate::geo::Bounds;
use crate::layers::{LayerRegistry, Owner, RoutePart, StudioPart};
use crate::models::{EntityStore, Route};
use crate::sidebar::{self, ComposerRow, Intent, Key, SidebarState, StudioRow, Tab};
use crate::surface::{Handle, MapEvent, MapEventKind, MapSurface, PathStyle};

const HIGHLIGHTED: &str = "highlighted";
const ACTIVE: &str = "active";

/// Whether focusing a composer also moves the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    Fit,
    Suppress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub global: bool,
    pub active_composer: Option<String>,
    pub last_selected: Option<String>,
    pub active_studio: Option<String>,
    pub timeline_year: i32,
}

/// A route line to drop back to its normal weight once `delay_ms` passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRestore {
    pub composer: String,
    pub index: usize,
    pub delay_ms: u32,
}

pub struct Atlas<M: MapSurface, S: AudioSink> {
    config: AtlasConfig,
    store: EntityStore,
    layers: LayerRegistry,
    view: ViewState,
    sidebar: SidebarState,
    audio: AudioCoordinator<S>,
    map: M,
    /// Popup to open once the current camera flight lands.
    pending_popup: Option<Handle>,
}

impl<M: MapSurface, S: AudioSink> Atlas<M, S> {
    pub fn new(map: M, background: S, config: AtlasConfig) -> Self {
        Self {
            view: ViewState {
                global: true,
                active_composer: None,
                last_selected: None,
                active_studio: None,
                timeline_year: config.timeline.latest(),
            },
            audio: AudioCoordinator::new(background, config.audio.clone()),
            config,
            store: EntityStore::default(),
            layers: LayerRegistry::new(),
            sidebar: SidebarState::default(),
            map,
            pending_popup: None,
        }
    }

    /// Replace the loaded entities, redraw everything and start in global
    /// view.
    pub fn load(&mut self, store: EntityStore) {
        self.store = store;
        self.layers.rebuild_composer_layers(
            &mut self.map,
            &self.store.composers,
            &self.config.palette,
            &self.config.style,
        );
        self.layers
            .rebuild_studio_layers(&mut self.map, &self.store.studios, &self.config.style);
        self.view.active_composer = None;
        self.view.last_selected = None;
        self.view.active_studio = None;
        self.sidebar.expanded = None;
        let query = self.sidebar.query.clone();
        self.sidebar.apply_search(&self.store.composers, &query);
        self.pending_popup = None;
        tracing::info!(
            composers = self.store.composers.len(),
            studios = self.store.studios.len(),
            "Atlas ready"
        );
        self.enter_global_view();
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn sidebar(&self) -> &SidebarState {
        &self.sidebar
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn audio(&self) -> &AudioCoordinator<S> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioCoordinator<S> {
        &mut self.audio
    }

    pub fn composer_rows(&self) -> Vec<ComposerRow> {
        sidebar::composer_rows(
            &self.store,
            &self.sidebar,
            self.view.active_composer.as_deref(),
            &self.config.palette,
        )
    }

    pub fn studio_rows(&self) -> Vec<StudioRow> {
        sidebar::studio_rows(&self.store.studios, self.view.active_studio.as_deref())
    }

    /// Apply a sidebar intent. A returned restore must be fed back through
    /// [`Atlas::restore_route`] after its delay.
    pub fn dispatch(&mut self, intent: Intent) -> Option<RouteRestore> {
        match intent {
            Intent::HeaderClick(id) | Intent::HeaderKey(id, Key::Enter | Key::Space) => {
                if self.sidebar.toggle(&id) {
                    self.focus_composer(&id, CameraMove::Fit);
                }
            }
            Intent::HeaderKey(id, Key::Escape) => self.sidebar.collapse(&id),
            Intent::HeaderKey(_, Key::Other) => {}
            Intent::HeaderHover(id, on) => self.highlight_composer(&id, on),
            Intent::RouteClick(id, index) => return self.focus_route(&id, index),
            Intent::OutsideClick => self.sidebar.collapse_all(),
            Intent::StudioClick(id) => self.open_studio(&id),
            Intent::StudioHover(id, on) => {
                self.highlight_studio(&id, on);
                if on {
                    if let Some(studio) = self.layers.studio(&id) {
                        self.map.bring_to_front(studio.ring);
                        self.map.bring_to_front(studio.fill);
                    }
                }
            }
            Intent::SelectTab(tab) => self.set_tab(tab),
            Intent::Search(query) => self.set_search(&query),
            Intent::ToggleGlobalView => {
                if self.view.global {
                    self.leave_global_view();
                } else {
                    self.enter_global_view();
                }
            }
            Intent::Timeline(year) => {
                self.set_timeline_year(year);
            }
        }
        None
    }

    /// Show every composer, filtered by a timeline reset to its maximum,
    /// and fit the camera to what is left.
    pub fn enter_global_view(&mut self) {
        if let Some(active) = self.view.active_composer.take() {
            self.view.last_selected = Some(active);
        }
        self.view.global = true;

        let ids: Vec<String> = self.store.composers.iter().map(|c| c.id.clone()).collect();
        for id in &ids {
            self.layers.set_composer_visibility(&mut self.map, id, true);
            self.apply_baseline_style(id);
        }

        self.view.timeline_year = self.config.timeline.latest();
        self.filter_by_timeline();
        self.fit_visible();
    }

    /// Focus the last selected composer, or the first one.
    pub fn leave_global_view(&mut self) {
        let target = self
            .view
            .last_selected
            .clone()
            .filter(|id| self.store.composer(id).is_some())
            .or_else(|| self.store.composers.first().map(|c| c.id.clone()));
        if let Some(id) = target {
            self.focus_composer(&id, CameraMove::Fit);
        }
    }

    /// Make `id` the only composer on the map, shown without the timeline
    /// filter.
    pub fn focus_composer(&mut self, id: &str, camera: CameraMove) {
        if self.store.composer(id).is_none() {
            tracing::debug!(composer = id, "Ignoring focus on unknown composer");
            return;
        }

        if self.view.global {
            self.view.global = false;
            self.layers.rebuild_composer_layers(
                &mut self.map,
                &self.store.composers,
                &self.config.palette,
                &self.config.style,
            );
            self.pending_popup = None;
        }
        self.view.last_selected = Some(id.to_string());
        self.view.active_composer = Some(id.to_string());

        for composer in &self.store.composers {
            let visible = composer.id == id;
            self.layers
                .set_composer_visibility(&mut self.map, &composer.id, visible);
        }
        self.apply_baseline_style(id);

        if camera == CameraMove::Suppress {
            return;
        }
        if let Some(bounds) = self.layers.composer_bounds(id).filter(Bounds::is_valid) {
            if bounds.is_point() {
                let zoom = self.config.camera.focus_zoom.max(self.map.zoom());
                self.map.set_view(bounds.center(), zoom);
            } else {
                self.map.fit_bounds(bounds.pad(self.config.camera.composer_padding));
            }
        }
    }

    /// Emphasize one route and fly to it without touching which composer is
    /// active. The popup opens once the camera settles.
    pub fn focus_route(&mut self, id: &str, index: usize) -> Option<RouteRestore> {
        let route = self.layers.route(id, index)?.clone();
        let duration = self.config.camera.fly_duration_secs;

        self.map
            .set_style(route.line, &PathStyle::weight(self.config.style.route_focus_weight));
        self.map.bring_to_front(route.line);

        match route.marker {
            Some(marker) => {
                let zoom = self
                    .config
                    .camera
                    .focus_zoom
                    .max(self.map.zoom())
                    .min(self.map.max_zoom());
                self.map.fly_to(route.to, zoom, duration);
                self.pending_popup = Some(marker);
            }
            None => {
                let bounds = self
                    .layers
                    .route_bounds(id, index)
                    .filter(Bounds::is_valid);
                let Some(bounds) = bounds else {
                    self.restore_route(id, index);
                    return None;
                };
                let padded = bounds.pad(self.config.camera.route_padding);
                self.map.fly_to_bounds(padded, duration);
                self.pending_popup = Some(route.line);
            }
        }

        Some(RouteRestore {
            composer: id.to_string(),
            index,
            delay_ms: self.config.style.route_focus_ms,
        })
    }

    pub fn restore_route(&mut self, id: &str, index: usize) {
        if let Some(route) = self.layers.route(id, index) {
            self.map
                .set_style(route.line, &PathStyle::weight(self.config.style.route_weight));
        }
    }

    /// Move the timeline cutoff. Routes are only re-filtered in global view.
    /// Returns the clamped year.
    pub fn set_timeline_year(&mut self, year: i32) -> i32 {
        let year = self.config.timeline.clamp(year);
        self.view.timeline_year = year;
        if self.view.global {
            self.filter_by_timeline();
        }
        year
    }

    /// Filter sidebar rows. Map layers are left as they are.
    pub fn set_search(&mut self, query: &str) {
        self.sidebar.apply_search(&self.store.composers, query);
    }

    pub fn highlight_composer(&mut self, id: &str, on: bool) {
        let Some(layers) = self.layers.composer(id) else {
            return;
        };
        let style = &self.config.style;
        let (weight, radius) = if on {
            (style.route_hover_weight, style.marker_highlight_radius)
        } else {
            (style.route_weight, style.marker_radius)
        };
        for route in layers.drawn() {
            self.map.set_style(
                route.line,
                &PathStyle {
                    weight: Some(weight),
                    opacity: Some(1.0),
                    ..PathStyle::default()
                },
            );
            self.map.set_class(route.line, HIGHLIGHTED, on);
            if on {
                self.map.bring_to_front(route.line);
            }
            if let Some(marker) = route.marker {
                self.map.set_style(marker, &PathStyle::radius(radius));
            }
        }
    }

    /// Make `id` the single emphasized studio.
    pub fn activate_studio(&mut self, id: &str) {
        if let Some(previous) = self.view.active_studio.take() {
            if let Some(studio) = self.layers.studio(&previous) {
                self.map.set_style(
                    studio.ring,
                    &PathStyle::weight(self.config.style.studio_ring_weight),
                );
                self.map.set_class(studio.ring, ACTIVE, false);
            }
        }
        self.view.active_studio = Some(id.to_string());

        if let Some(studio) = self.layers.studio(id) {
            self.map.set_style(
                studio.ring,
                &PathStyle::weight(self.config.style.studio_active_ring_weight),
            );
            self.map.bring_to_front(studio.fill);
            self.map.bring_to_front(studio.ring);
            self.map.set_class(studio.ring, ACTIVE, true);
        }
    }

    /// Switch to the studios tab, activate the studio and fly to its center.
    /// Studios are drawn at a fixed pixel radius, so there is no extent to fit.
    pub fn open_studio(&mut self, id: &str) {
        self.set_tab(Tab::Studios);
        self.activate_studio(id);

        let Some(studio) = self.layers.studio(id) else {
            return;
        };
        let camera = &self.config.camera;
        let zoom = camera.focus_zoom.max(self.map.zoom()).min(self.map.max_zoom());
        self.map.fly_to(studio.center, zoom, camera.fly_duration_secs);
    }

    pub fn highlight_studio(&mut self, id: &str, on: bool) {
        if let Some(studio) = self.layers.studio(id) {
            self.map.set_class(studio.fill, HIGHLIGHTED, on);
            self.map.set_class(studio.ring, HIGHLIGHTED, on);
        }
    }

    /// Switching to the composers tab drops all studio emphasis.
    pub fn set_tab(&mut self, tab: Tab) {
        self.sidebar.tab = tab;
        if tab != Tab::Composers {
            return;
        }
        for (_, studio) in self.layers.studios() {
            self.map.set_style(
                studio.ring,
                &PathStyle::weight(self.config.style.studio_ring_weight),
            );
            for handle in [studio.ring, studio.fill] {
                self.map.set_class(handle, ACTIVE, false);
                self.map.set_class(handle, HIGHLIGHTED, false);
            }
        }
        self.view.active_studio = None;
    }

    pub fn handle_map_event(&mut self, event: MapEvent) {
        let (handle, kind) = match event {
            MapEvent::MoveEnd => {
                if let Some(handle) = self.pending_popup.take() {
                    self.map.bring_to_front(handle);
                    self.map.open_popup(handle);
                }
                return;
            }
            MapEvent::Primitive { handle, kind } => (handle, kind),
        };

        let Some(owner) = self.layers.owner(handle).cloned() else {
            return;
        };
        match (owner, kind) {
            (
                Owner::Route {
                    part: RoutePart::Line,
                    ..
                },
                MapEventKind::MouseOver | MapEventKind::MouseOut,
            ) => {
                let style = &self.config.style;
                let weight = if kind == MapEventKind::MouseOver {
                    style.route_hover_weight
                } else {
                    style.route_weight
                };
                self.map.set_style(handle, &PathStyle::weight(weight));
            }
            (Owner::Route { .. }, MapEventKind::PopupClose) => self.audio.popup_closed(),
            (
                Owner::Studio {
                    studio,
                    part: StudioPart::Ring,
                },
                kind,
            ) => match kind {
                MapEventKind::MouseOver => self.highlight_studio(&studio, true),
                MapEventKind::MouseOut => self.highlight_studio(&studio, false),
                MapEventKind::Click => self.open_studio(&studio),
                _ => {}
            },
            _ => {}
        }
    }

    /// Advance frame-paced work by one frame.
    pub fn tick(&mut self, now_ms: f64) {
        self.audio.tick(now_ms);
    }

    fn apply_baseline_style(&mut self, id: &str) {
        let Some(layers) = self.layers.composer(id) else {
            return;
        };
        for route in layers.drawn() {
            self.map.set_style(
                route.line,
                &PathStyle {
                    weight: Some(self.config.style.route_weight),
                    opacity: Some(1.0),
                    ..PathStyle::default()
                },
            );
            if let Some(marker) = route.marker {
                self.map.set_style(
                    marker,
                    &PathStyle {
                        opacity: Some(1.0),
                        fill_opacity: Some(1.0),
                        radius: Some(self.config.style.marker_radius),
                        ..PathStyle::default()
                    },
                );
            }
        }
    }

    fn filter_by_timeline(&mut self) {
        let cutoff = self.view.timeline_year;
        let undated = self.config.timeline.undated;
        for composer in &self.store.composers {
            for (index, route) in composer.routes.iter().enumerate() {
                let visible = passes_timeline(route, cutoff, undated);
                self.layers
                    .set_route_visibility(&mut self.map, &composer.id, index, visible);
            }
        }
    }

    fn fit_visible(&mut self) {
        let camera = &self.config.camera;
        match self.layers.visible_bounds().filter(Bounds::is_valid) {
            Some(bounds) => self.map.fit_bounds(bounds.pad(camera.global_padding)),
            None => self.map.set_view(camera.default_center(), camera.default_zoom),
        }
    }
}

fn passes_timeline(route: &Route, cutoff: i32, undated: UndatedRoutes) -> bool {
    match route.start_year() {
        Some(year) => year <= cutoff,
        None => undated == UndatedRoutes::Show,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::FakeSink;
    use crate::document::parse_document;
    use crate::geo::LatLng;
    use crate::surface::fake::{Camera, FakeMap};

    const DOC: &str = r#"{
        "studios": [
            {"id": "abbey", "name": "Abbey Road", "years": "1931-", "center": [-0.1782, 51.5320]},
            {"id": "sun", "name": "Sun Studio", "center": [-90.03, 35.14]}
        ],
        "composers": [
            {
                "id": "dvorak",
                "name": "Antonín Dvořák",
                "bio": "Czech composer",
                "routes": [
                    {"label": "to New York", "from": [14.42, 50.08], "to": [-74.0, 40.71], "years": "1892-1895"},
                    {"label": "Spillville summer", "from": [-74.0, 40.71], "to": [-91.95, 43.18]},
                    {"label": "Return to Prague", "from": [-74.0, 40.71], "to": [14.42, 50.08], "years": "1895"}
                ]
            },
            {
                "id": "handel",
                "name": "Handel",
                "routes": [
                    {"label": "Halle to London", "from": [11.97, 51.48], "to": [-0.13, 51.51], "years": "1712"},
                    {"label": "no geometry", "years": "1720"}
                ]
            }
        ]
    }"#;

    type TestAtlas = Atlas<FakeMap, FakeSink>;

    fn atlas_with(config: AtlasConfig) -> TestAtlas {
        let mut atlas = Atlas::new(FakeMap::new(), FakeSink::default(), config);
        atlas.load(parse_document(DOC).unwrap());
        atlas
    }

    fn atlas() -> TestAtlas {
        atlas_with(AtlasConfig::default())
    }

    fn visible(atlas: &TestAtlas, id: &str, index: usize) -> bool {
        let route = atlas.layers().route(id, index).unwrap();
        let line = atlas.map().get(route.line).visible;
        let marker = atlas.map().get(route.marker.unwrap()).visible;
        assert_eq!(line, marker, "line and marker visibility diverged");
        assert_eq!(line, route.visible);
        line
    }

    fn assert_single_mode(atlas: &TestAtlas) {
        let v = atlas.view();
        assert!(!(v.global && v.active_composer.is_some()));
    }

    #[test]
    fn test_load_starts_in_global_view() {
        let atlas = atlas();
        assert!(atlas.view().global);
        assert_eq!(atlas.view().timeline_year, 2000);
        assert!(visible(&atlas, "dvorak", 0));
        assert!(!visible(&atlas, "dvorak", 1), "undated route hidden by default");
        assert!(visible(&atlas, "handel", 0));
        assert!(matches!(atlas.map().last_camera(), Some(Camera::FitBounds(_))));
    }

    #[test]
    fn test_missing_endpoint_produces_fewer_pairs() {
        let atlas = atlas();
        assert_eq!(atlas.layers().composer("handel").unwrap().drawn().count(), 1);
        assert!(atlas.layers().route("handel", 1).is_none());
        // 4 drawn routes as line + marker, 2 studios as fill + ring
        assert_eq!(atlas.map().primitives.len(), 12);
    }

    #[test]
    fn test_global_and_focus_are_exclusive() {
        let mut atlas = atlas();
        assert_single_mode(&atlas);
        atlas.focus_composer("dvorak", CameraMove::Fit);
        assert_single_mode(&atlas);
        assert_eq!(atlas.view().active_composer.as_deref(), Some("dvorak"));
        atlas.focus_composer("handel", CameraMove::Fit);
        assert_single_mode(&atlas);
        assert_eq!(atlas.view().active_composer.as_deref(), Some("handel"));
        atlas.enter_global_view();
        assert_single_mode(&atlas);
        assert_eq!(atlas.view().active_composer, None);
        assert_eq!(atlas.view().last_selected.as_deref(), Some("handel"));
    }

    #[test]
    fn test_focus_shows_one_composer_unfiltered() {
        let mut atlas = atlas();
        atlas.set_timeline_year(1700);
        assert!(!visible(&atlas, "dvorak", 0));

        atlas.focus_composer("dvorak", CameraMove::Fit);
        assert!(visible(&atlas, "dvorak", 0));
        assert!(visible(&atlas, "dvorak", 1));
        assert!(visible(&atlas, "dvorak", 2));
        assert!(!visible(&atlas, "handel", 0));
        assert!(matches!(atlas.map().last_camera(), Some(Camera::FitBounds(_))));

        let line = atlas.layers().route("dvorak", 0).unwrap().line;
        assert_eq!(atlas.map().get(line).style.weight, Some(3.5));
    }

    #[test]
    fn test_timeline_ignored_in_focus_mode() {
        let mut atlas = atlas();
        atlas.focus_composer("dvorak", CameraMove::Suppress);
        assert_eq!(atlas.set_timeline_year(1600), 1600);
        assert!(visible(&atlas, "dvorak", 0));
    }

    #[test]
    fn test_reentering_global_view_resets_timeline() {
        let mut atlas = atlas();
        atlas.set_timeline_year(1800);
        assert!(!visible(&atlas, "dvorak", 2));
        assert!(visible(&atlas, "handel", 0));

        atlas.focus_composer("handel", CameraMove::Fit);
        atlas.enter_global_view();
        assert_eq!(atlas.view().timeline_year, 2000);
        assert!(visible(&atlas, "dvorak", 0));
        assert!(visible(&atlas, "dvorak", 2));
        assert!(visible(&atlas, "handel", 0));
        assert!(!visible(&atlas, "dvorak", 1));
    }

    #[test]
    fn test_timeline_clamps_and_filters_by_start_year() {
        let mut atlas = atlas();
        assert_eq!(atlas.set_timeline_year(1200), 1600);
        assert!(!visible(&atlas, "handel", 0));
        assert_eq!(atlas.set_timeline_year(1892), 1892);
        assert!(visible(&atlas, "dvorak", 0), "1892-1895 starts in 1892");
        assert!(!visible(&atlas, "dvorak", 2));
        assert_eq!(atlas.set_timeline_year(9999), 2000);
    }

    #[test]
    fn test_undated_routes_can_be_shown() {
        let mut config = AtlasConfig::default();
        config.timeline.undated = UndatedRoutes::Show;
        let mut atlas = atlas_with(config);
        atlas.set_timeline_year(1600);
        assert!(visible(&atlas, "dvorak", 1));
        assert!(!visible(&atlas, "dvorak", 0));
    }

    #[test]
    fn test_route_click_does_not_refocus_or_double_animate() {
        let mut atlas = atlas();
        atlas.dispatch(Intent::HeaderClick("dvorak".into()));
        let moves = atlas.map().camera.len();
        let restore = atlas.dispatch(Intent::RouteClick("dvorak".into(), 0));
        assert_eq!(atlas.view().active_composer.as_deref(), Some("dvorak"));
        assert_eq!(atlas.map().camera.len(), moves + 1);
        assert_eq!(
            restore,
            Some(RouteRestore {
                composer: "dvorak".into(),
                index: 0,
                delay_ms: 1400
            })
        );
    }

    #[test]
    fn test_focus_route_flies_then_opens_popup() {
        let mut atlas = atlas();
        let route = atlas.layers().route("dvorak", 0).unwrap().clone();
        atlas.focus_route("dvorak", 0).unwrap();

        assert_eq!(atlas.map().get(route.line).style.weight, Some(8.0));
        assert!(atlas.map().fronted.contains(&route.line));
        assert_eq!(
            atlas.map().last_camera(),
            Some(&Camera::FlyTo(LatLng::new(40.71, -74.0), 6.0))
        );
        assert!(atlas.map().opened_popups.is_empty());

        atlas.handle_map_event(MapEvent::MoveEnd);
        let marker = route.marker.unwrap();
        assert_eq!(atlas.map().opened_popups, vec![marker]);
        // a later move does not reopen it
        atlas.handle_map_event(MapEvent::MoveEnd);
        assert_eq!(atlas.map().opened_popups.len(), 1);

        atlas.restore_route("dvorak", 0);
        assert_eq!(atlas.map().get(route.line).style.weight, Some(3.5));
    }

    #[test]
    fn test_focus_route_without_marker_flies_to_line_bounds() {
        let mut config = AtlasConfig::default();
        config.style.route_markers = false;
        let mut atlas = atlas_with(config);
        let route = atlas.layers().route("dvorak", 0).unwrap().clone();
        assert!(route.marker.is_none());
        atlas.focus_route("dvorak", 0).unwrap();

        let expected = Bounds::from_points([route.from, route.to]).unwrap().pad(0.3);
        assert_eq!(atlas.map().last_camera(), Some(&Camera::FlyToBounds(expected)));
        atlas.handle_map_event(MapEvent::MoveEnd);
        assert_eq!(atlas.map().opened_popups, vec![route.line]);
    }

    #[test]
    fn test_duplicate_ids_keep_layer_count_stable() {
        let doc = r#"[
            {"name": "Anon A", "routes": [{"from": [0.0, 0.0], "to": [1.0, 1.0], "years": "1900"}]},
            {"name": "Anon B", "routes": [
                {"from": [2.0, 2.0], "to": [3.0, 3.0], "years": "1900"},
                {"from": [4.0, 4.0], "to": [5.0, 5.0], "years": "1900"}
            ]},
            {"id": "c", "name": "C", "routes": [{"from": [6.0, 6.0], "to": [7.0, 7.0], "years": "1900"}]}
        ]"#;
        let mut atlas: TestAtlas = Atlas::new(FakeMap::new(), FakeSink::default(), AtlasConfig::default());
        atlas.load(parse_document(doc).unwrap());
        for _ in 0..3 {
            atlas.focus_composer("c", CameraMove::Fit);
            atlas.enter_global_view();
            assert_eq!(atlas.map().primitives.len(), 4);
        }
        atlas.focus_composer("c", CameraMove::Fit);
        assert_eq!(atlas.map().primitives.len(), 4);
        assert_eq!(atlas.map().visible_count(), 2);
    }

    #[test]
    fn test_focus_route_keeps_closer_zoom_within_max() {
        let mut atlas = atlas();
        atlas.map.zoom = 14.0;
        atlas.focus_route("handel", 0);
        assert!(matches!(atlas.map().last_camera(), Some(Camera::FlyTo(_, z)) if *z == 12.0));
        atlas.map.zoom = 8.0;
        atlas.focus_route("handel", 0);
        assert!(matches!(atlas.map().last_camera(), Some(Camera::FlyTo(_, z)) if *z == 8.0));
    }

    #[test]
    fn test_focus_route_on_skipped_route_is_noop() {
        let mut atlas = atlas();
        let moves = atlas.map().camera.len();
        assert!(atlas.focus_route("handel", 1).is_none());
        assert!(atlas.focus_route("nobody", 0).is_none());
        assert_eq!(atlas.map().camera.len(), moves);
    }

    #[test]
    fn test_camera_suppressed_focus() {
        let mut atlas = atlas();
        let moves = atlas.map().camera.len();
        atlas.focus_composer("handel", CameraMove::Suppress);
        assert_eq!(atlas.map().camera.len(), moves);
    }

    #[test]
    fn test_empty_global_view_uses_default_view() {
        let mut atlas: TestAtlas = Atlas::new(FakeMap::new(), FakeSink::default(), AtlasConfig::default());
        atlas.load(EntityStore::default());
        assert_eq!(
            atlas.map().last_camera(),
            Some(&Camera::SetView(LatLng::new(-15.0, -60.0), 3.0))
        );
        atlas.leave_global_view();
        assert!(atlas.view().global);
    }

    #[test]
    fn test_leave_global_view_prefers_last_selected() {
        let mut atlas = atlas();
        atlas.leave_global_view();
        assert_eq!(atlas.view().active_composer.as_deref(), Some("dvorak"));
        atlas.focus_composer("handel", CameraMove::Fit);
        atlas.dispatch(Intent::ToggleGlobalView);
        assert!(atlas.view().global);
        atlas.dispatch(Intent::ToggleGlobalView);
        assert_eq!(atlas.view().active_composer.as_deref(), Some("handel"));
    }

    #[test]
    fn test_unknown_composer_focus_is_ignored() {
        let mut atlas = atlas();
        atlas.focus_composer("nobody", CameraMove::Fit);
        assert!(atlas.view().global);
    }

    #[test]
    fn test_search_filters_rows_but_not_layers() {
        let mut atlas = atlas();
        let before = atlas.map().visible_count();
        atlas.dispatch(Intent::Search("PRAGUE".into()));
        let rows = atlas.composer_rows();
        assert!(!rows[0].hidden);
        assert!(rows[1].hidden);
        assert_eq!(atlas.map().visible_count(), before);
        assert!(visible(&atlas, "handel", 0));
    }

    #[test]
    fn test_header_click_toggles_and_focuses_once() {
        let mut atlas = atlas();
        atlas.dispatch(Intent::HeaderClick("handel".into()));
        assert_eq!(atlas.sidebar().expanded.as_deref(), Some("handel"));
        assert!(!atlas.view().global);
        let moves = atlas.map().camera.len();

        atlas.dispatch(Intent::HeaderKey("handel".into(), Key::Enter));
        assert_eq!(atlas.sidebar().expanded, None);
        assert_eq!(atlas.map().camera.len(), moves, "collapsing does not move the camera");

        atlas.dispatch(Intent::HeaderKey("dvorak".into(), Key::Space));
        assert_eq!(atlas.view().active_composer.as_deref(), Some("dvorak"));
        atlas.dispatch(Intent::HeaderKey("dvorak".into(), Key::Escape));
        assert_eq!(atlas.sidebar().expanded, None);
        assert_eq!(atlas.view().active_composer.as_deref(), Some("dvorak"));

        atlas.dispatch(Intent::HeaderClick("handel".into()));
        atlas.dispatch(Intent::OutsideClick);
        assert_eq!(atlas.sidebar().expanded, None);
    }

    #[test]
    fn test_highlight_composer_round_trip() {
        let mut atlas = atlas();
        let route = atlas.layers().route("dvorak", 0).unwrap().clone();
        let marker = route.marker.unwrap();
        atlas.dispatch(Intent::HeaderHover("dvorak".into(), true));
        assert_eq!(atlas.map().get(route.line).style.weight, Some(6.0));
        assert!(atlas.map().get(route.line).classes.contains(HIGHLIGHTED));
        assert_eq!(atlas.map().get(marker).style.radius, Some(9.0));

        atlas.dispatch(Intent::HeaderHover("dvorak".into(), false));
        assert_eq!(atlas.map().get(route.line).style.weight, Some(3.5));
        assert!(atlas.map().get(route.line).classes.is_empty());
        assert_eq!(atlas.map().get(marker).style.radius, Some(6.0));
    }

    #[test]
    fn test_route_line_hover_from_map() {
        let mut atlas = atlas();
        let line = atlas.layers().route("handel", 0).unwrap().line;
        atlas.handle_map_event(MapEvent::Primitive {
            handle: line,
            kind: MapEventKind::MouseOver,
        });
        assert_eq!(atlas.map().get(line).style.weight, Some(6.0));
        atlas.handle_map_event(MapEvent::Primitive {
            handle: line,
            kind: MapEventKind::MouseOut,
        });
        assert_eq!(atlas.map().get(line).style.weight, Some(3.5));
    }

    #[test]
    fn test_only_one_studio_active() {
        let mut atlas = atlas();
        let abbey = atlas.layers().studio("abbey").unwrap().clone();
        let sun = atlas.layers().studio("sun").unwrap().clone();

        atlas.activate_studio("abbey");
        atlas.activate_studio("sun");
        assert_eq!(atlas.view().active_studio.as_deref(), Some("sun"));
        assert_eq!(atlas.map().get(abbey.ring).style.weight, Some(4.0));
        assert!(!atlas.map().get(abbey.ring).classes.contains(ACTIVE));
        assert_eq!(atlas.map().get(sun.ring).style.weight, Some(6.0));
        assert!(atlas.map().get(sun.ring).classes.contains(ACTIVE));

        let rows = atlas.studio_rows();
        assert!(!rows[0].active && rows[1].active);
    }

    #[test]
    fn test_ring_click_opens_studio() {
        let mut atlas = atlas();
        let abbey = atlas.layers().studio("abbey").unwrap().clone();
        atlas.handle_map_event(MapEvent::Primitive {
            handle: abbey.ring,
            kind: MapEventKind::Click,
        });
        assert_eq!(atlas.sidebar().tab, Tab::Studios);
        assert_eq!(atlas.view().active_studio.as_deref(), Some("abbey"));
        assert_eq!(
            atlas.map().last_camera(),
            Some(&Camera::FlyTo(abbey.center, 6.0))
        );
        assert!(atlas.map().fronted.ends_with(&[abbey.fill, abbey.ring]));
    }

    #[test]
    fn test_open_studio_zoom_stays_within_max() {
        let mut atlas = atlas();
        let sun = atlas.layers().studio("sun").unwrap().center;
        atlas.map.zoom = 9.0;
        atlas.open_studio("sun");
        assert_eq!(atlas.map().last_camera(), Some(&Camera::FlyTo(sun, 9.0)));
        atlas.map.zoom = 15.0;
        atlas.open_studio("sun");
        assert_eq!(atlas.map().last_camera(), Some(&Camera::FlyTo(sun, 12.0)));
    }

    #[test]
    fn test_composers_tab_resets_studios() {
        let mut atlas = atlas();
        let abbey = atlas.layers().studio("abbey").unwrap().clone();
        atlas.dispatch(Intent::StudioClick("abbey".into()));
        atlas.dispatch(Intent::StudioHover("abbey".into(), true));
        assert!(atlas.map().get(abbey.fill).classes.contains(HIGHLIGHTED));

        atlas.dispatch(Intent::SelectTab(Tab::Composers));
        assert_eq!(atlas.view().active_studio, None);
        assert_eq!(atlas.map().get(abbey.ring).style.weight, Some(4.0));
        assert!(atlas.map().get(abbey.ring).classes.is_empty());
        assert!(atlas.map().get(abbey.fill).classes.is_empty());
    }

    #[test]
    fn test_popup_close_resumes_background() {
        let mut atlas = atlas();
        let marker = atlas.layers().route("dvorak", 0).unwrap().marker.unwrap();
        atlas.handle_map_event(MapEvent::Primitive {
            handle: marker,
            kind: MapEventKind::PopupClose,
        });
        assert!(atlas.audio().is_busy());
        let mut now = 0.0;
        while atlas.audio().is_busy() {
            now += 16.0;
            atlas.tick(now);
        }
        assert!((atlas.audio().background().volume - 0.4).abs() < 1e-9);
    }
}
