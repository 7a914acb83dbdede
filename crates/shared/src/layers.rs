use std::collections::HashMap;

use crate::config::{StyleConfig, DEFAULT_PALETTE};
use crate::geo::{Bounds, LatLng};
use crate::models::{Composer, Studio};
use crate::popup;
use crate::surface::{Handle, MapEventKind, MapSurface, PathStyle};

/// Dash pattern of the animated route lines.
const ROUTE_DASH: &str = "10 14";
const ROUTE_CLASS: &str = "route-flow";

/// Line and destination marker drawn for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLayer {
    pub line: Handle,
    pub marker: Option<Handle>,
    pub from: LatLng,
    pub to: LatLng,
    pub visible: bool,
}

impl RouteLayer {
    fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        std::iter::once(self.line).chain(self.marker)
    }
}

/// Everything drawn for one composer. `routes` is index-aligned with the
/// composer's routes; skipped routes leave a `None` slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerLayers {
    pub color: String,
    pub routes: Vec<Option<RouteLayer>>,
}

impl ComposerLayers {
    pub fn drawn(&self) -> impl Iterator<Item = &RouteLayer> {
        self.routes.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioLayers {
    pub fill: Handle,
    pub ring: Handle,
    pub center: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePart {
    Line,
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioPart {
    Fill,
    Ring,
}

/// What a drawn primitive belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Route {
        composer: String,
        index: usize,
        part: RoutePart,
    },
    Studio {
        studio: String,
        part: StudioPart,
    },
}

/// Map primitives per entity id, with their visibility.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    composers: HashMap<String, ComposerLayers>,
    studios: HashMap<String, StudioLayers>,
    owners: HashMap<Handle, Owner>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy every composer primitive and draw all composers again from
    /// scratch, coloring each by its list position. Only the first composer
    /// with a given id is drawn.
    pub fn rebuild_composer_layers<M: MapSurface>(
        &mut self,
        map: &mut M,
        composers: &[Composer],
        palette: &[String],
        style: &StyleConfig,
    ) {
        for layers in std::mem::take(&mut self.composers).into_values() {
            for route in layers.drawn() {
                for handle in route.handles() {
                    self.owners.remove(&handle);
                    map.destroy(handle);
                }
            }
        }

        for (idx, composer) in composers.iter().enumerate() {
            if self.composers.contains_key(&composer.id) {
                tracing::warn!(composer = %composer.id, "Skipping composer with a duplicate id");
                continue;
            }
            let color = palette_color(palette, idx);
            let routes = composer
                .routes
                .iter()
                .enumerate()
                .map(|(route_idx, _)| self.draw_route(map, composer, route_idx, &color, style))
                .collect();
            self.composers
                .insert(composer.id.clone(), ComposerLayers { color, routes });
        }
    }

    fn draw_route<M: MapSurface>(
        &mut self,
        map: &mut M,
        composer: &Composer,
        route_idx: usize,
        color: &str,
        style: &StyleConfig,
    ) -> Option<RouteLayer> {
        let route = &composer.routes[route_idx];
        let (Some(from), Some(to)) = (route.source(), route.destination()) else {
            tracing::debug!(
                composer = %composer.id,
                route = route_idx,
                "Skipping route without both endpoints"
            );
            return None;
        };

        let line = map.draw_line(
            &[from, to],
            &PathStyle {
                color: Some(color.to_string()),
                weight: Some(style.route_weight),
                opacity: Some(1.0),
                dash_array: Some(ROUTE_DASH.to_string()),
                class_name: Some(ROUTE_CLASS.to_string()),
                ..PathStyle::default()
            },
        );
        let marker = style.route_markers.then(|| {
            map.draw_point(
                to,
                &PathStyle {
                    color: Some(color.to_string()),
                    fill_color: Some(color.to_string()),
                    fill_opacity: Some(1.0),
                    radius: Some(style.marker_draw_radius),
                    weight: Some(1.0),
                    ..PathStyle::default()
                },
            )
        });

        let html = popup::route_popup_html(composer, route, route.resolve_clip(&composer.clips), color);
        map.bind_popup(line, &html);
        map.listen(
            line,
            &[
                MapEventKind::MouseOver,
                MapEventKind::MouseOut,
                MapEventKind::PopupOpen,
                MapEventKind::PopupClose,
            ],
        );
        if let Some(marker) = marker {
            map.bind_popup(marker, &html);
            map.listen(marker, &[MapEventKind::PopupOpen, MapEventKind::PopupClose]);
        }

        let parts = std::iter::once((line, RoutePart::Line))
            .chain(marker.map(|m| (m, RoutePart::Marker)));
        for (handle, part) in parts {
            self.owners.insert(
                handle,
                Owner::Route {
                    composer: composer.id.clone(),
                    index: route_idx,
                    part,
                },
            );
        }

        Some(RouteLayer {
            line,
            marker,
            from,
            to,
            visible: true,
        })
    }

    /// Destroy every studio primitive and draw a disc plus ring per studio
    /// that has a usable center. Only the first studio with a given id is
    /// drawn.
    pub fn rebuild_studio_layers<M: MapSurface>(
        &mut self,
        map: &mut M,
        studios: &[Studio],
        style: &StyleConfig,
    ) {
        for layers in std::mem::take(&mut self.studios).into_values() {
            for handle in [layers.fill, layers.ring] {
                self.owners.remove(&handle);
                map.destroy(handle);
            }
        }

        for studio in studios {
            if self.studios.contains_key(&studio.id) {
                tracing::warn!(studio = %studio.id, "Skipping studio with a duplicate id");
                continue;
            }
            let Some(center) = studio.center() else {
                tracing::debug!(studio = %studio.id, "Skipping studio without a center");
                continue;
            };

            let fill = map.draw_region(
                center,
                style.studio_radius,
                &PathStyle {
                    color: Some(style.studio_stroke.clone()),
                    weight: Some(0.0),
                    fill_color: Some(style.studio_fill.clone()),
                    fill_opacity: Some(0.25),
                    class_name: Some("studio-circle".to_string()),
                    interactive: Some(false),
                    ..PathStyle::default()
                },
            );
            let ring = map.draw_region(
                center,
                style.studio_radius,
                &PathStyle {
                    color: Some(style.studio_stroke.clone()),
                    weight: Some(style.studio_ring_weight),
                    fill_opacity: Some(0.0),
                    class_name: Some("studio-ring".to_string()),
                    interactive: Some(true),
                    ..PathStyle::default()
                },
            );
            map.listen(
                ring,
                &[MapEventKind::MouseOver, MapEventKind::MouseOut, MapEventKind::Click],
            );

            self.owners.insert(
                fill,
                Owner::Studio {
                    studio: studio.id.clone(),
                    part: StudioPart::Fill,
                },
            );
            self.owners.insert(
                ring,
                Owner::Studio {
                    studio: studio.id.clone(),
                    part: StudioPart::Ring,
                },
            );
            self.studios
                .insert(studio.id.clone(), StudioLayers { fill, ring, center });
        }
    }

    /// Show or hide all of a composer's routes. Already-matching routes are
    /// left alone.
    pub fn set_composer_visibility<M: MapSurface>(&mut self, map: &mut M, id: &str, visible: bool) {
        let Some(layers) = self.composers.get_mut(id) else {
            return;
        };
        for route in layers.routes.iter_mut().flatten() {
            apply_visibility(map, route, visible);
        }
    }

    /// Show or hide one route's line and marker.
    pub fn set_route_visibility<M: MapSurface>(
        &mut self,
        map: &mut M,
        id: &str,
        route_index: usize,
        visible: bool,
    ) {
        if let Some(route) = self
            .composers
            .get_mut(id)
            .and_then(|l| l.routes.get_mut(route_index))
            .and_then(Option::as_mut)
        {
            apply_visibility(map, route, visible);
        }
    }

    pub fn composer(&self, id: &str) -> Option<&ComposerLayers> {
        self.composers.get(id)
    }

    pub fn composer_ids(&self) -> impl Iterator<Item = &str> {
        self.composers.keys().map(String::as_str)
    }

    pub fn route(&self, id: &str, route_index: usize) -> Option<&RouteLayer> {
        self.composers.get(id)?.routes.get(route_index)?.as_ref()
    }

    pub fn studio(&self, id: &str) -> Option<&StudioLayers> {
        self.studios.get(id)
    }

    pub fn studios(&self) -> impl Iterator<Item = (&str, &StudioLayers)> {
        self.studios.iter().map(|(id, l)| (id.as_str(), l))
    }

    pub fn owner(&self, handle: Handle) -> Option<&Owner> {
        self.owners.get(&handle)
    }

    /// Bounds of everything drawn for one composer, visible or not.
    pub fn composer_bounds(&self, id: &str) -> Option<Bounds> {
        let layers = self.composers.get(id)?;
        Bounds::from_points(layers.drawn().flat_map(|r| [r.from, r.to]))
    }

    /// Bounds of every composer route currently on the map.
    pub fn visible_bounds(&self) -> Option<Bounds> {
        Bounds::from_points(
            self.composers
                .values()
                .flat_map(ComposerLayers::drawn)
                .filter(|r| r.visible)
                .flat_map(|r| [r.from, r.to]),
        )
    }

    pub fn route_bounds(&self, id: &str, route_index: usize) -> Option<Bounds> {
        let route = self.route(id, route_index)?;
        Bounds::from_points([route.from, route.to])
    }
}

fn apply_visibility<M: MapSurface>(map: &mut M, route: &mut RouteLayer, visible: bool) {
    if route.visible == visible {
        return;
    }
    for handle in route.handles() {
        if visible {
            map.show(handle);
        } else {
            map.hide(handle);
        }
    }
    route.visible = visible;
}

/// Color for the composer at `index` in the loaded list.
pub fn palette_color(palette: &[String], index: usize) -> String {
    if palette.is_empty() {
        DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()].to_string()
    } else {
        palette[index % palette.len()].clone()
    }
}
