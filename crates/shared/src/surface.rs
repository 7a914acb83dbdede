//! The map capability the atlas draws onto.
//!
//! The controller never talks to a rendering engine directly: it draws
//! primitives, restyles them and moves the camera through [`MapSurface`].
//! Interaction comes back the other way as [`MapEvent`]s, keyed by the
//! handle the surface issued at draw time.

use crate::geo::{Bounds, LatLng};

/// Opaque identifier of a drawn primitive, issued by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

/// Partial path style. `None` fields leave the current value untouched, so
/// the same type serves for drawing and for restyling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStyle {
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub radius: Option<f64>,
    pub dash_array: Option<String>,
    pub class_name: Option<String>,
    pub interactive: Option<bool>,
}

impl PathStyle {
    pub fn weight(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    pub fn radius(radius: f64) -> Self {
        Self {
            radius: Some(radius),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    MouseOver,
    MouseOut,
    Click,
    PopupOpen,
    PopupClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// Something happened on a drawn primitive.
    Primitive { handle: Handle, kind: MapEventKind },
    /// A camera transition finished.
    MoveEnd,
}

pub trait MapSurface {
    /// Draw a polyline through `points`; visible immediately.
    fn draw_line(&mut self, points: &[LatLng], style: &PathStyle) -> Handle;
    /// Draw a fixed-pixel-radius point marker.
    fn draw_point(&mut self, at: LatLng, style: &PathStyle) -> Handle;
    /// Draw a circular region of `radius` pixels around `at`.
    fn draw_region(&mut self, at: LatLng, radius: f64, style: &PathStyle) -> Handle;

    fn set_style(&mut self, handle: Handle, style: &PathStyle);
    fn set_class(&mut self, handle: Handle, class: &str, on: bool);
    fn bring_to_front(&mut self, handle: Handle);

    /// Re-add a hidden primitive to the map.
    fn show(&mut self, handle: Handle);
    /// Take a primitive off the map while keeping it alive.
    fn hide(&mut self, handle: Handle);
    /// Remove a primitive for good; the handle is dead afterwards.
    fn destroy(&mut self, handle: Handle);

    fn bind_popup(&mut self, handle: Handle, html: &str);
    fn open_popup(&mut self, handle: Handle);

    /// Ask for `kinds` events on `handle` to be reported as [`MapEvent`]s.
    fn listen(&mut self, handle: Handle, kinds: &[MapEventKind]);

    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_secs: f64);
    fn fly_to_bounds(&mut self, bounds: Bounds, duration_secs: f64);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn zoom(&self) -> f64;
    fn max_zoom(&self) -> f64;
}
