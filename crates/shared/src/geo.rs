use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Route;

/// Fallback city text when a route carries neither a city nor a usable label.
pub const CITY_PLACEHOLDER: &str = "Location";

/// A capitalized phrase of up to 61 characters after a standalone "in", "at"
/// or "to". Word characters are ASCII only, plus the `À`–`ú` range.
static CITY_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])(?:in|at|to)\s+([A-Z][A-Za-z0-9_\x{C0}-\x{FA}.\- ]{1,60})")
        .expect("city phrase pattern is valid")
});

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]{4}").expect("year pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Result of [`normalize_coordinate`]. Inputs that are not a `[lng, lat]`
/// pair come back untouched, so callers must check before drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinate {
    LatLng(LatLng),
    Unchanged(Value),
}

impl Coordinate {
    /// The converted point, if conversion happened and produced finite numbers.
    pub fn lat_lng(&self) -> Option<LatLng> {
        match self {
            Coordinate::LatLng(p) if p.is_finite() => Some(*p),
            _ => None,
        }
    }
}

/// Convert a document coordinate from `[longitude, latitude]` order to
/// latitude-first. Non-array or short input is passed through unchanged.
pub fn normalize_coordinate(raw: &Value) -> Coordinate {
    match raw {
        Value::Array(items) if items.len() >= 2 => {
            let lng = loose_number(&items[0]);
            let lat = loose_number(&items[1]);
            Coordinate::LatLng(LatLng::new(lat, lng))
        }
        other => Coordinate::Unchanged(other.clone()),
    }
}

/// Numeric reading of a JSON scalar: numbers as-is, numeric strings parsed
/// (blank strings read as zero), booleans as 0/1. Anything else is NaN.
pub fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

/// Axis-aligned lat/lng bounds used for camera fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn point(p: LatLng) -> Self {
        Self {
            south: p.lat,
            west: p.lng,
            north: p.lat,
            east: p.lng,
        }
    }

    /// Bounds enclosing every finite point, or `None` when there are none.
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for p in points.into_iter().filter(LatLng::is_finite) {
            match bounds.as_mut() {
                Some(b) => b.extend(p),
                None => bounds = Some(Bounds::point(p)),
            }
        }
        bounds
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    /// Grow each side by `ratio` of the current span.
    pub fn pad(&self, ratio: f64) -> Self {
        let dh = (self.north - self.south).abs() * ratio;
        let dw = (self.east - self.west).abs() * ratio;
        Self {
            south: self.south - dh,
            west: self.west - dw,
            north: self.north + dh,
            east: self.east + dw,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && self.west <= self.east
    }

    /// True when the bounds collapse to a single point.
    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// City shown for a route: the explicit `city` when non-blank, otherwise a
/// best guess from the label.
pub fn city_for_route(route: &Route) -> String {
    match route.city.as_deref().map(str::trim) {
        Some(city) if !city.is_empty() => city.to_string(),
        _ => extract_city_from_label(&route.label),
    }
}

/// Guess a city name from a free-text route label.
///
/// Precedence:
/// 1. empty label → [`CITY_PLACEHOLDER`];
/// 2. the first capitalized phrase following a standalone "in", "at" or "to";
/// 3. the label up to its first comma, hyphen, en-dash or em-dash;
/// 4. [`CITY_PLACEHOLDER`] if that segment is blank.
pub fn extract_city_from_label(label: &str) -> String {
    if label.is_empty() {
        return CITY_PLACEHOLDER.to_string();
    }
    if let Some(phrase) = CITY_PHRASE.captures(label).and_then(|c| c.get(1)) {
        let phrase = phrase.as_str().trim();
        if !phrase.is_empty() {
            return phrase.to_string();
        }
    }
    let first = label
        .split([',', '-', '\u{2013}', '\u{2014}'])
        .next()
        .unwrap_or_default()
        .trim();
    if first.is_empty() {
        CITY_PLACEHOLDER.to_string()
    } else {
        first.to_string()
    }
}

/// First four-digit run in a free-text years field ("1966-1969" → 1966).
pub fn start_year(years: &str) -> Option<i32> {
    YEAR.find(years).and_then(|m| m.as_str().parse().ok())
}
