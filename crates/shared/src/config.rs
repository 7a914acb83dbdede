use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Route colors, assigned by a composer's position in the loaded list.
pub const DEFAULT_PALETTE: [&str; 20] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#e6beff", "#9a6324", "#fffac8", "#800000", "#aaffc3",
    "#808000", "#ffd8b1", "#000075", "#808080",
];

/// Application settings. Every field has a default, so a partial JSON object
/// (or none at all) is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasConfig {
    pub data_url: String,
    pub palette: Vec<String>,
    pub timeline: TimelineConfig,
    pub camera: CameraConfig,
    pub style: StyleConfig,
    pub audio: AudioConfig,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_url: "data/composers.json".to_string(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            timeline: TimelineConfig::default(),
            camera: CameraConfig::default(),
            style: StyleConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// What the timeline filter does with routes whose years field has no
/// four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UndatedRoutes {
    Hide,
    Show,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    pub min_year: i32,
    pub max_year: i32,
    pub undated: UndatedRoutes,
    /// Slider thumb width in CSS pixels, used to place the year indicator.
    pub thumb_width_px: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_year: 1600,
            max_year: 2000,
            undated: UndatedRoutes::Hide,
            thumb_width_px: 18.0,
        }
    }
}

impl TimelineConfig {
    /// Earliest and latest selectable year, in order even when the
    /// configured bounds are swapped.
    pub fn range(&self) -> (i32, i32) {
        (
            self.min_year.min(self.max_year),
            self.min_year.max(self.max_year),
        )
    }

    pub fn latest(&self) -> i32 {
        self.range().1
    }

    pub fn clamp(&self, year: i32) -> i32 {
        let (lo, hi) = self.range();
        year.clamp(lo, hi)
    }

    /// Horizontal offset of the year indicator above the slider thumb.
    pub fn indicator_offset(&self, year: i32, slider_width: f64) -> f64 {
        let (lo, hi) = self.range();
        let span = (hi - lo) as f64;
        let percent = if span > 0.0 {
            (self.clamp(year) - lo) as f64 / span
        } else {
            0.0
        };
        percent * (slider_width - self.thumb_width_px) + self.thumb_width_px / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub default_center: [f64; 2],
    pub default_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Lowest zoom used when flying to a single route or studio.
    pub focus_zoom: f64,
    pub fly_duration_secs: f64,
    pub global_padding: f64,
    pub composer_padding: f64,
    pub route_padding: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_center: [-15.0, -60.0],
            default_zoom: 3.0,
            min_zoom: 2.0,
            max_zoom: 12.0,
            focus_zoom: 6.0,
            fly_duration_secs: 1.0,
            global_padding: 0.25,
            composer_padding: 0.3,
            route_padding: 0.3,
        }
    }
}

impl CameraConfig {
    pub fn default_center(&self) -> LatLng {
        LatLng::new(self.default_center[0], self.default_center[1])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub route_weight: f64,
    pub route_hover_weight: f64,
    pub route_focus_weight: f64,
    /// Delay before a focused route drops back to its normal weight.
    pub route_focus_ms: u32,
    /// Draw a point marker at each route's destination.
    pub route_markers: bool,
    pub marker_draw_radius: f64,
    pub marker_radius: f64,
    pub marker_highlight_radius: f64,
    pub studio_radius: f64,
    pub studio_ring_weight: f64,
    pub studio_active_ring_weight: f64,
    pub studio_stroke: String,
    pub studio_fill: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            route_weight: 3.5,
            route_hover_weight: 6.0,
            route_focus_weight: 8.0,
            route_focus_ms: 1400,
            route_markers: true,
            marker_draw_radius: 5.0,
            marker_radius: 6.0,
            marker_highlight_radius: 9.0,
            studio_radius: 24.0,
            studio_ring_weight: 4.0,
            studio_active_ring_weight: 6.0,
            studio_stroke: "#0f172a".to_string(),
            studio_fill: "rgba(99,102,241,0.25)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConfig {
    /// Looping background track.
    pub background_url: String,
    /// Background volume when playback first starts.
    pub start_volume: f64,
    /// Background volume reached by a fade-in after a clip.
    pub resume_volume: f64,
    pub fade_ms: u32,
    pub resume_delay_ms: u32,
    pub frame_ms: u32,
    /// Seek back to the start once this close to the end of the track.
    pub loop_guard_secs: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            background_url: "data/audio/background.mp3".to_string(),
            start_volume: 0.3,
            resume_volume: 0.4,
            fade_ms: 220,
            resume_delay_ms: 80,
            frame_ms: 16,
            loop_guard_secs: 0.12,
        }
    }
}

impl AudioConfig {
    /// Frames a fade of `ms` milliseconds is spread over.
    pub fn fade_steps(&self, ms: u32) -> u32 {
        (ms / self.frame_ms.max(1)).max(1)
    }
}
