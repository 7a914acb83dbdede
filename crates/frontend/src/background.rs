//! The page's audio elements: the looping background track and the clip
//! players inside route popups.

use atlas_shared::audio::{AudioSink, ClipId, PlaybackRejected};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

use crate::dom::Listener;

pub const BACKGROUND_ID: &str = "bg-music";
const CLIP_SELECTOR: &str = ".leaflet-popup-content .composer-popup audio";
const CLIP_ATTR: &str = "data-clip-id";

/// The `<audio>` element that carries background music. A page without one
/// behaves as a silent, always-paused track.
pub struct BackgroundTrack {
    element: Option<HtmlAudioElement>,
}

impl BackgroundTrack {
    pub fn find(id: &str) -> Self {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlAudioElement>().ok());
        match &element {
            Some(el) => {
                el.set_loop(true);
                el.set_preload("auto");
            }
            None => tracing::warn!(id, "Background audio element not found"),
        }
        Self { element }
    }

    pub fn element(&self) -> Option<&HtmlAudioElement> {
        self.element.as_ref()
    }
}

impl AudioSink for BackgroundTrack {
    fn volume(&self) -> f64 {
        self.element.as_ref().map_or(0.0, |el| el.volume())
    }

    fn set_volume(&mut self, volume: f64) {
        if let Some(el) = &self.element {
            el.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    fn play(&mut self) -> Result<(), PlaybackRejected> {
        let el = self.element.as_ref().ok_or(PlaybackRejected)?;
        let promise = el.play().map_err(|_| PlaybackRejected)?;
        // Autoplay refusals surface asynchronously; they are not fatal.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                tracing::debug!(?err, "Background playback was refused");
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(el) = &self.element {
            let _ = el.pause();
        }
    }

    fn is_paused(&self) -> bool {
        self.element.as_ref().map_or(true, |el| el.paused())
    }

    fn current_time(&self) -> f64 {
        self.element.as_ref().map_or(0.0, |el| el.current_time())
    }

    fn duration(&self) -> f64 {
        self.element.as_ref().map_or(f64::NAN, |el| el.duration())
    }

    fn seek(&mut self, secs: f64) {
        if let Some(el) = &self.element {
            el.set_current_time(secs);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEvent {
    Started(ClipId),
    Stopped(ClipId),
}

/// Tracks the clip players found in opened popups.
#[derive(Default)]
pub struct ClipPlayers {
    next: u32,
    listeners: Vec<Listener>,
}

impl ClipPlayers {
    /// Attach play/pause/ended reporting to every clip player in the open
    /// popup that has not been seen yet. Returns how many were wired.
    pub fn wire(&mut self, report: impl Fn(ClipEvent) + Clone + 'static) -> usize {
        self.listeners.retain(Listener::is_connected);

        let Some(nodes) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.query_selector_all(CLIP_SELECTOR).ok())
        else {
            return 0;
        };

        let mut wired = 0;
        for i in 0..nodes.length() {
            let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            if el.has_attribute(CLIP_ATTR) {
                continue;
            }
            let id = ClipId(self.next);
            self.next += 1;
            let _ = el.set_attribute(CLIP_ATTR, &id.0.to_string());

            for (event, started) in [("play", true), ("pause", false), ("ended", false)] {
                let report = report.clone();
                self.listeners.push(Listener::new(&el, event, move |_| {
                    report(if started {
                        ClipEvent::Started(id)
                    } else {
                        ClipEvent::Stopped(id)
                    })
                }));
            }
            wired += 1;
        }
        if wired > 0 {
            tracing::debug!(wired, "Wired popup clip players");
        }
        wired
    }
}
