//! Small browser helpers: scoped event listeners, frames and timing.

use futures::channel::oneshot;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::EventTarget;

/// An event listener that is removed again when dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        if let Err(err) =
            target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        {
            tracing::warn!(event, ?err, "Failed to add event listener");
        }
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }

    /// Whether the target is still part of the document.
    pub fn is_connected(&self) -> bool {
        self.target
            .dyn_ref::<web_sys::Node>()
            .map_or(true, web_sys::Node::is_connected)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Milliseconds on the page's monotonic clock.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now())
}

/// Resolve on the next animation frame.
pub async fn next_frame() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let (tx, rx) = oneshot::channel::<()>();
    let callback = Closure::once(move || {
        let _ = tx.send(());
    });
    if window
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    let _ = rx.await;
}

/// Poll every 50 ms until `ready` holds, giving up after `attempts` tries.
pub async fn wait_until(mut ready: impl FnMut() -> bool, attempts: u32) -> bool {
    for _ in 0..attempts {
        if ready() {
            return true;
        }
        TimeoutFuture::new(50).await;
    }
    ready()
}

/// Whether a global (such as a script-loaded library) is defined.
pub fn has_global(name: &str) -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str(name)).unwrap_or(false)
}

pub fn element_exists(id: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .is_some()
}

/// Rendered width of an element, 0 when it is not mounted.
pub fn element_width(id: &str) -> f64 {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .map_or(0.0, |el| el.get_bounding_client_rect().width())
}
