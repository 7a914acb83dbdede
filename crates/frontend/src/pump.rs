//! The event loop that owns the [`Atlas`].
//!
//! Sidebar intents arrive through the page coroutine. Map, clip, gesture
//! and timer events come in on an internal channel. Both are merged into one
//! stream and applied in order, and the rendered snapshot is refreshed after
//! each event that can change it.

use std::rc::Rc;

use atlas_shared::config::AtlasConfig;
use atlas_shared::sidebar::{ComposerRow, Intent, StudioRow, Tab};
use atlas_shared::surface::{MapEvent, MapEventKind, MapSurface};
use atlas_shared::view::{Atlas, RouteRestore};
use dioxus::prelude::*;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;

use crate::api;
use crate::background::{BackgroundTrack, ClipEvent, ClipPlayers, BACKGROUND_ID};
use crate::dom::{self, Listener};
use crate::leaflet::Leaflet;

pub const MAP_CONTAINER_ID: &str = "map";
const LEAFLET_WAIT_ATTEMPTS: u32 = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Everything the sidebar and controls render from.
#[derive(Debug, Clone, PartialEq)]
pub struct UiSnapshot {
    pub composers: Vec<ComposerRow>,
    pub studios: Vec<StudioRow>,
    pub tab: Tab,
    pub query: String,
    pub global: bool,
    pub year: i32,
}

impl UiSnapshot {
    pub fn initial(config: &AtlasConfig) -> Self {
        Self {
            composers: Vec::new(),
            studios: Vec::new(),
            tab: Tab::default(),
            query: String::new(),
            global: true,
            year: config.timeline.latest(),
        }
    }

    fn capture<M: MapSurface>(atlas: &Atlas<M, BackgroundTrack>) -> Self {
        Self {
            composers: atlas.composer_rows(),
            studios: atlas.studio_rows(),
            tab: atlas.sidebar().tab,
            query: atlas.sidebar().query.clone(),
            global: atlas.view().global,
            year: atlas.view().timeline_year,
        }
    }
}

enum AppEvent {
    Intent(Intent),
    Map(MapEvent),
    Clip(ClipEvent),
    Gesture,
    TimeUpdate,
    Frame,
    RestoreRoute(RouteRestore),
}

fn send(tx: &UnboundedSender<AppEvent>, event: AppEvent) {
    // The receiver only goes away with the page.
    let _ = tx.unbounded_send(event);
}

fn schedule_restore(tx: &UnboundedSender<AppEvent>, restore: RouteRestore) {
    let tx = tx.clone();
    wasm_bindgen_futures::spawn_local(async move {
        TimeoutFuture::new(restore.delay_ms).await;
        send(&tx, AppEvent::RestoreRoute(restore));
    });
}

fn schedule_frame(tx: &UnboundedSender<AppEvent>) {
    let tx = tx.clone();
    wasm_bindgen_futures::spawn_local(async move {
        dom::next_frame().await;
        send(&tx, AppEvent::Frame);
    });
}

/// Window listeners that count as the first user gesture.
fn gesture_listeners(tx: &UnboundedSender<AppEvent>) -> Vec<Listener> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    ["click", "keydown", "touchstart"]
        .into_iter()
        .map(|event| {
            let tx = tx.clone();
            Listener::new(&window, event, move |_| send(&tx, AppEvent::Gesture))
        })
        .collect()
}

fn time_update_listener(
    background: &BackgroundTrack,
    tx: &UnboundedSender<AppEvent>,
) -> Option<Listener> {
    let tx = tx.clone();
    background
        .element()
        .map(|el| Listener::new(el, "timeupdate", move |_| send(&tx, AppEvent::TimeUpdate)))
}

/// Load the document, bring up the map and run until the page goes away.
pub async fn run(
    intents: UnboundedReceiver<Intent>,
    mut snapshot: Signal<UiSnapshot>,
    mut load_state: Signal<LoadState>,
    config: AtlasConfig,
) {
    let store = match api::fetch_document(&config.data_url).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(%err, "Failed to load atlas document");
            load_state.set(LoadState::Failed(err));
            return;
        }
    };

    let ready = dom::wait_until(
        || dom::has_global("L") && dom::element_exists(MAP_CONTAINER_ID),
        LEAFLET_WAIT_ATTEMPTS,
    )
    .await;
    if !ready {
        tracing::error!("Leaflet did not load");
        load_state.set(LoadState::Failed("the map library did not load".to_string()));
        return;
    }

    let (tx, rx) = mpsc::unbounded::<AppEvent>();
    let map_tx = tx.clone();
    let on_map_event = Rc::new(move |event| send(&map_tx, AppEvent::Map(event)));
    let map = match Leaflet::new(MAP_CONTAINER_ID, &config.camera, on_map_event) {
        Ok(map) => map,
        Err(err) => {
            tracing::error!(%err, "Failed to create map");
            load_state.set(LoadState::Failed(err));
            return;
        }
    };

    let background = BackgroundTrack::find(BACKGROUND_ID);
    let _time_update = time_update_listener(&background, &tx);
    let mut gestures = gesture_listeners(&tx);
    let mut clips = ClipPlayers::default();

    let mut atlas = Atlas::new(map, background, config);
    atlas.load(store);
    snapshot.set(UiSnapshot::capture(&atlas));
    load_state.set(LoadState::Ready);

    let mut frame_pending = false;
    let mut events = futures::stream::select(intents.map(AppEvent::Intent), rx);

    while let Some(event) = events.next().await {
        let refresh = !matches!(event, AppEvent::Frame | AppEvent::TimeUpdate);
        match event {
            AppEvent::Intent(intent) => {
                if let Some(restore) = atlas.dispatch(intent) {
                    schedule_restore(&tx, restore);
                }
            }
            AppEvent::Map(map_event) => {
                if let MapEvent::Primitive {
                    kind: MapEventKind::PopupOpen,
                    ..
                } = map_event
                {
                    let clip_tx = tx.clone();
                    clips.wire(move |clip| send(&clip_tx, AppEvent::Clip(clip)));
                }
                atlas.handle_map_event(map_event);
            }
            AppEvent::Clip(ClipEvent::Started(id)) => atlas.audio_mut().clip_started(id),
            AppEvent::Clip(ClipEvent::Stopped(id)) => {
                atlas.audio_mut().clip_stopped(id, dom::now_ms())
            }
            AppEvent::Gesture => {
                if atlas.audio_mut().first_gesture() {
                    gestures.clear();
                }
            }
            AppEvent::TimeUpdate => atlas.audio_mut().time_update(),
            AppEvent::Frame => {
                frame_pending = false;
                atlas.tick(dom::now_ms());
            }
            AppEvent::RestoreRoute(restore) => {
                atlas.restore_route(&restore.composer, restore.index)
            }
        }

        if atlas.audio().is_busy() && !frame_pending {
            frame_pending = true;
            schedule_frame(&tx);
        }

        if refresh {
            let next = UiSnapshot::capture(&atlas);
            if *snapshot.peek() != next {
                snapshot.set(next);
            }
        }
    }
}
