use atlas_shared::config::AtlasConfig;
use atlas_shared::sidebar::{Intent, Tab};
use dioxus::prelude::*;
use futures::channel::mpsc::UnboundedReceiver;

use crate::background::BACKGROUND_ID;
use crate::components::global_button::GlobalViewButton;
use crate::components::sidebar::{ComposerList, SearchBox, StudioList, TabBar};
use crate::components::timeline::Timeline;
use crate::pump::{self, LoadState, UiSnapshot, MAP_CONTAINER_ID};

#[component]
pub fn AtlasPage() -> Element {
    let config = use_hook(AtlasConfig::default);
    let snapshot = use_signal({
        let config = config.clone();
        move || UiSnapshot::initial(&config)
    });
    let load_state = use_signal(|| LoadState::Loading);

    let pump = use_coroutine({
        let config = config.clone();
        move |intents: UnboundedReceiver<Intent>| {
            pump::run(intents, snapshot, load_state, config.clone())
        }
    });
    let on_intent = move |intent: Intent| pump.send(intent);

    let ui = snapshot.read();
    let state = load_state.read().clone();

    rsx! {
        div { class: "app",
            onclick: move |_| pump.send(Intent::OutsideClick),
            aside { class: "sidebar",
                header { class: "sidebar-header",
                    h1 { "Composer Atlas" }
                    GlobalViewButton {
                        active: ui.global,
                        on_toggle: move |_| pump.send(Intent::ToggleGlobalView),
                    }
                }
                TabBar { tab: ui.tab, on_intent }
                SearchBox { tab: ui.tab, query: ui.query.clone(), on_intent }
                div { hidden: ui.tab != Tab::Composers,
                    ComposerList {
                        rows: ui.composers.clone(),
                        load_state: state.clone(),
                        on_intent,
                    }
                }
                div { hidden: ui.tab != Tab::Studios,
                    StudioList { rows: ui.studios.clone(), on_intent }
                }
            }
            main { class: "map-wrap",
                div { id: MAP_CONTAINER_ID, class: "map" }
                if ui.global && state == LoadState::Ready {
                    Timeline {
                        year: ui.year,
                        timeline: config.timeline.clone(),
                        on_intent,
                    }
                }
            }
            audio {
                id: BACKGROUND_ID,
                src: "{config.audio.background_url}",
                preload: "auto",
                r#loop: true,
            }
        }
    }
}
