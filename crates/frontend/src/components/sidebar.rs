use atlas_shared::sidebar::{ComposerRow, Intent, Key, StudioRow, Tab};
use dioxus::prelude::*;

use crate::pump::LoadState;

#[component]
pub fn TabBar(tab: Tab, on_intent: EventHandler<Intent>) -> Element {
    let class = |t: Tab| if t == tab { "tab active" } else { "tab" };
    rsx! {
        div { class: "tabs", role: "tablist",
            button {
                id: "tab-composers",
                class: class(Tab::Composers),
                role: "tab",
                "aria-selected": "{tab == Tab::Composers}",
                onclick: move |_| on_intent.call(Intent::SelectTab(Tab::Composers)),
                "Composers"
            }
            button {
                id: "tab-studios",
                class: class(Tab::Studios),
                role: "tab",
                "aria-selected": "{tab == Tab::Studios}",
                onclick: move |_| on_intent.call(Intent::SelectTab(Tab::Studios)),
                "Studios"
            }
        }
    }
}

#[component]
pub fn SearchBox(tab: Tab, query: String, on_intent: EventHandler<Intent>) -> Element {
    rsx! {
        input {
            id: "composer-search",
            class: "search",
            r#type: "search",
            "aria-label": "Search",
            placeholder: tab.search_placeholder(),
            value: "{query}",
            oninput: move |evt: Event<FormData>| {
                on_intent.call(Intent::Search(evt.value().to_string()));
            },
        }
    }
}

#[component]
pub fn ComposerList(
    rows: Vec<ComposerRow>,
    load_state: LoadState,
    on_intent: EventHandler<Intent>,
) -> Element {
    rsx! {
        div { id: "composer-list", class: "list",
            match load_state {
                LoadState::Failed(err) => rsx! {
                    div { class: "error-state", "Could not load the page: {err}" }
                },
                LoadState::Loading => rsx! {
                    div { class: "loading-state", "Loading\u{2026}" }
                },
                LoadState::Ready => rsx! {
                    for row in rows {
                        ComposerItem { key: "{row.id}", row: row.clone(), on_intent }
                    }
                },
            }
        }
    }
}

#[component]
fn ComposerItem(row: ComposerRow, on_intent: EventHandler<Intent>) -> Element {
    let mut class = String::from("composer-item");
    if row.expanded {
        class.push_str(" expanded");
    }
    if row.active {
        class.push_str(" active");
    }
    let id = row.id.clone();

    rsx! {
        div {
            class: "{class}",
            "data-id": "{row.id}",
            hidden: row.hidden,
            onclick: move |evt| evt.stop_propagation(),
            div {
                class: "composer-top",
                role: "button",
                tabindex: 0,
                "aria-expanded": "{row.expanded}",
                onclick: {
                    let id = id.clone();
                    move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        on_intent.call(Intent::HeaderClick(id.clone()));
                    }
                },
                onkeydown: {
                    let id = id.clone();
                    move |evt: Event<KeyboardData>| {
                        let key = Key::from_name(&evt.key().to_string());
                        if matches!(key, Key::Enter | Key::Space) {
                            evt.prevent_default();
                        }
                        on_intent.call(Intent::HeaderKey(id.clone(), key));
                    }
                },
                onmouseenter: {
                    let id = id.clone();
                    move |_| on_intent.call(Intent::HeaderHover(id.clone(), true))
                },
                onmouseleave: {
                    let id = id.clone();
                    move |_| on_intent.call(Intent::HeaderHover(id.clone(), false))
                },
                span { class: "swatch", style: "background: {row.color}" }
                div { class: "composer-text",
                    div { class: "composer-name", "{row.name}" }
                    div { class: "composer-meta", "{row.meta}" }
                }
                span { class: "caret", "\u{25be}" }
            }
            div { class: "composer-dropdown",
                div { class: "composer-bio", "{row.bio}" }
                if !row.routes.is_empty() {
                    div { class: "composer-city-list",
                        for item in row.routes.iter() {
                            div {
                                key: "{item.index}",
                                class: "composer-city-item",
                                role: "button",
                                tabindex: 0,
                                onclick: {
                                    let id = id.clone();
                                    let index = item.index;
                                    move |evt: Event<MouseData>| {
                                        evt.stop_propagation();
                                        on_intent.call(Intent::RouteClick(id.clone(), index));
                                    }
                                },
                                "{item.text}"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn StudioList(rows: Vec<StudioRow>, on_intent: EventHandler<Intent>) -> Element {
    rsx! {
        div { id: "studio-list", class: "list",
            for row in rows {
                StudioItem { key: "{row.id}", row: row.clone(), on_intent }
            }
        }
    }
}

#[component]
fn StudioItem(row: StudioRow, on_intent: EventHandler<Intent>) -> Element {
    let class = if row.active { "studio-item active" } else { "studio-item" };
    let id = row.id.clone();

    rsx! {
        div {
            class: class,
            "data-id": "{row.id}",
            role: "button",
            tabindex: 0,
            onclick: {
                let id = id.clone();
                move |_| on_intent.call(Intent::StudioClick(id.clone()))
            },
            onmouseenter: {
                let id = id.clone();
                move |_| on_intent.call(Intent::StudioHover(id.clone(), true))
            },
            onmouseleave: {
                let id = id.clone();
                move |_| on_intent.call(Intent::StudioHover(id.clone(), false))
            },
            div { class: "studio-name", "{row.name}" }
            if !row.years.is_empty() {
                div { class: "studio-meta", "{row.years}" }
            }
            if row.active && !row.bio.is_empty() {
                div { class: "studio-bio", "{row.bio}" }
            }
        }
    }
}
