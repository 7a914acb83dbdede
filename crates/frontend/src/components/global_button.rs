use dioxus::prelude::*;

#[component]
pub fn GlobalViewButton(active: bool, on_toggle: EventHandler<()>) -> Element {
    rsx! {
        button {
            id: "global-view-btn",
            class: if active { "global-btn active" } else { "global-btn" },
            "aria-pressed": "{active}",
            title: if active { "Focus on a composer" } else { "Show every composer" },
            onclick: move |_| on_toggle.call(()),
            span { class: "btn-label",
                if active { "Global View" } else { "Focus" }
            }
        }
    }
}
