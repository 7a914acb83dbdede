use atlas_shared::config::TimelineConfig;
use atlas_shared::sidebar::Intent;
use dioxus::prelude::*;

use crate::dom;

const RANGE_ID: &str = "timeline-range";

/// Year slider shown in global view. The indicator follows the thumb.
#[component]
pub fn Timeline(year: i32, timeline: TimelineConfig, on_intent: EventHandler<Intent>) -> Element {
    let left = timeline.indicator_offset(year, dom::element_width(RANGE_ID));
    let (first, last) = timeline.range();

    rsx! {
        div { id: "timeline-bar", class: "timeline-bar",
            div { class: "timeline-wrap",
                div {
                    id: "timeline-year-indicator",
                    class: "timeline-year-indicator",
                    style: "left: {left}px",
                    "{year}"
                }
                input {
                    id: RANGE_ID,
                    r#type: "range",
                    "aria-label": "Timeline year",
                    min: "{first}",
                    max: "{last}",
                    step: "1",
                    value: "{year}",
                    oninput: move |evt: Event<FormData>| {
                        match evt.value().parse::<i32>() {
                            Ok(year) => on_intent.call(Intent::Timeline(year)),
                            Err(_) => tracing::debug!(value = %evt.value(), "Ignoring timeline input"),
                        }
                    },
                }
                div { class: "timeline-labels",
                    span { "{first}" }
                    span { "{last}" }
                }
            }
        }
    }
}
