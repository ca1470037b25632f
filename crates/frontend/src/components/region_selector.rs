use dioxus::prelude::*;

use rolemap_shared::geo::REGION_ALL;

/// Region dropdown. Selecting an entry recenters the map on that
/// region's markers; the sentinel first entry fits everything.
#[component]
pub fn RegionSelector(
    regions: Vec<String>,
    selected: ReadSignal<String>,
    on_select: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "panel",
            h3 { "Region" }
            select {
                "aria-label": "Select region",
                value: "{selected}",
                onchange: move |evt: Event<FormData>| {
                    on_select.call(evt.value().to_string());
                },
                option {
                    value: REGION_ALL,
                    selected: *selected.read() == REGION_ALL,
                    "All regions"
                }
                for region in regions {
                    option {
                        value: "{region}",
                        selected: *selected.read() == region,
                        "{region}"
                    }
                }
            }
        }
    }
}
