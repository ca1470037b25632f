use std::collections::HashSet;

use dioxus::prelude::*;

use crate::api::RoleColorData;

/// Return `selection` with `role` toggled.
fn toggled(selection: &HashSet<String>, role: &str) -> HashSet<String> {
    let mut next = selection.clone();
    if !next.remove(role) {
        next.insert(role.to_string());
    }
    next
}

/// Legend panel: one checkbox row per role with its marker color, plus
/// bulk select/deselect. Every change emits the complete new selection
/// rather than a single toggle, so the parent applies it atomically.
#[component]
pub fn Legend(
    entries: Vec<RoleColorData>,
    selected: ReadSignal<HashSet<String>>,
    on_change: EventHandler<HashSet<String>>,
) -> Element {
    let all_roles: HashSet<String> = entries.iter().map(|e| e.role.clone()).collect();

    rsx! {
        div { class: "panel legend",
            h3 { "Roles" }
            div { class: "legend-actions",
                button {
                    onclick: move |_| on_change.call(all_roles.clone()),
                    "Show All"
                }
                button {
                    onclick: move |_| on_change.call(HashSet::new()),
                    "Show None"
                }
            }
            for entry in entries {
                {
                    let role = entry.role.clone();
                    let color = entry.color.clone();
                    let checked = selected.read().contains(&role);
                    let toggle_role = role.clone();
                    let key_role = role.clone();
                    rsx! {
                        div {
                            key: "{role}",
                            class: "legend-row",
                            role: "checkbox",
                            "aria-checked": "{checked}",
                            tabindex: "0",
                            onclick: move |_| {
                                on_change.call(toggled(&selected.read(), &toggle_role));
                            },
                            onkeydown: move |evt: Event<KeyboardData>| {
                                let key = evt.key();
                                if key == Key::Enter || key == Key::Character(" ".to_string()) {
                                    evt.prevent_default();
                                    on_change.call(toggled(&selected.read(), &key_role));
                                }
                            },
                            span {
                                class: "legend-swatch",
                                style: "background-color: {color};",
                            }
                            span { class: "legend-label", "{role}" }
                            if checked {
                                span { class: "legend-check", "\u{2713}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
