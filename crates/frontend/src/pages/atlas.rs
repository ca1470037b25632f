use std::collections::HashSet;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use rolemap_shared::feature::{self, Feature, Record};
use rolemap_shared::geo::{self, REGION_ALL};
use rolemap_shared::loader::{FrameClock, FrameOutcome, IncrementalLoader, LoaderConfig};
use rolemap_shared::visibility::{CategoryIndex, MarkerId, MarkerLayer, VisibilityEngine};

use crate::api::{self, RoleColorData, PAGE_SIZE};
use crate::components::legend::Legend;
use crate::components::map_view::{FitRequest, MapView, MarkerView};
use crate::components::region_selector::RegionSelector;

/// `performance.now()` as the loader's frame budget clock.
struct PerformanceClock;

impl FrameClock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
}

/// Adapter letting the visibility engine drive the rendered id set.
struct SignalLayer<'a>(&'a mut HashSet<usize>);

impl MarkerLayer for SignalLayer<'_> {
    fn show_marker(&mut self, marker: MarkerId) {
        self.0.insert(marker.0);
    }

    fn hide_marker(&mut self, marker: MarkerId) {
        self.0.remove(&marker.0);
    }
}

/// Everything the load and filter paths mutate together. Kept in one
/// signal so a frame can split-borrow the loader against the index and
/// engine.
struct MapState {
    features: Vec<Feature>,
    index: CategoryIndex,
    engine: VisibilityEngine,
    loader: IncrementalLoader,
}

impl MapState {
    fn new() -> Self {
        MapState {
            features: Vec::new(),
            index: CategoryIndex::new(),
            engine: VisibilityEngine::new(),
            loader: IncrementalLoader::new(LoaderConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LoadStatus {
    Loading { loaded: usize, total: usize },
    Ready,
    Error(String),
}

#[component]
pub fn Atlas(region: Option<String>) -> Element {
    let mut state = use_signal(MapState::new);
    let mut markers = use_signal(Vec::<MarkerView>::new);
    let mut visible = use_signal(HashSet::<usize>::new);

    let mut role_colors = use_signal(Vec::<RoleColorData>::new);
    let mut regions = use_signal(Vec::<String>::new);
    let mut selected_roles = use_signal(HashSet::<String>::new);
    let mut selected_region =
        use_signal(|| region.clone().unwrap_or_else(|| REGION_ALL.to_string()));

    let mut fit_request = use_signal(|| None::<FitRequest>);
    let mut status = use_signal(|| LoadStatus::Loading {
        loaded: 0,
        total: 0,
    });

    let mut post_fit = move |bounds: geo::Bounds| {
        let seq = (*fit_request.peek()).map(|r| r.seq).unwrap_or(0) + 1;
        fit_request.set(Some(FitRequest { bounds, seq }));
    };

    let deep_link_region = region.clone();
    let _load = use_future(move || {
        let deep_link_region = deep_link_region.clone();
        async move {
            match api::fetch_role_colors().await {
                Ok(colors) => {
                    selected_roles.set(colors.iter().map(|c| c.role.clone()).collect());
                    role_colors.set(colors);
                }
                Err(e) => {
                    status.set(LoadStatus::Error(e));
                    return;
                }
            }
            if let Ok(r) = api::fetch_regions().await {
                regions.set(r);
            }

            let generation = state.peek().loader.generation();
            let mut offset = 0usize;
            loop {
                let page = match api::fetch_record_page(offset, PAGE_SIZE).await {
                    Ok(p) => p,
                    Err(e) => {
                        status.set(LoadStatus::Error(e));
                        return;
                    }
                };
                if state.peek().loader.generation() != generation {
                    return;
                }
                let total = page.total.max(0) as usize;
                let fetched = page.records.len();
                let records: Vec<Record> =
                    page.records.into_iter().map(|r| r.fields).collect();
                let batch = feature::build_features(&records);

                {
                    let mut st = state.write();
                    if let Some(bounds) = st.loader.take_initial_bounds(&batch) {
                        post_fit(bounds);
                    }
                    st.loader.enqueue(batch);
                }

                // Drain the queue a frame at a time, yielding to the
                // browser between frames so rendering stays responsive.
                loop {
                    if state.peek().loader.generation() != generation {
                        return;
                    }
                    let outcome = {
                        let mut st = state.write();
                        let MapState {
                            features,
                            index,
                            engine,
                            loader,
                        } = &mut *st;
                        loader.process_frame(&PerformanceClock, &mut |feat: Feature| {
                            let id = MarkerId(features.len());
                            index.register(id, &feat.roles);
                            {
                                let mut vis = visible.write();
                                let mut layer = SignalLayer(&mut vis);
                                engine.set_initial_visibility(&mut layer, id, &feat.roles);
                            }
                            let (x, y) = geo::lat_lon_to_px(feat.lat, feat.lon);
                            markers.write().push(MarkerView {
                                id: id.0,
                                x,
                                y,
                                color: feat.color(),
                                record: feat.properties.clone(),
                            });
                            features.push(feat);
                        })
                    };
                    status.set(LoadStatus::Loading {
                        loaded: markers.peek().len(),
                        total,
                    });
                    match outcome {
                        FrameOutcome::Drained => break,
                        FrameOutcome::MoreWork => TimeoutFuture::new(0).await,
                    }
                }

                offset += fetched;
                if fetched == 0 || offset >= total {
                    break;
                }
            }
            status.set(LoadStatus::Ready);

            // Deep-linked region: recenter once everything is placed
            if let Some(name) = deep_link_region {
                if let Some(bounds) = geo::bounds_for_region(&state.peek().features, &name) {
                    post_fit(bounds);
                }
            }
        }
    });

    let on_roles_change = move |selection: HashSet<String>| {
        selected_roles.set(selection.clone());
        let mut st = state.write();
        let MapState { index, engine, .. } = &mut *st;
        let mut vis = visible.write();
        let mut layer = SignalLayer(&mut vis);
        engine.apply_selection(index, &mut layer, selection);
    };

    let on_region_select = move |name: String| {
        selected_region.set(name.clone());
        if let Some(bounds) = geo::bounds_for_region(&state.peek().features, &name) {
            post_fit(bounds);
        }
    };

    let region_link = {
        let sel = selected_region.read();
        if sel.eq_ignore_ascii_case(REGION_ALL) {
            None
        } else {
            web_sys::window()
                .and_then(|w| w.location().origin().ok())
                .map(|origin| api::build_region_url(&origin, &sel))
        }
    };

    let cur_status = status.read().clone();
    let initial_load = markers.read().is_empty()
        && matches!(cur_status, LoadStatus::Loading { .. });

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Regional Role Map" }
                match &cur_status {
                    LoadStatus::Loading { loaded, total } if *total > 0 => rsx! {
                        span { class: "load-progress", "Loading {loaded} of {total}" }
                    },
                    LoadStatus::Error(msg) => rsx! {
                        span { class: "load-error", "Failed to load: {msg}" }
                    },
                    _ => rsx! {},
                }
            }

            div { class: "sidebar",
                RegionSelector {
                    regions: regions.read().clone(),
                    selected: selected_region,
                    on_select: on_region_select,
                }
                if let Some(href) = region_link {
                    a { class: "region-link", href: "{href}", "Link to this region" }
                }
                Legend {
                    entries: role_colors.read().clone(),
                    selected: selected_roles,
                    on_change: on_roles_change,
                }
            }

            if initial_load {
                div { class: "map-loading", "Loading map\u{2026}" }
            } else {
                MapView {
                    markers,
                    visible,
                    fit_request,
                }
            }
        }
    }
}
