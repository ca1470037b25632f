use std::collections::{HashMap, HashSet};

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use rolemap_shared::feature::Record;
use rolemap_shared::geo::{self, Bounds};

use crate::components::popup;
use crate::coords;

const MAP_CONTAINER_ID: &str = "atlas-map-container";

/// Drag threshold in pixels — movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 12.0;
const ZOOM_STEP: f64 = 1.1;

/// Hit-test threshold (in map-image pixels, before zoom) for marker
/// clicks and hover.
const HIT_THRESHOLD: f64 = 24.0;

/// Marker geometry in viewBox units.
const MARKER_RADIUS: f64 = 11.0;
const MARKER_STROKE: f64 = 2.5;

/// Margin factor applied when fitting bounds so markers don't sit on
/// the container edge.
const FIT_PADDING: f64 = 0.9;

/// One marker as the surface renders it. Position is in native
/// map-image pixel space; the record backs lazy popup/tooltip HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub record: Record,
}

/// A request to recenter the view. `seq` distinguishes repeated fits to
/// the same bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRequest {
    pub bounds: Bounds,
    pub seq: u64,
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Get the bounding client rect of the map container element.
fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

// ---------------------------------------------------------------------------
// Zoom / pan math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Compute new pan offsets so that `cursor` stays over the same content point
/// when zooming from `old_zoom` to `new_zoom`.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_zoom: f64,
    new_zoom: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_zoom;
    let content_y = (cursor_y - old_pan_y) / old_zoom;
    (
        cursor_x - content_x * new_zoom,
        cursor_y - content_y * new_zoom,
    )
}

/// Clamp pan values so the map can't be dragged off-screen.
///
/// The map image is rendered at `width: 100%` of the container, so its actual
/// rendered height is `container_w * (MAP_HEIGHT_PX / MAP_WIDTH_PX)`, which may
/// differ from the container height.
fn clamp_pan(pan_x: f64, pan_y: f64, zoom: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let content_w = container_w * zoom;
    let content_h = container_w * (geo::MAP_HEIGHT_PX / geo::MAP_WIDTH_PX) * zoom;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

/// Apply `clamp_pan` using the live container dimensions.
fn clamp_pan_to_container(pan_x: f64, pan_y: f64, zoom: f64) -> (f64, f64) {
    match container_rect() {
        Some(rect) => clamp_pan(pan_x, pan_y, zoom, rect.width(), rect.height()),
        None => {
            tracing::warn!("map container not mounted, leaving pan unclamped");
            (pan_x, pan_y)
        }
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// Compute zoom and pan that frame `bounds` inside the container.
///
/// A map-image point renders at `img * (container_w / MAP_WIDTH_PX) * zoom + pan`,
/// so the zoom is the largest value at which the padded bounds span still
/// fits both axes, and the pan centers the bounds midpoint.
fn view_for_bounds(bounds: &Bounds, container_w: f64, container_h: f64) -> (f64, f64, f64) {
    let (min_x, max_y) = geo::lat_lon_to_px(bounds.min_lat, bounds.min_lon);
    let (max_x, min_y) = geo::lat_lon_to_px(bounds.max_lat, bounds.max_lon);

    let k = container_w / geo::MAP_WIDTH_PX;
    let span_x = (max_x - min_x).max(1.0);
    let span_y = (max_y - min_y).max(1.0);

    let fit_x = container_w / (span_x * k);
    let fit_y = container_h / (span_y * k);
    let zoom = (FIT_PADDING * fit_x.min(fit_y)).clamp(ZOOM_MIN, ZOOM_MAX);

    let center_x = (min_x + max_x) / 2.0;
    let center_y = (min_y + max_y) / 2.0;
    let pan_x = container_w / 2.0 - center_x * k * zoom;
    let pan_y = container_h / 2.0 - center_y * k * zoom;

    let (pan_x, pan_y) = clamp_pan(pan_x, pan_y, zoom, container_w, container_h);
    (zoom, pan_x, pan_y)
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// Find the visible marker nearest to `click` within `threshold`
/// (Euclidean distance in map-image pixels).
fn find_nearest(
    markers: &[MarkerView],
    visible: &HashSet<usize>,
    click: (f64, f64),
    threshold: f64,
) -> Option<usize> {
    let mut best_id = None;
    let mut best_dist = threshold;
    for m in markers {
        if !visible.contains(&m.id) {
            continue;
        }
        let dx = m.x - click.0;
        let dy = m.y - click.1;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best_id = Some(m.id);
        }
    }
    best_id
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

/// Reference container width (desktop map panel) used to normalize marker sizes.
const REFERENCE_WIDTH: f64 = 960.0;

/// Build the marker overlay SVG content as a string. Hidden markers are
/// omitted entirely, not rendered transparent.
fn build_marker_circles(
    markers: &[MarkerView],
    visible: &HashSet<usize>,
    s: f64,
    hovered: Option<usize>,
) -> String {
    let mut svg = String::with_capacity(markers.len() * 96);
    for m in markers {
        if !visible.contains(&m.id) {
            continue;
        }
        let r = if hovered == Some(m.id) {
            MARKER_RADIUS * 1.4 * s
        } else {
            MARKER_RADIUS * s
        };
        let sw = MARKER_STROKE * s;
        let (x, y, color) = (m.x, m.y, &m.color);
        svg.push_str(&format!(
            r##"<circle cx="{x}" cy="{y}" r="{r}" fill="{color}" fill-opacity="0.9" stroke="white" stroke-width="{sw}"/>"##
        ));
    }
    svg
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    markers: ReadSignal<Vec<MarkerView>>,
    visible: ReadSignal<HashSet<usize>>,
    fit_request: ReadSignal<Option<FitRequest>>,
) -> Element {
    // Zoom / pan state
    let mut zoom = use_signal(|| 1.0_f64);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);

    // Lazy popup/tooltip HTML, built on first use and cached per marker
    let mut tooltip_cache = use_signal(HashMap::<usize, String>::new);
    let mut popup_cache = use_signal(HashMap::<usize, String>::new);
    let mut hovered = use_signal(|| None::<usize>);
    let mut open_popup = use_signal(|| None::<usize>);

    // Recenter whenever the parent posts a new fit request
    use_effect(move || {
        let Some(req) = *fit_request.read() else {
            return;
        };
        let Some(rect) = container_rect() else {
            tracing::warn!(seq = req.seq, "map container not mounted, dropping fit request");
            return;
        };
        let (z, px, py) = view_for_bounds(&req.bounds, rect.width(), rect.height());
        zoom.set(z);
        pan_x.set(px);
        pan_y.set(py);
        open_popup.set(None);
        hovered.set(None);
    });

    // Drag state
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start_x = use_signal(|| 0.0_f64);
    let mut drag_start_y = use_signal(|| 0.0_f64);
    let mut drag_start_pan_x = use_signal(|| 0.0_f64);
    let mut drag_start_pan_y = use_signal(|| 0.0_f64);

    // Memoize SVG generation — only recomputes when markers, visibility,
    // zoom, or hover change. Pan changes are read outside this memo so
    // they don't trigger SVG rebuilds.
    let svg_html = use_memo(move || {
        let markers = markers.read();
        let visible = visible.read();
        let cur_zoom = *zoom.read();
        let cur_hovered = *hovered.read();

        let cw = container_rect()
            .map(|r| r.width())
            .unwrap_or(REFERENCE_WIDTH);
        let mobile_boost = (REFERENCE_WIDTH / cw).max(1.0);
        let s = mobile_boost / cur_zoom.min(5.0);

        let circles = build_marker_circles(&markers, &visible, s, cur_hovered);
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5;">{}</svg>"#,
            geo::MAP_WIDTH_PX,
            geo::MAP_HEIGHT_PX,
            circles
        )
    });

    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();
    let cur_zoom = *zoom.read();
    let dragging = *is_dragging.read();

    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_zoom}); transform-origin: 0 0;"
    );
    let container_class = if dragging {
        "map-container dragging"
    } else {
        "map-container"
    };

    // Tooltip anchor in container coordinates. The HTML itself is
    // built in the hover handler; render only reads the cache.
    let tooltip = (*hovered.read()).and_then(|id| {
        let markers = markers.read();
        let m = markers.iter().find(|m| m.id == id)?;
        let rect = container_rect()?;
        let k = rect.width() / geo::MAP_WIDTH_PX;
        let sx = m.x * k * cur_zoom + cur_pan_x;
        let sy = m.y * k * cur_zoom + cur_pan_y;
        let html = tooltip_cache.read().get(&id).cloned()?;
        Some((sx, sy, html))
    });

    let popup_html = (*open_popup.read()).and_then(|id| popup_cache.read().get(&id).cloned());

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let old_z = *zoom.read();
                let new_z = (old_z * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }

                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                let cx = client.x - rect.left();
                let cy = client.y - rect.top();

                let (new_px, new_py) =
                    zoom_pan_at_cursor(cx, cy, old_z, new_z, *pan_x.read(), *pan_y.read());
                let (px, py) = clamp_pan(new_px, new_py, new_z, rect.width(), rect.height());

                zoom.set(new_z);
                pan_x.set(px);
                pan_y.set(py);
            },

            onmousedown: move |evt: Event<MouseData>| {
                // Only track drag/click for left mouse button
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start_x.set(client.x);
                drag_start_y.set(client.y);
                drag_start_pan_x.set(*pan_x.read());
                drag_start_pan_y.set(*pan_y.read());
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                if *is_dragging.read() {
                    let dx = client.x - *drag_start_x.read();
                    let dy = client.y - *drag_start_y.read();

                    if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                        did_drag.set(true);
                    }
                    if *did_drag.read() {
                        let new_px = *drag_start_pan_x.read() + dx;
                        let new_py = *drag_start_pan_y.read() + dy;
                        let (px, py) = clamp_pan_to_container(new_px, new_py, *zoom.read());
                        pan_x.set(px);
                        pan_y.set(py);
                    }
                    return;
                }

                // Hover hit-test against visible markers only
                if let Some((img_x, img_y)) = coords::click_to_map_px_zoomed(
                    client.x, client.y, MAP_CONTAINER_ID,
                    *zoom.read(), *pan_x.read(), *pan_y.read(),
                ) {
                    let threshold = HIT_THRESHOLD / (*zoom.read()).min(5.0);
                    let hit = find_nearest(
                        &markers.read(), &visible.read(), (img_x, img_y), threshold,
                    );
                    if let Some(id) = hit {
                        if !tooltip_cache.read().contains_key(&id) {
                            let html = markers
                                .read()
                                .iter()
                                .find(|m| m.id == id)
                                .map(|m| popup::tooltip_html(&m.record));
                            if let Some(html) = html {
                                tooltip_cache.write().insert(id, html);
                            }
                        }
                    }
                    if hit != *hovered.read() {
                        hovered.set(hit);
                    }
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);

                // A mouseup without drag movement = a click
                if was_dragging && !was_drag {
                    let client = evt.client_coordinates();
                    if let Some((img_x, img_y)) = coords::click_to_map_px_zoomed(
                        client.x, client.y, MAP_CONTAINER_ID,
                        *zoom.read(), *pan_x.read(), *pan_y.read(),
                    ) {
                        let threshold = HIT_THRESHOLD / (*zoom.read()).min(5.0);
                        let hit = find_nearest(
                            &markers.read(), &visible.read(), (img_x, img_y), threshold,
                        );
                        match hit {
                            Some(id) => {
                                if !popup_cache.read().contains_key(&id) {
                                    let html = markers
                                        .read()
                                        .iter()
                                        .find(|m| m.id == id)
                                        .map(|m| popup::popup_html(&m.record));
                                    if let Some(html) = html {
                                        popup_cache.write().insert(id, html);
                                    }
                                }
                                open_popup.set(Some(id));
                            }
                            None => open_popup.set(None),
                        }
                    }
                }
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
                hovered.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                zoom.set(1.0);
                pan_x.set(0.0);
                pan_y.set(0.0);
            },

            // Inner wrapper — CSS transform applies zoom/pan to map + overlay together
            div {
                class: "map-inner",
                style: "{transform_style}",

                img { src: "/static/images/world.webp", draggable: "false" }

                div {
                    dangerous_inner_html: "{svg_html}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
            }

            // Tooltip (outside the transform so it stays crisp)
            if let Some((sx, sy, html)) = tooltip {
                div {
                    class: "marker-tooltip",
                    style: "left: {sx}px; top: {sy}px;",
                    dangerous_inner_html: "{html}",
                }
            }

            // Popup card for the clicked marker
            if let Some(html) = popup_html {
                div { class: "marker-popup",
                    button {
                        class: "popup-close",
                        "aria-label": "Close",
                        onclick: move |_| open_popup.set(None),
                        "\u{00d7}"
                    }
                    div { dangerous_inner_html: "{html}" }
                }
            }
        }
    }
}
