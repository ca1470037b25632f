use rolemap_shared::geo;

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
#[cfg(test)]
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Pure function: convert container-relative coordinates to native map-image pixels,
/// undoing zoom/pan CSS transform. Usable in unit tests (no web_sys dependency).
///
/// Only `container_w` is needed because the image renders with `width:100%; height:auto`,
/// so both axes share the same scale factor (`MAP_WIDTH_PX / container_w`).
pub fn client_to_map_px_zoomed(
    container_x: f64,
    container_y: f64,
    container_w: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    if container_w <= 0.0 || zoom <= 0.0 {
        return None;
    }

    // Undo CSS transform: translate(pan_x, pan_y) scale(zoom)
    let rendered_x = (container_x - pan_x) / zoom;
    let rendered_y = (container_y - pan_y) / zoom;

    // Convert from rendered size to native image pixels.
    // The image preserves aspect ratio (width:100%, height:auto),
    // so both axes use the same scale factor.
    let scale = geo::MAP_WIDTH_PX / container_w;
    let img_x = (rendered_x * scale).clamp(0.0, geo::MAP_WIDTH_PX);
    let img_y = (rendered_y * scale).clamp(0.0, geo::MAP_HEIGHT_PX);

    Some((img_x, img_y))
}

/// Get container-relative click coordinates using web_sys, then convert
/// from rendered pixel space to map-image pixel space, undoing zoom/pan transform.
pub fn click_to_map_px_zoomed(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();

    let container_x = client_x - rect.left();
    let container_y = client_y - rect.top();

    client_to_map_px_zoomed(container_x, container_y, rect.width(), zoom, pan_x, pan_y)
}
