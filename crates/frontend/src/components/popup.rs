//! Popup and tooltip HTML, built lazily from record fields.

use rolemap_shared::feature::Record;
use rolemap_shared::fields;
use serde_json::Value;

/// Escape text for embedding in HTML.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Role labels joined for display; handles both array and scalar fields.
fn roles_line(record: &Record, field: &str) -> Option<String> {
    let value = record.get(field)?;
    let joined = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Hover tooltip: entity name with region subtitle.
pub fn tooltip_html(record: &Record) -> String {
    let name = field_str(record, fields::ENTITY).unwrap_or("Unknown");
    let mut html = format!("<strong>{}</strong>", escape_html(name));
    if let Some(region) = field_str(record, fields::REGION) {
        html.push_str(&format!(
            "<span class=\"tooltip-region\">{}</span>",
            escape_html(region)
        ));
    }
    html
}

/// Full popup card for a clicked marker. Fields that are missing or
/// blank are omitted rather than rendered empty.
pub fn popup_html(record: &Record) -> String {
    let name = field_str(record, fields::ENTITY).unwrap_or("Unknown");
    let mut html = format!("<h3>{}</h3>", escape_html(name));

    if let Some(roles) = roles_line(record, fields::PRIMARY_ROLE) {
        html.push_str(&format!(
            "<p class=\"popup-roles\"><strong>Primary:</strong> {}</p>",
            escape_html(&roles)
        ));
    }
    if let Some(roles) = roles_line(record, fields::SECONDARY_ROLE) {
        html.push_str(&format!(
            "<p class=\"popup-roles\"><strong>Secondary:</strong> {}</p>",
            escape_html(&roles)
        ));
    }
    if let Some(region) = field_str(record, fields::REGION) {
        html.push_str(&format!(
            "<p><strong>Region:</strong> {}</p>",
            escape_html(region)
        ));
    }
    if let Some(address) = field_str(record, fields::ADDRESS) {
        html.push_str(&format!(
            "<p><strong>Address:</strong> {}</p>",
            escape_html(address)
        ));
    }
    if let Some(contact) = field_str(record, fields::CONTACT) {
        html.push_str(&format!(
            "<p><strong>Contact:</strong> {}</p>",
            escape_html(contact)
        ));
    }
    if let Some(email) = field_str(record, fields::EMAIL) {
        let escaped = escape_html(email);
        html.push_str(&format!(
            "<p><strong>Email:</strong> <a href=\"mailto:{escaped}\">{escaped}</a></p>"
        ));
    }
    if let Some(phone) = field_str(record, fields::PHONE) {
        html.push_str(&format!(
            "<p><strong>Phone:</strong> {}</p>",
            escape_html(phone)
        ));
    }
    if let Some(website) = field_str(record, fields::WEBSITE) {
        let escaped = escape_html(website);
        html.push_str(&format!(
            "<p><strong>Website:</strong> <a href=\"{escaped}\" target=\"_blank\" rel=\"noopener\">{escaped}</a></p>"
        ));
    }
    if let Some(collab) = field_str(record, fields::COLLABORATION) {
        html.push_str(&format!(
            "<p><strong>Collaboration:</strong> {}</p>",
            escape_html(collab)
        ));
    }

    html
}
