//! Converts a published-entities CSV export into the JSON assets the
//! backend serves: `entities.json` and `role_colors.json`.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

use rolemap_shared::fields;

/// Rows whose status column doesn't say "published" are dropped.
const STATUS_FIELD: &str = "Status";
const PUBLISHED: &str = "published";

/// Marker palette, assigned to roles in sorted order so colors are
/// stable across regenerations.
const PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#bfef45",
    "#fabed4", "#469990", "#9a6324", "#800000",
];

/// Columns whose CSV cells hold comma-separated lists and become JSON
/// arrays in the output.
const LIST_FIELDS: [&str; 2] = [fields::PRIMARY_ROLE, fields::SECONDARY_ROLE];

fn is_published(status: Option<&str>) -> bool {
    status
        .map(|s| s.trim().eq_ignore_ascii_case(PUBLISHED))
        .unwrap_or(false)
}

/// Split a multi-select cell into trimmed, non-blank items.
fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Convert one CSV row into a record object. List columns become
/// arrays, blank cells are omitted, and the status column is dropped.
fn row_to_record(headers: &csv::StringRecord, row: &csv::StringRecord) -> Map<String, Value> {
    let mut record = Map::new();
    for (header, cell) in headers.iter().zip(row.iter()) {
        if header == STATUS_FIELD || cell.trim().is_empty() {
            continue;
        }
        if LIST_FIELDS.contains(&header) {
            record.insert(header.to_string(), json!(split_list(cell)));
        } else {
            record.insert(header.to_string(), json!(cell.trim()));
        }
    }
    record
}

/// Distinct role labels across both role columns, sorted.
fn collect_roles(records: &[Map<String, Value>]) -> Vec<String> {
    let mut roles = BTreeSet::new();
    for record in records {
        for field in LIST_FIELDS {
            if let Some(Value::Array(items)) = record.get(field) {
                for item in items {
                    if let Some(role) = item.as_str() {
                        roles.insert(role.to_string());
                    }
                }
            }
        }
    }
    roles.into_iter().collect()
}

fn role_colors(roles: &[String]) -> Vec<Value> {
    roles
        .iter()
        .enumerate()
        .map(|(i, role)| json!({ "role": role, "color": PALETTE[i % PALETTE.len()] }))
        .collect()
}

fn get_arg(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

fn read_input(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        eprintln!("Fetching {input}...");
        let resp = reqwest::blocking::get(input).unwrap_or_else(|e| {
            eprintln!("Failed to fetch {input}: {e}");
            std::process::exit(1);
        });
        resp.text().unwrap_or_else(|e| {
            eprintln!("Failed to read response body: {e}");
            std::process::exit(1);
        })
    } else {
        std::fs::read_to_string(input).unwrap_or_else(|e| {
            eprintln!("Failed to read {input}: {e}");
            std::process::exit(1);
        })
    }
}

fn main() {
    let input = get_arg("--input").unwrap_or_else(|| {
        eprintln!("Error: --input <csv-path-or-url> is required");
        eprintln!("Usage: cargo run -p rolemap-datagen -- --input entities.csv [--out data]");
        std::process::exit(1);
    });
    let out_dir = get_arg("--out").unwrap_or_else(|| "data".to_string());

    let csv_data = read_input(&input);

    let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
    let headers = reader
        .headers()
        .unwrap_or_else(|e| {
            eprintln!("Failed to read CSV headers: {e}");
            std::process::exit(1);
        })
        .clone();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let status_idx = headers.iter().position(|h| h == STATUS_FIELD);
    for (line, row) in reader.records().enumerate() {
        let row = row.unwrap_or_else(|e| {
            eprintln!("Failed to parse CSV row {}: {e}", line + 2);
            std::process::exit(1);
        });
        let status = status_idx.and_then(|i| row.get(i));
        if !is_published(status) {
            skipped += 1;
            continue;
        }
        records.push(row_to_record(&headers, &row));
    }

    let roles = collect_roles(&records);
    let colors = role_colors(&roles);

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create {out_dir}: {e}");
        std::process::exit(1);
    });

    let entities_path = Path::new(&out_dir).join("entities.json");
    let colors_path = Path::new(&out_dir).join("role_colors.json");

    std::fs::write(
        &entities_path,
        serde_json::to_string_pretty(&records).unwrap(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {e}", entities_path.display());
        std::process::exit(1);
    });
    std::fs::write(&colors_path, serde_json::to_string_pretty(&colors).unwrap()).unwrap_or_else(
        |e| {
            eprintln!("Failed to write {}: {e}", colors_path.display());
            std::process::exit(1);
        },
    );

    eprintln!(
        "Wrote {} records ({} skipped as unpublished), {} roles",
        records.len(),
        skipped,
        roles.len()
    );
}
