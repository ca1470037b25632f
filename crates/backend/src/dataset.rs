use rolemap_shared::feature::Record;
use rolemap_shared::fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A legend entry: role label plus its hex color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleColor {
    pub role: String,
    pub color: String,
}

/// The entity dataset, loaded once at startup and served in pages.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<Record>,
    role_colors: Vec<RoleColor>,
}

impl Dataset {
    pub fn load(data_dir: &Path) -> Result<Self, String> {
        let entities_path = data_dir.join("entities.json");
        let colors_path = data_dir.join("role_colors.json");

        let entities_data = std::fs::read_to_string(&entities_path)
            .map_err(|e| format!("Failed to read {}: {}", entities_path.display(), e))?;
        let colors_data = std::fs::read_to_string(&colors_path)
            .map_err(|e| format!("Failed to read {}: {}", colors_path.display(), e))?;

        let records: Vec<Record> = serde_json::from_str(&entities_data)
            .map_err(|e| format!("Failed to parse entities.json: {}", e))?;
        let role_colors: Vec<RoleColor> = serde_json::from_str(&colors_data)
            .map_err(|e| format!("Failed to parse role_colors.json: {}", e))?;

        tracing::info!(
            records = records.len(),
            roles = role_colors.len(),
            "Loaded entity dataset"
        );

        Ok(Dataset {
            records,
            role_colors,
        })
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// One page of the ordered record sequence. Offsets past the end
    /// yield an empty slice.
    pub fn page(&self, offset: usize, limit: usize) -> &[Record] {
        let start = offset.min(self.records.len());
        let end = offset.saturating_add(limit).min(self.records.len());
        &self.records[start..end]
    }

    pub fn role_colors(&self) -> &[RoleColor] {
        &self.role_colors
    }

    /// Distinct region names, sorted, for the region selector.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self
            .records
            .iter()
            .filter_map(|r| r.get(fields::REGION))
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        regions.sort();
        regions.dedup();
        regions
    }
}
