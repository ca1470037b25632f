//! Well-known field names of an entity record.
//!
//! Records arrive as loose JSON objects keyed by the column names of the
//! source table; these constants are the only place those names appear.

pub const LAT: &str = "Latitude";
pub const LON: &str = "Longitude";
pub const ENTITY: &str = "Entity Name";
pub const REGION: &str = "Region";
pub const PRIMARY_ROLE: &str = "Primary Role";
pub const SECONDARY_ROLE: &str = "Secondary Role";
pub const ADDRESS: &str = "Full Address";
pub const CONTACT: &str = "Contact Name";
pub const EMAIL: &str = "Email";
pub const PHONE: &str = "Phone Number";
pub const WEBSITE: &str = "Website";
pub const COLLABORATION: &str = "Collaboration Opportunities";
pub const COLOR: &str = "Colors (HEX)";

/// Marker fill color used when a record carries no color reference.
pub const FALLBACK_COLOR: &str = "#333";
