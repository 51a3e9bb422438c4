//! Location metadata gathered for display

use serde::{Deserialize, Serialize};

/// Value used for any place field the lookup could not determine
pub const UNKNOWN: &str = "Unknown";

/// Best-effort country, city and water-resource note for one point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceInfo {
    pub country: String,
    pub city: String,
    /// Never empty; fallback text on any failure
    pub water_note: String,
}

impl PlaceInfo {
    /// Place with unknown country and city and the given note
    #[must_use]
    pub fn unknown(water_note: impl Into<String>) -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            water_note: water_note.into(),
        }
    }
}
