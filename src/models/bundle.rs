//! Everything a single run hands back to its caller

use serde::{Deserialize, Serialize};

use super::{AnalysisRecord, Coordinate, PlaceInfo, Recommendation};

/// Final result of one pipeline run. Rendering is left to the caller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResultBundle {
    /// Record lines with `Country`/`City` appended; starts with an
    /// `- Error:` line when the generator deviated from the record format
    pub analysis_text: String,
    pub recommendation_text: String,
    pub coordinates: Vec<Coordinate>,
    /// Agent log prepared for display
    pub agent_log: String,
    /// One water-resource note per coordinate
    pub water_resources: Vec<String>,
    pub records: Vec<AnalysisRecord>,
    /// `None` when no recommendation was attempted
    pub recommendation: Option<Recommendation>,
    pub places: Vec<PlaceInfo>,
    /// Raw record count differed from the number of locations
    pub count_mismatch: bool,
}

impl ResultBundle {
    /// 0-based index of the accepted recommendation, for highlighting
    #[must_use]
    pub fn recommended_index(&self) -> Option<usize> {
        self.recommendation
            .as_ref()
            .and_then(|r| r.recommended_index)
            .map(|index| index - 1)
            .filter(|index| *index < self.coordinates.len())
    }
}
