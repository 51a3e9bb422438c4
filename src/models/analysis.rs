//! Per-location rainfall and capacity estimates

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Which extraction path produced a record
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// A single well-formed line in the generator output
    SingleLine,
    /// Location, rainfall and capacity spread over separate bullet lines
    MultiLine,
    /// Nothing usable was found; values are zero
    Synthesized,
}

/// One structured estimate per input location, in input order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisRecord {
    /// 1-based display index
    pub location_index: usize,
    pub coordinate: Coordinate,
    /// Estimated annual rainfall in mm, never negative
    pub rainfall_mm: f64,
    /// Estimated capacity in millions of liters, never negative
    pub capacity_m_liters: f64,
    /// Record line the values were read from
    pub line: String,
    /// How this parse obtained the record. Not preserved by re-parsing
    /// [`AnalysisRecord::line`]: repaired lines read back as single-line.
    pub source: RecordSource,
}

impl AnalysisRecord {
    /// `- Location i (lat: X, lon: Y):`, the prefix every record line starts with
    #[must_use]
    pub fn expected_prefix(location_index: usize, coordinate: &Coordinate) -> String {
        format!("- Location {location_index} {coordinate}:")
    }

    /// Canonical single-line form for the given raw numeric strings
    #[must_use]
    pub fn format_line(
        location_index: usize,
        coordinate: &Coordinate,
        rainfall: &str,
        capacity: &str,
    ) -> String {
        format!(
            "{} Rainfall: {rainfall}mm/year, Capacity: {capacity}M liters",
            Self::expected_prefix(location_index, coordinate)
        )
    }

    /// Comparison line written to the agent log before the recommendation call
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "  - Location {}: Rainfall: {}mm/year, Capacity: {}M liters",
            self.location_index, self.rainfall_mm, self.capacity_m_liters
        )
    }

    /// Record line with the display-only place suffix appended
    #[must_use]
    pub fn enriched_line(&self, country: &str, city: &str) -> String {
        format!("{}, Country: {country}, City: {city}", self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_matches_prompt_contract() {
        let coordinate = Coordinate::new(35.5, -78.3).unwrap();
        assert_eq!(
            AnalysisRecord::format_line(1, &coordinate, "1200", "5"),
            "- Location 1 (lat: 35.5, lon: -78.3): Rainfall: 1200mm/year, Capacity: 5M liters"
        );
    }

    #[test]
    fn test_enriched_line() {
        let coordinate = Coordinate::new(36.0, -79.0).unwrap();
        let record = AnalysisRecord {
            location_index: 2,
            coordinate,
            rainfall_mm: 800.0,
            capacity_m_liters: 3.0,
            line: AnalysisRecord::format_line(2, &coordinate, "800", "3"),
            source: RecordSource::SingleLine,
        };

        assert_eq!(
            record.enriched_line("United States", "Burlington"),
            "- Location 2 (lat: 36.0, lon: -79.0): Rainfall: 800mm/year, Capacity: 3M liters, Country: United States, City: Burlington"
        );
        assert_eq!(
            record.summary_line(),
            "  - Location 2: Rainfall: 800mm/year, Capacity: 3M liters"
        );
    }
}
