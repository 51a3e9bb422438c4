//! Reconciles raw analysis text into exactly one record per location.
//!
//! Each location is run through an ordered list of extraction strategies
//! (single line, multi-line reconstruction, zero fill); the first that
//! yields a record wins. The function is pure: log lines are returned, not
//! written anywhere.

use crate::models::{AnalysisRecord, Coordinate, LocationQuery, RecordSource};

use super::patterns::{
    CAPACITY, CAPACITY_MARKER, LOCATION_MARKER, RAINFALL, RAINFALL_MARKER, capture_number,
    has_record_fields, to_quantity,
};

/// Outcome of reconciling one analysis generation
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParse {
    /// Exactly one record per location, in input order
    pub records: Vec<AnalysisRecord>,
    /// Well-formed single-line records found before reconciliation
    pub raw_record_count: usize,
    /// Locations whose single-line record was found under their own prefix
    pub matched_record_count: usize,
    /// Generator output did not hold exactly one matching record line per
    /// location
    pub count_mismatch: bool,
    /// Human-readable notes for the agent log
    pub log: Vec<String>,
}

impl AnalysisParse {
    /// Number of locations the generator output is reported to contain.
    ///
    /// The raw line count when it is off; otherwise the matched count, which
    /// catches duplicated lines and lines carrying the wrong coordinates.
    #[must_use]
    pub fn reported_count(&self) -> usize {
        if self.raw_record_count == self.records.len() {
            self.matched_record_count
        } else {
            self.raw_record_count
        }
    }

    /// Marker line embedded in the analysis text when counts disagree
    #[must_use]
    pub fn mismatch_marker(&self) -> Option<String> {
        self.count_mismatch.then(|| {
            format!(
                "- Error: Analysis includes {} locations, but {} were provided.",
                self.reported_count(),
                self.records.len()
            )
        })
    }

    /// Record lines joined by newlines
    #[must_use]
    pub fn text(&self) -> String {
        self.records
            .iter()
            .map(|r| r.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The location a strategy is looking for
struct Target<'a> {
    index: usize,
    coordinate: &'a Coordinate,
    prefix: String,
}

/// Raw generator output split once for all strategies
struct AnalysisText<'a> {
    lines: Vec<&'a str>,
    record_lines: Vec<&'a str>,
}

impl<'a> AnalysisText<'a> {
    fn new(raw: &'a str) -> Self {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let record_lines = lines
            .iter()
            .copied()
            .filter(|line| line.starts_with(LOCATION_MARKER) && has_record_fields(line))
            .collect();
        Self {
            lines,
            record_lines,
        }
    }
}

enum Extraction {
    Found {
        line: String,
        rainfall: String,
        capacity: String,
    },
    Missing,
}

trait ExtractionStrategy {
    fn source(&self) -> RecordSource;
    fn extract(&self, target: &Target<'_>, text: &AnalysisText<'_>) -> Extraction;
}

/// `- Location i (lat: X, lon: Y): Rainfall: ..., Capacity: ...` on one line
struct SingleLineRecord;

impl ExtractionStrategy for SingleLineRecord {
    fn source(&self) -> RecordSource {
        RecordSource::SingleLine
    }

    fn extract(&self, target: &Target<'_>, text: &AnalysisText<'_>) -> Extraction {
        match text
            .record_lines
            .iter()
            .find(|line| line.starts_with(&target.prefix))
        {
            Some(line) => Extraction::Found {
                line: (*line).to_string(),
                rainfall: capture_number(&RAINFALL, line).to_string(),
                capacity: capture_number(&CAPACITY, line).to_string(),
            },
            None => Extraction::Missing,
        }
    }
}

/// Location line followed by `- Rainfall:` and `- Capacity:` sub-bullets
struct MultiLineRecord;

impl ExtractionStrategy for MultiLineRecord {
    fn source(&self) -> RecordSource {
        RecordSource::MultiLine
    }

    fn extract(&self, target: &Target<'_>, text: &AnalysisText<'_>) -> Extraction {
        let mut in_target = false;
        let mut rainfall: Option<&str> = None;

        for line in &text.lines {
            if line.starts_with(&target.prefix) {
                in_target = true;
                rainfall = line
                    .contains("Rainfall:")
                    .then(|| capture_number(&RAINFALL, line));
            } else if line.starts_with(LOCATION_MARKER) {
                in_target = false;
                rainfall = None;
            } else if in_target && line.starts_with(RAINFALL_MARKER) {
                rainfall = Some(capture_number(&RAINFALL, line));
            } else if in_target && line.starts_with(CAPACITY_MARKER) {
                if let Some(rainfall) = rainfall {
                    let capacity = capture_number(&CAPACITY, line);
                    return Extraction::Found {
                        line: AnalysisRecord::format_line(
                            target.index,
                            target.coordinate,
                            rainfall,
                            capacity,
                        ),
                        rainfall: rainfall.to_string(),
                        capacity: capacity.to_string(),
                    };
                }
            }
        }

        Extraction::Missing
    }
}

/// Zero-valued record for a location the generator skipped
struct ZeroRecord;

impl ExtractionStrategy for ZeroRecord {
    fn source(&self) -> RecordSource {
        RecordSource::Synthesized
    }

    fn extract(&self, target: &Target<'_>, _text: &AnalysisText<'_>) -> Extraction {
        Extraction::Found {
            line: AnalysisRecord::format_line(target.index, target.coordinate, "0", "0"),
            rainfall: "0".to_string(),
            capacity: "0".to_string(),
        }
    }
}

const STRATEGIES: [&dyn ExtractionStrategy; 3] = [&SingleLineRecord, &MultiLineRecord, &ZeroRecord];

/// Turn raw analysis text into exactly `locations.len()` records.
#[must_use]
pub fn parse_analysis(raw: &str, locations: &LocationQuery) -> AnalysisParse {
    let text = AnalysisText::new(raw);
    let mut records = Vec::with_capacity(locations.len());
    let mut log = Vec::new();

    for (index, coordinate) in locations.indexed() {
        let target = Target {
            index,
            coordinate,
            prefix: AnalysisRecord::expected_prefix(index, coordinate),
        };

        for strategy in STRATEGIES {
            let Extraction::Found {
                line,
                rainfall,
                capacity,
            } = strategy.extract(&target, &text)
            else {
                continue;
            };

            let source = strategy.source();
            match source {
                RecordSource::SingleLine => {}
                RecordSource::MultiLine => log.push(format!(
                    "⚠️ Location {index}: reconstructed from multi-line output."
                )),
                RecordSource::Synthesized => log.push(format!(
                    "⚠️ Location {index}: no estimate found, defaulting to 0mm/year and 0M liters."
                )),
            }

            records.push(AnalysisRecord {
                location_index: index,
                coordinate: *coordinate,
                rainfall_mm: to_quantity(&rainfall),
                capacity_m_liters: to_quantity(&capacity),
                line,
                source,
            });
            break;
        }
    }

    let raw_record_count = text.record_lines.len();
    let matched_record_count = records
        .iter()
        .filter(|r| r.source == RecordSource::SingleLine)
        .count();
    let count_mismatch =
        raw_record_count != locations.len() || matched_record_count != locations.len();

    let mut parse = AnalysisParse {
        records,
        raw_record_count,
        matched_record_count,
        count_mismatch,
        log,
    };
    if count_mismatch {
        let entry = format!(
            "❌ Error: Analysis includes {} locations, but {} were provided.",
            parse.reported_count(),
            locations.len()
        );
        parse.log.push(entry);
    }
    parse
}
