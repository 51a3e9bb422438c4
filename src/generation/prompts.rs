//! Prompt templates for the two generation steps

use crate::models::LocationQuery;

/// A rendered-on-demand prompt and the variables it needs
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// Per-location rainfall and capacity estimates
    Analysis {
        locations: String,
        num_locations: usize,
    },
    /// One recommendation from the reconciled analysis lines
    Recommendation {
        analysis: String,
        num_locations: usize,
    },
}

impl Prompt {
    #[must_use]
    pub fn analysis(query: &LocationQuery) -> Self {
        Self::Analysis {
            locations: query.prompt_text(),
            num_locations: query.len(),
        }
    }

    #[must_use]
    pub fn recommendation(analysis: impl Into<String>, num_locations: usize) -> Self {
        Self::Recommendation {
            analysis: analysis.into(),
            num_locations,
        }
    }

    /// Stable identifier of the template, used in logs
    #[must_use]
    pub fn template_id(&self) -> &'static str {
        match self {
            Self::Analysis { .. } => "analysis",
            Self::Recommendation { .. } => "recommendation",
        }
    }

    /// Full prompt text sent to the generator
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Analysis {
                locations,
                num_locations,
            } => format!(
                "Analyze these locations for water reservoir potential. You must only analyze the {num_locations} location(s) provided below. Do not generate or analyze any additional locations beyond Location {num_locations}. For each, provide:
- Rainfall: <value>mm/year (e.g., 1200mm/year)
- Capacity: <value>M liters (e.g., 5M liters)
Format as a single line per location with `-`. Example:
- Location 1 (lat: 35.5, lon: -78.3): Rainfall: 1200mm/year, Capacity: 5M liters
- Location 2 (lat: 36.0, lon: -79.0): Rainfall: 800mm/year, Capacity: 3M liters
Provide exactly one line per location, do not use sub-bullets, and do not skip fields or deviate from this format:
{locations}"
            ),
            Self::Recommendation {
                analysis,
                num_locations,
            } => format!(
                "Recommend the best location for a water reservoir based on this analysis. You must recommend exactly one location from the locations listed in the analysis (Locations 1 to {num_locations}). Do not recommend any other locations, and do not provide \"No recommendation\" for other locations. Prioritize the location with the highest capacity (in M liters). If there is a tie in capacity, use rainfall (in mm/year) as the tiebreaker. Provide exactly:
- Recommended: Location X (lat: Y, lon: Z)
- Justification: <reason based primarily on capacity, using rainfall only as a tiebreaker, comparing all locations>
Format as bullet points with `-`. Example:
- Recommended: Location 1 (lat: 35.5, lon: -78.3)
- Justification: Highest capacity (5M liters) compared to Location 2 (3M liters). Rainfall of 1200mm/year is sufficient.
If no suitable location is found, state exactly once:
- No recommendation: <reason>
Analysis:
{analysis}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    #[test]
    fn test_analysis_prompt_lists_locations() {
        let query = LocationQuery::try_from(vec![
            Coordinate::new(35.5, -78.3).unwrap(),
            Coordinate::new(36.0, -79.0).unwrap(),
        ])
        .unwrap();

        let prompt = Prompt::analysis(&query);
        let text = prompt.render();

        assert_eq!(prompt.template_id(), "analysis");
        assert!(text.contains("only analyze the 2 location(s)"));
        assert!(text.contains("beyond Location 2."));
        assert!(text.ends_with(
            "Location 1: (lat: 35.5, lon: -78.3)\nLocation 2: (lat: 36.0, lon: -79.0)"
        ));
    }

    #[test]
    fn test_recommendation_prompt_carries_analysis() {
        let prompt = Prompt::recommendation("- Location 1 ...", 3);
        let text = prompt.render();

        assert_eq!(prompt.template_id(), "recommendation");
        assert!(text.contains("(Locations 1 to 3)"));
        assert!(text.contains("highest capacity"));
        assert!(text.ends_with("Analysis:\n- Location 1 ..."));
    }
}
