//! Sanitized recommendation produced from the second generation

use serde::{Deserialize, Serialize};

/// Text substituted when sanitizing leaves nothing
pub const FALLBACK_RECOMMENDATION: &str =
    "- No recommendation: Failed to generate a valid recommendation.";

/// Text used for analysis-only runs with a single point
pub const RECOMMENDATION_UNAVAILABLE: &str =
    "Recommendation not available: Please select more locations for comparison.";

/// Structural verdict of a run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationRecord {
    Recommended {
        /// 1-based index into the location query
        location_index: usize,
        justification: Option<String>,
    },
    NoRecommendation {
        reason: String,
    },
}

/// Result of sanitizing raw recommendation text.
///
/// At most one accepted recommendation and at most one "no recommendation"
/// verdict survive; both may be present when the generator emitted both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Recommendation {
    /// Kept lines, in original order, joined by newlines
    pub text: String,
    /// First in-range `Recommended` index
    pub recommended_index: Option<usize>,
    /// Justification following the accepted recommendation
    pub justification: Option<String>,
    /// Reason of the first `No recommendation` line
    pub no_recommendation: Option<String>,
    /// Out-of-range indices that were replaced with error lines
    pub rejected_indices: Vec<usize>,
}

impl Recommendation {
    /// Whether sanitizing kept nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Kept text, or the fixed fallback when nothing survived
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            FALLBACK_RECOMMENDATION
        } else {
            &self.text
        }
    }

    /// Collapse to a single verdict, preferring an accepted recommendation
    #[must_use]
    pub fn record(&self) -> RecommendationRecord {
        match (self.recommended_index, &self.no_recommendation) {
            (Some(location_index), _) => RecommendationRecord::Recommended {
                location_index,
                justification: self.justification.clone(),
            },
            (None, Some(reason)) => RecommendationRecord::NoRecommendation {
                reason: reason.clone(),
            },
            (None, None) => RecommendationRecord::NoRecommendation {
                reason: "Failed to generate a valid recommendation.".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_recommendation_falls_back() {
        let recommendation = Recommendation::default();
        assert!(recommendation.is_empty());
        assert_eq!(recommendation.display_text(), FALLBACK_RECOMMENDATION);
        assert_eq!(
            recommendation.record(),
            RecommendationRecord::NoRecommendation {
                reason: "Failed to generate a valid recommendation.".to_string()
            }
        );
    }

    #[test]
    fn test_accepted_recommendation_wins_over_verdict() {
        let recommendation = Recommendation {
            text: "- Recommended: Location 1\n- No recommendation: unsure".to_string(),
            recommended_index: Some(1),
            justification: None,
            no_recommendation: Some("unsure".to_string()),
            rejected_indices: vec![],
        };

        assert!(matches!(
            recommendation.record(),
            RecommendationRecord::Recommended {
                location_index: 1,
                ..
            }
        ));
    }
}
