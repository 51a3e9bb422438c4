//! Filters raw recommendation text down to one validated verdict.

use crate::models::Recommendation;

use super::patterns::RECOMMENDED_INDEX;

const RECOMMENDED_MARKER: &str = "Recommended: Location";
const JUSTIFICATION_MARKER: &str = "Justification:";
const NO_RECOMMENDATION_MARKER: &str = "No recommendation:";

/// Sanitize a raw recommendation for a query of `location_count` points.
///
/// The first in-range `Recommended` line is accepted and every later one is
/// ignored. Out-of-range indices seen before that are replaced by an error
/// line. Only the first justification after an accepted recommendation is
/// kept, and only the first `No recommendation` line survives. Everything else is
/// dropped. Kept lines stay in their original order.
#[must_use]
pub fn sanitize_recommendation(raw: &str, location_count: usize) -> Recommendation {
    let mut kept: Vec<String> = Vec::new();
    let mut recommendation = Recommendation::default();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let body = line.trim_start_matches(['-', '*']).trim_start();

        if body.starts_with(RECOMMENDED_MARKER) {
            if recommendation.recommended_index.is_some() {
                continue;
            }
            let Some(digits) = RECOMMENDED_INDEX
                .captures(body)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            else {
                continue;
            };

            match digits.parse::<usize>() {
                Ok(index) if (1..=location_count).contains(&index) => {
                    recommendation.recommended_index = Some(index);
                    kept.push(line.to_string());
                }
                parsed => {
                    if let Ok(index) = parsed {
                        recommendation.rejected_indices.push(index);
                    }
                    tracing::warn!(
                        "Discarding recommendation for Location {} outside 1..={}",
                        digits,
                        location_count
                    );
                    kept.push(format!(
                        "- Error: Invalid recommendation for Location {digits}. Only Locations 1 to {location_count} were provided."
                    ));
                }
            }
        } else if let Some(justification) = body.strip_prefix(JUSTIFICATION_MARKER) {
            if recommendation.recommended_index.is_some() && recommendation.justification.is_none()
            {
                recommendation.justification = Some(justification.trim().to_string());
                kept.push(line.to_string());
            }
        } else if let Some(reason) = body.strip_prefix(NO_RECOMMENDATION_MARKER) {
            if recommendation.no_recommendation.is_none() {
                recommendation.no_recommendation = Some(reason.trim().to_string());
                kept.push(line.to_string());
            }
        }
    }

    recommendation.text = kept.join("\n");
    recommendation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecommendationRecord;
    use rstest::rstest;

    #[test]
    fn test_valid_recommendation_with_justification() {
        let raw = "Based on the analysis:\n\
                   - Recommended: Location 1 (lat: 35.5, lon: -78.3)\n\
                   - Justification: Highest capacity (5M liters) compared to Location 2 (3M liters).";

        let recommendation = sanitize_recommendation(raw, 2);

        assert_eq!(recommendation.recommended_index, Some(1));
        assert_eq!(
            recommendation.text,
            "- Recommended: Location 1 (lat: 35.5, lon: -78.3)\n\
             - Justification: Highest capacity (5M liters) compared to Location 2 (3M liters)."
        );
        assert_eq!(
            recommendation.record(),
            RecommendationRecord::Recommended {
                location_index: 1,
                justification: Some(
                    "Highest capacity (5M liters) compared to Location 2 (3M liters).".to_string()
                ),
            }
        );
    }

    #[test]
    fn test_out_of_range_index_becomes_error_line() {
        let recommendation = sanitize_recommendation("- Recommended: Location 3\n- Justification: x", 2);

        assert_eq!(
            recommendation.text,
            "- Error: Invalid recommendation for Location 3. Only Locations 1 to 2 were provided."
        );
        assert_eq!(recommendation.recommended_index, None);
        assert_eq!(recommendation.justification, None);
        assert_eq!(recommendation.rejected_indices, vec![3]);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(42)]
    fn test_invalid_index_never_accepted(#[case] index: usize) {
        let raw = format!("- Recommended: Location {index}");
        let recommendation = sanitize_recommendation(&raw, 5);
        assert_eq!(recommendation.recommended_index, None);
        assert!(recommendation.text.starts_with("- Error: Invalid recommendation"));
    }

    #[test]
    fn test_later_justifications_are_dropped() {
        let raw = "- Recommended: Location 1\n\
                   - Justification: Highest capacity.\n\
                   - Justification: Also the wettest.\n\
                   - Justification: Closest to town.";

        let recommendation = sanitize_recommendation(raw, 2);

        assert_eq!(
            recommendation
                .text
                .lines()
                .filter(|l| l.contains("Justification:"))
                .count(),
            1
        );
        assert_eq!(
            recommendation.text,
            "- Recommended: Location 1\n- Justification: Highest capacity."
        );
        assert_eq!(recommendation.justification.as_deref(), Some("Highest capacity."));
    }

    #[test]
    fn test_first_valid_recommendation_wins() {
        let raw = "- Recommended: Location 2\n\
                   - Justification: first\n\
                   - Recommended: Location 1\n\
                   - Recommended: Location 9\n\
                   - Justification: second";

        let recommendation = sanitize_recommendation(raw, 3);

        assert_eq!(recommendation.recommended_index, Some(2));
        assert_eq!(
            recommendation.text,
            "- Recommended: Location 2\n- Justification: first"
        );
        assert_eq!(recommendation.justification.as_deref(), Some("first"));
        assert_eq!(
            recommendation
                .text
                .lines()
                .filter(|l| l.contains("Recommended:"))
                .count(),
            1
        );
    }

    #[test]
    fn test_invalid_then_valid_recommendation() {
        let raw = "- Recommended: Location 7\n- Recommended: Location 2\n- Justification: ok";

        let recommendation = sanitize_recommendation(raw, 2);

        assert_eq!(recommendation.recommended_index, Some(2));
        assert_eq!(
            recommendation.text,
            "- Error: Invalid recommendation for Location 7. Only Locations 1 to 2 were provided.\n\
             - Recommended: Location 2\n\
             - Justification: ok"
        );
    }

    #[test]
    fn test_only_first_no_recommendation_kept() {
        let raw = "- No recommendation: all sites are dry\n- No recommendation: again";

        let recommendation = sanitize_recommendation(raw, 2);

        assert_eq!(recommendation.text, "- No recommendation: all sites are dry");
        assert_eq!(
            recommendation.record(),
            RecommendationRecord::NoRecommendation {
                reason: "all sites are dry".to_string()
            }
        );
    }

    #[test]
    fn test_recommended_and_no_recommendation_may_coexist() {
        let raw = "- No recommendation: unsure\n- Recommended: Location 1\n- No recommendation: later";

        let recommendation = sanitize_recommendation(raw, 2);

        assert_eq!(
            recommendation.text,
            "- No recommendation: unsure\n- Recommended: Location 1"
        );
        assert_eq!(recommendation.recommended_index, Some(1));
        assert_eq!(recommendation.no_recommendation.as_deref(), Some("unsure"));
    }

    #[test]
    fn test_unattributable_and_unknown_lines_dropped() {
        let raw = "- Justification: nothing to justify\nRandom chatter\n- Recommended: Location X";

        let recommendation = sanitize_recommendation(raw, 2);

        assert!(recommendation.is_empty());
        assert_eq!(
            recommendation.display_text(),
            crate::models::recommendation::FALLBACK_RECOMMENDATION
        );
    }

    #[test]
    fn test_unbulleted_lines_are_recognised() {
        let recommendation =
            sanitize_recommendation("Recommended: Location 2\nJustification: more water", 2);

        assert_eq!(recommendation.recommended_index, Some(2));
        assert_eq!(
            recommendation.text,
            "Recommended: Location 2\nJustification: more water"
        );
    }
}
