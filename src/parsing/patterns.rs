//! Line patterns of the generator's record and recommendation formats

use std::sync::LazyLock;

use regex::Regex;

pub(crate) static RAINFALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rainfall: (\d+\.?\d*)mm/year").expect("valid rainfall pattern"));

pub(crate) static CAPACITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Capacity: (\d+\.?\d*)M liters").expect("valid capacity pattern"));

pub(crate) static RECOMMENDED_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Recommended: Location (\d+)").expect("valid recommendation pattern"));

pub(crate) const LOCATION_MARKER: &str = "- Location";
pub(crate) const RAINFALL_MARKER: &str = "- Rainfall:";
pub(crate) const CAPACITY_MARKER: &str = "- Capacity:";

/// Numeric capture of `pattern` in `line`, `"0"` when absent
pub(crate) fn capture_number<'a>(pattern: &Regex, line: &'a str) -> &'a str {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or("0", |m| m.as_str())
}

/// Numeric value of a captured string; never negative, 0 when unparsable
pub(crate) fn to_quantity(text: &str) -> f64 {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Whether a line carries both record fields
pub(crate) fn has_record_fields(line: &str) -> bool {
    line.contains("Rainfall:") && line.contains("Capacity:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Rainfall: 1200mm/year", "1200")]
    #[case("Rainfall: 950.5mm/year", "950.5")]
    #[case("Rainfall: 12.mm/year", "12.")]
    #[case("Rainfall: unknown", "0")]
    #[case("Rainfall: -5mm/year", "0")]
    fn test_capture_rainfall(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(capture_number(&RAINFALL, line), expected);
    }

    #[rstest]
    #[case("1200", 1200.0)]
    #[case("12.", 12.0)]
    #[case("0", 0.0)]
    #[case("", 0.0)]
    fn test_to_quantity(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(to_quantity(text), expected);
    }

    #[test]
    fn test_recommended_index_pattern() {
        let caps = RECOMMENDED_INDEX
            .captures("- Recommended: Location 3 (lat: 1.0, lon: 2.0)")
            .unwrap();
        assert_eq!(&caps[1], "3");
    }
}
