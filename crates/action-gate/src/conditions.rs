//! Value comparison for applied filters

use crate::types::FilterSpec;

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Whether `actual` satisfies the filter: trimmed, case-insensitive match
/// against the desired value or any accepted equivalent. Empty never matches.
pub fn value_matches(spec: &FilterSpec, actual: Option<&str>) -> bool {
    let Some(actual) = actual.map(normalize).filter(|value| !value.is_empty()) else {
        return false;
    };
    std::iter::once(&spec.desired_value)
        .chain(spec.accepted_equivalents.iter())
        .any(|accepted| normalize(accepted) == actual)
}

/// Exact comparison after trimming, used for date fields in dialog forms
pub fn text_matches(expected: &str, actual: Option<&str>) -> bool {
    actual.map(str::trim) == Some(expected.trim())
}
