//! Small numeric and text helpers shared by the query operations.

/// Share of `count` in `total` as a percentage rounded to two decimals.
///
/// Returns `0.0` when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to_hundredths(count as f64 / total as f64 * 100.0)
}

/// Round to two decimal places.
///
/// Rounds the exact binary value of `value`, so `3.575` (stored just below
/// the tie) becomes `3.57`; exact ties go to the even digit.
pub fn round_to_hundredths(value: f64) -> f64 {
    // `{:.2}` formats the exact decimal expansion with ties-to-even.
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Case-insensitive containment test; `needle_lower` must already be lowercased.
pub fn contains_lowercased(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Length of `text` in Unicode scalar values.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
