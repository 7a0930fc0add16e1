//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Returns the first duplicated value, if any.
pub fn first_duplicate<T: Eq + std::hash::Hash + Copy>(values: &[T]) -> Option<T> {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values.iter().copied().find(|value| !seen.insert(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" ~/cards.db ".to_string())),
            Some("~/cards.db".to_string())
        );
    }

    #[test]
    fn first_duplicate_finds_repeated_value() {
        assert_eq!(first_duplicate(&[1, 2, 3]), None);
        assert_eq!(first_duplicate(&[1, 2, 1, 2]), Some(1));
    }

    #[test]
    fn unix_millis_now_is_positive() {
        assert!(unix_millis_now() > 0);
    }
}
