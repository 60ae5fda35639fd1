//! Predicates for the in-memory filter stage. A blank filter value matches
//! everything.

/// Empty strings count as "not supplied".
pub fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Partial-update helper: `Some` only for non-empty input.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn contains(value: &str, needle: &Option<String>) -> bool {
    provided(needle).map_or(true, |n| value.contains(n))
}

pub fn contains_ignore_case(value: &str, needle: &Option<String>) -> bool {
    provided(needle).map_or(true, |n| value.to_lowercase().contains(&n.to_lowercase()))
}

pub fn equals(value: &str, needle: &Option<String>) -> bool {
    provided(needle).map_or(true, |n| value == n)
}

pub fn equals_ignore_case(value: &str, needle: &Option<String>) -> bool {
    provided(needle).map_or(true, |n| value.to_lowercase() == n.to_lowercase())
}

/// Numeric filters only apply to strictly positive values.
pub fn positive_equals(value: i32, needle: Option<i32>) -> bool {
    match needle {
        Some(n) if n > 0 => value == n,
        _ => true,
    }
}
