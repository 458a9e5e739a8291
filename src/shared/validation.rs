use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating usernames
    /// Letters, digits and `@.+-_`, matching what companies type into the
    /// browse "company" filter
    /// - Valid: "john_doe", "acme.corp", "intern+2025", "a-b"
    /// - Invalid: "", "john doe", "name/with/slash"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9@.+_-]+$").unwrap();
}

/// Normalize a free-text filter: trimmed, `None` when blank
pub fn normalize_search(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build an ILIKE pattern for a case-insensitive substring match
pub fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring check matching `contains_pattern` semantics
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
