use crate::model::Record;

/// Normalize a string for case-insensitive matching.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// Lowercased query, or None when the query matches everything.
pub fn normalize_query(query: &str) -> Option<String> {
    if query.is_empty() {
        None
    } else {
        Some(normalize(query))
    }
}

/// Substring match of an already-normalized query against the display name.
pub fn matches(record: &Record, normalized_query: &str) -> bool {
    normalize(&record.director_full_name).contains(normalized_query)
}
