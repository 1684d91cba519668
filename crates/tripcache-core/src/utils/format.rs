use chrono::{Datelike, NaiveDate};

use crate::models::Tag;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a trip's date span, dropping the repeated year when both ends share it
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format("%b %d, %Y").to_string()
    } else if start.year() == end.year() {
        format!("{} - {}", start.format("%b %d"), end.format("%b %d, %Y"))
    } else {
        format!("{} - {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))
    }
}

pub fn format_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t.name))
        .collect::<Vec<_>>()
        .join(" ")
}
