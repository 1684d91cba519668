//! Utility functions for display formatting.

pub mod format;

pub use format::{format_date_range, format_tags, truncate_string};
