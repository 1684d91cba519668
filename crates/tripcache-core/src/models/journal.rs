use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum number of photos attached to a single journal entry.
pub const MAX_ENTRY_IMAGES: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    // Older payloads call the owning trip a "travel"
    #[serde(alias = "travelId")]
    pub trip_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub content: String,
    /// Image references in display order, usually inline data URIs
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub mood: String,
}

/// User input for creating or editing a journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub date: NaiveDate,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub mood: String,
}

impl EntryDraft {
    pub fn new(date: NaiveDate, content: impl Into<String>) -> Self {
        Self {
            date,
            content: content.into(),
            images: Vec::new(),
            location: String::new(),
            weather: String::new(),
            mood: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.images.len() > MAX_ENTRY_IMAGES {
            return Err(ValidationError::TooManyImages {
                count: self.images.len(),
                max: MAX_ENTRY_IMAGES,
            });
        }
        Ok(())
    }

    /// Build the entry, trimming free-text descriptors the way the form does.
    pub fn into_entry(self, id: String, trip_id: String) -> JournalEntry {
        JournalEntry {
            id,
            trip_id,
            date: self.date,
            content: self.content.trim().to_string(),
            images: self.images,
            location: self.location.trim().to_string(),
            weather: self.weather.trim().to_string(),
            mood: self.mood.trim().to_string(),
        }
    }
}

/// Order entries by ascending date. The sort is stable, so entries sharing a
/// date keep their insertion order.
pub fn sort_entries(entries: &mut [JournalEntry]) {
    entries.sort_by_key(|e| e.date);
}
