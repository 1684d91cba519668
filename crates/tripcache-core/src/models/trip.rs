use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::journal::{sort_entries, JournalEntry};
use super::tag::Tag;
use crate::error::ValidationError;

/// Reject a range whose end falls before its start.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidDateRange { start, end });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range(self.start_date, self.end_date)
    }

    /// The list projection of this trip
    pub fn summary(&self) -> TripSummary {
        TripSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            cover_image: self.cover_image.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    /// Length of the trip in days, counting both ends
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Reduced projection of [`Trip`] used by the trip list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover_image: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// A trip together with its journal, fetched and cached as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(default)]
    pub logs: Vec<JournalEntry>,
}

impl TripDetail {
    pub fn new(trip: Trip) -> Self {
        Self {
            trip,
            logs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.trip.id
    }

    /// Copy of this detail with the journal in display order.
    pub fn for_display(&self) -> Self {
        let mut detail = self.clone();
        sort_entries(&mut detail.logs);
        detail
    }

    pub fn entry(&self, entry_id: &str) -> Option<&JournalEntry> {
        self.logs.iter().find(|e| e.id == entry_id)
    }
}

/// Partial update of a trip's metadata.
///
/// Only the fields that are `Some` are written; tags and the journal are never
/// touched by a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl TripPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the date range that results from applying this patch on top of
    /// the given current range. Without a current range only a patch carrying
    /// both dates can be checked.
    pub fn validate_against(
        &self,
        current: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<(), ValidationError> {
        let (start, end) = match current {
            Some((start, end)) => (
                self.start_date.unwrap_or(start),
                self.end_date.unwrap_or(end),
            ),
            None => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => (start, end),
                _ => return Ok(()),
            },
        };
        validate_date_range(start, end)
    }

    /// The current values of the fields this patch would overwrite. Applying
    /// the result undoes this patch without touching anything else.
    pub fn revert_for(&self, trip: &Trip) -> TripPatch {
        TripPatch {
            title: self.title.as_ref().map(|_| trip.title.clone()),
            description: self.description.as_ref().map(|_| trip.description.clone()),
            location: self.location.as_ref().map(|_| trip.location.clone()),
            start_date: self.start_date.map(|_| trip.start_date),
            end_date: self.end_date.map(|_| trip.end_date),
            cover_image: self.cover_image.as_ref().map(|_| trip.cover_image.clone()),
        }
    }

    /// Same as [`TripPatch::revert_for`], for the list projection
    pub fn revert_for_summary(&self, summary: &TripSummary) -> TripPatch {
        TripPatch {
            title: self.title.as_ref().map(|_| summary.title.clone()),
            description: self.description.as_ref().map(|_| summary.description.clone()),
            location: self.location.as_ref().map(|_| summary.location.clone()),
            start_date: self.start_date.map(|_| summary.start_date),
            end_date: self.end_date.map(|_| summary.end_date),
            cover_image: self.cover_image.as_ref().map(|_| summary.cover_image.clone()),
        }
    }

    pub fn apply_to_trip(&self, trip: &mut Trip) {
        if let Some(ref title) = self.title {
            trip.title = title.clone();
        }
        if let Some(ref description) = self.description {
            trip.description = description.clone();
        }
        if let Some(ref location) = self.location {
            trip.location = location.clone();
        }
        if let Some(start) = self.start_date {
            trip.start_date = start;
        }
        if let Some(end) = self.end_date {
            trip.end_date = end;
        }
        if let Some(ref cover) = self.cover_image {
            trip.cover_image = cover.clone();
        }
    }

    pub fn apply_to_summary(&self, summary: &mut TripSummary) {
        if let Some(ref title) = self.title {
            summary.title = title.clone();
        }
        if let Some(ref description) = self.description {
            summary.description = description.clone();
        }
        if let Some(ref location) = self.location {
            summary.location = location.clone();
        }
        if let Some(start) = self.start_date {
            summary.start_date = start;
        }
        if let Some(end) = self.end_date {
            summary.end_date = end;
        }
        if let Some(ref cover) = self.cover_image {
            summary.cover_image = cover.clone();
        }
    }
}

/// User input for a trip that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub cover_image: String,
}

impl NewTrip {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range(self.start_date, self.end_date)
    }

    /// New trips start without tags; tags are attached afterwards.
    pub fn into_trip(self, id: String, now: DateTime<Utc>) -> Trip {
        Trip {
            id,
            title: self.title,
            description: self.description,
            location: self.location,
            start_date: self.start_date,
            end_date: self.end_date,
            cover_image: self.cover_image,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
