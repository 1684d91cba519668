//! Optimistic mutations.
//!
//! Most writes are applied to the cache first and sent to the store second;
//! a failed call puts the cache back. Deleting a trip or an entry is the
//! exception: the store call comes first and the cache only follows on
//! success. Tag edits never leave the cache.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::queries::TripQueries;
use crate::api::{RemoteStore, StoreError};
use crate::cache::{EntityCache, QueryData, QueryKey};
use crate::error::{TripError, ValidationError};
use crate::models::tag::{validate_attach, validate_new_tag_name};
use crate::models::{
    generate_id, EntryDraft, JournalEntry, NewTrip, Tag, Trip, TripDetail, TripPatch, TripSummary,
    DEFAULT_TAG_COLOR,
};

/// Where the view should go after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    TripList,
}

/// The user's answer to a destructive prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDeletion {
    Deleted,
    Cancelled,
}

#[derive(Clone)]
pub struct MutationCoordinator {
    queries: TripQueries,
}

impl MutationCoordinator {
    pub fn new(queries: TripQueries) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &TripQueries {
        &self.queries
    }

    fn cache(&self) -> &EntityCache {
        self.queries.cache()
    }

    fn store(&self) -> &Arc<dyn RemoteStore> {
        self.queries.store()
    }

    // ===== Trips =====

    /// Create a trip under a locally generated id. It shows up in the cached
    /// list right away and disappears again if the store rejects it.
    pub async fn add_trip(&self, new_trip: NewTrip) -> Result<Trip, TripError> {
        new_trip.validate()?;
        let trip = new_trip.into_trip(generate_id(), Utc::now());
        let detail_key = QueryKey::detail(&trip.id);

        let summary = trip.summary();
        self.cache().merge(&QueryKey::TripList, |data| {
            if let Some(list) = data.as_trip_list_mut() {
                list.push(summary);
            }
        });
        self.cache().set(
            detail_key.clone(),
            QueryData::TripDetail(TripDetail::new(trip.clone())),
        );
        info!(trip_id = %trip.id, title = %trip.title, "Adding trip");

        match self.store().create_trip(&trip).await {
            Ok(_) => Ok(trip),
            Err(e) => {
                warn!(trip_id = %trip.id, error = %e, "Create failed, rolling back");
                self.remove_summary(&trip.id);
                self.cache().remove(&detail_key);
                Err(e.into())
            }
        }
    }

    /// Patch a trip's metadata. Tags and journal entries are left as they are.
    pub async fn update_trip(&self, id: &str, patch: TripPatch) -> Result<TripDetail, TripError> {
        let detail_key = QueryKey::detail(id);
        let mut cached_trip = self.queries.cached_trip(id).map(|d| d.trip);
        let cached_summary = self
            .queries
            .cached_trips()
            .and_then(|list| list.into_iter().find(|s| s.id == id));

        // A single date can only be checked against the other one
        let one_date = patch.start_date.is_some() != patch.end_date.is_some();
        if one_date && cached_trip.is_none() && cached_summary.is_none() {
            cached_trip = Some(self.queries.trip(id).await?.trip);
        }

        let current_range = cached_trip
            .as_ref()
            .map(|t| (t.start_date, t.end_date))
            .or_else(|| cached_summary.as_ref().map(|s| (s.start_date, s.end_date)));
        patch.validate_against(current_range)?;

        let trip_revert = cached_trip
            .as_ref()
            .map(|t| (patch.revert_for(t), t.updated_at));
        let summary_revert = cached_summary
            .as_ref()
            .map(|s| patch.revert_for_summary(s));

        let now = Utc::now();
        self.cache().merge(&detail_key, |data| {
            if let Some(detail) = data.as_trip_detail_mut() {
                patch.apply_to_trip(&mut detail.trip);
                detail.trip.updated_at = now;
            }
        });
        self.merge_summary(id, |summary| patch.apply_to_summary(summary));
        info!(trip_id = %id, "Updating trip");

        match self.store().update_trip(id, &patch).await {
            Ok(_) => match self.queries.cached_trip(id) {
                Some(detail) => Ok(detail.for_display()),
                None => self.queries.trip(id).await,
            },
            Err(e @ StoreError::NotFound(_)) => {
                warn!(trip_id = %id, "Trip is gone, invalidating");
                self.cache().invalidate(&detail_key);
                self.cache().invalidate(&QueryKey::TripList);
                Err(e.into())
            }
            Err(e) => {
                warn!(trip_id = %id, error = %e, "Update failed, restoring previous values");
                if let Some((revert, updated_at)) = trip_revert {
                    self.cache().merge(&detail_key, |data| {
                        if let Some(detail) = data.as_trip_detail_mut() {
                            revert.apply_to_trip(&mut detail.trip);
                            detail.trip.updated_at = updated_at;
                        }
                    });
                }
                if let Some(revert) = summary_revert {
                    self.merge_summary(id, |summary| revert.apply_to_summary(summary));
                }
                Err(e.into())
            }
        }
    }

    /// Delete a trip and its journal. Nothing changes locally until the store
    /// confirms.
    pub async fn delete_trip(&self, id: &str) -> Result<Navigation, TripError> {
        let detail_key = QueryKey::detail(id);
        info!(trip_id = %id, "Deleting trip");

        match self.store().delete_trip(id).await {
            Ok(()) => {
                self.remove_summary(id);
                self.cache().invalidate(&QueryKey::TripList);
                self.cache().remove(&detail_key);
                Ok(Navigation::TripList)
            }
            Err(e @ StoreError::NotFound(_)) => {
                warn!(trip_id = %id, "Trip to delete does not exist");
                self.cache().invalidate(&detail_key);
                Err(e.into())
            }
            Err(e) => {
                warn!(trip_id = %id, error = %e, "Delete failed");
                Err(e.into())
            }
        }
    }

    // ===== Journal entries =====

    pub async fn add_entry(
        &self,
        trip_id: &str,
        draft: EntryDraft,
    ) -> Result<JournalEntry, TripError> {
        draft.validate()?;
        let entry = draft.into_entry(generate_id(), trip_id.to_string());
        let key = QueryKey::detail(trip_id);

        let pending = entry.clone();
        self.cache().merge(&key, |data| {
            if let Some(detail) = data.as_trip_detail_mut() {
                detail.logs.push(pending);
            }
        });
        debug!(trip_id = %trip_id, entry_id = %entry.id, "Adding entry");

        match self.store().save_entry(&entry).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                warn!(trip_id = %trip_id, entry_id = %entry.id, error = %e, "Save failed, rolling back");
                self.remove_entry(&key, &entry.id);
                if matches!(e, StoreError::NotFound(_)) {
                    self.cache().invalidate(&key);
                }
                Err(e.into())
            }
        }
    }

    /// Replace an entry in place, keeping its position in the journal.
    pub async fn update_entry(
        &self,
        trip_id: &str,
        entry_id: &str,
        draft: EntryDraft,
    ) -> Result<JournalEntry, TripError> {
        draft.validate()?;
        let entry = draft.into_entry(entry_id.to_string(), trip_id.to_string());
        let key = QueryKey::detail(trip_id);
        let detail = match self.queries.cached_trip(trip_id) {
            Some(detail) => detail,
            None => self.queries.trip(trip_id).await?,
        };
        let previous = detail
            .entry(entry_id)
            .cloned()
            .ok_or_else(|| StoreError::entry_not_found(trip_id, entry_id))?;

        self.replace_entry(&key, entry.clone());
        debug!(trip_id = %trip_id, entry_id = %entry_id, "Updating entry");

        match self.store().save_entry(&entry).await {
            Ok(saved) => Ok(saved),
            Err(e @ StoreError::NotFound(_)) => {
                warn!(trip_id = %trip_id, entry_id = %entry_id, "Entry owner is gone, invalidating");
                self.cache().invalidate(&key);
                Err(e.into())
            }
            Err(e) => {
                warn!(trip_id = %trip_id, entry_id = %entry_id, error = %e, "Save failed, restoring entry");
                self.replace_entry(&key, previous);
                Err(e.into())
            }
        }
    }

    pub async fn delete_entry(
        &self,
        trip_id: &str,
        entry_id: &str,
        confirmation: Confirmation,
    ) -> Result<EntryDeletion, TripError> {
        if confirmation == Confirmation::Declined {
            debug!(trip_id = %trip_id, entry_id = %entry_id, "Entry deletion cancelled");
            return Ok(EntryDeletion::Cancelled);
        }

        let key = QueryKey::detail(trip_id);
        match self.store().delete_entry(trip_id, entry_id).await {
            Ok(()) => {
                self.remove_entry(&key, entry_id);
                info!(trip_id = %trip_id, entry_id = %entry_id, "Entry deleted");
                Ok(EntryDeletion::Deleted)
            }
            Err(e @ StoreError::NotFound(_)) => {
                warn!(trip_id = %trip_id, entry_id = %entry_id, "Entry to delete does not exist");
                self.cache().invalidate(&key);
                Err(e.into())
            }
            Err(e) => {
                warn!(trip_id = %trip_id, entry_id = %entry_id, error = %e, "Entry delete failed");
                Err(e.into())
            }
        }
    }

    // ===== Tags =====

    /// Add a tag to the catalog. `color` falls back to the default tag color.
    pub async fn create_tag(&self, name: &str, color: Option<&str>) -> Result<Tag, TripError> {
        let existing = self.queries.tags().await?;
        let name = validate_new_tag_name(&existing, name)?;
        let tag = Tag::new(generate_id(), name, color.unwrap_or(DEFAULT_TAG_COLOR));

        // Re-checked under the cache lock in case the catalog changed meanwhile
        let mut outcome: Result<(), ValidationError> = Ok(());
        let added = tag.clone();
        let merged = self.cache().merge(&QueryKey::Tags, |data| {
            if let Some(tags) = data.as_tags_mut() {
                outcome = validate_new_tag_name(tags, &added.name).map(|_| ());
                if outcome.is_ok() {
                    tags.push(added);
                }
            }
        });
        outcome?;
        if !merged {
            let mut tags = existing;
            tags.push(tag.clone());
            self.cache().set(QueryKey::Tags, QueryData::Tags(tags));
        }

        info!(tag_id = %tag.id, name = %tag.name, "Created tag");
        Ok(tag)
    }

    /// Attach a catalog tag to a trip and return the trip's tags. Attaching a
    /// tag that is already there changes nothing.
    pub async fn add_tag(&self, trip_id: &str, tag_id: &str) -> Result<Vec<Tag>, TripError> {
        let tag = self
            .queries
            .tags()
            .await?
            .into_iter()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| ValidationError::UnknownTag(tag_id.to_string()))?;

        let detail = self.queries.trip(trip_id).await?;
        if detail.trip.has_tag(tag_id) {
            debug!(trip_id = %trip_id, tag_id = %tag_id, "Tag already attached");
            return Ok(detail.trip.tags);
        }
        validate_attach(&detail.trip.tags, &tag)?;

        let mut outcome = None;
        self.cache().merge(&QueryKey::detail(trip_id), |data| {
            if let Some(detail) = data.as_trip_detail_mut() {
                let trip = &mut detail.trip;
                outcome = Some(if trip.has_tag(&tag.id) {
                    Ok(trip.tags.clone())
                } else {
                    validate_attach(&trip.tags, &tag).map(|()| {
                        trip.tags.push(tag.clone());
                        trip.tags.clone()
                    })
                });
            }
        });

        let tags = outcome.ok_or_else(|| StoreError::trip_not_found(trip_id))??;
        info!(trip_id = %trip_id, tag_id = %tag_id, "Tag attached");
        Ok(tags)
    }

    pub async fn remove_tag(&self, trip_id: &str, tag_id: &str) -> Result<Vec<Tag>, TripError> {
        self.queries.trip(trip_id).await?;

        let mut remaining = None;
        self.cache().merge(&QueryKey::detail(trip_id), |data| {
            if let Some(detail) = data.as_trip_detail_mut() {
                detail.trip.tags.retain(|t| t.id != tag_id);
                remaining = Some(detail.trip.tags.clone());
            }
        });

        let tags = remaining.ok_or_else(|| StoreError::trip_not_found(trip_id))?;
        debug!(trip_id = %trip_id, tag_id = %tag_id, "Tag detached");
        Ok(tags)
    }

    // ===== Cache helpers =====

    fn merge_summary<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut TripSummary),
    {
        self.cache().merge(&QueryKey::TripList, |data| {
            if let Some(summary) = data
                .as_trip_list_mut()
                .and_then(|list| list.iter_mut().find(|s| s.id == id))
            {
                f(summary);
            }
        });
    }

    fn remove_summary(&self, id: &str) {
        self.cache().merge(&QueryKey::TripList, |data| {
            if let Some(list) = data.as_trip_list_mut() {
                list.retain(|s| s.id != id);
            }
        });
    }

    fn replace_entry(&self, key: &QueryKey, entry: JournalEntry) {
        self.cache().merge(key, |data| {
            if let Some(slot) = data
                .as_trip_detail_mut()
                .and_then(|d| d.logs.iter_mut().find(|e| e.id == entry.id))
            {
                *slot = entry;
            }
        });
    }

    fn remove_entry(&self, key: &QueryKey, entry_id: &str) {
        self.cache().merge(key, |data| {
            if let Some(detail) = data.as_trip_detail_mut() {
                detail.logs.retain(|e| e.id != entry_id);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryStore, StoreOp};
    use crate::models::MAX_TRIP_TAGS;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, MutationCoordinator) {
        let store = Arc::new(MemoryStore::with_sample_data());
        let queries = TripQueries::new(store.clone(), EntityCache::default());
        (store, MutationCoordinator::new(queries))
    }

    fn new_trip(title: &str) -> NewTrip {
        NewTrip {
            title: title.to_string(),
            description: String::new(),
            location: "Busan".to_string(),
            start_date: date("2024-09-01"),
            end_date: date("2024-09-03"),
            cover_image: String::new(),
        }
    }

    fn unavailable() -> StoreError {
        StoreError::Unavailable("connection reset".to_string())
    }

    // ----- trips -----

    #[tokio::test]
    async fn test_add_trip_appears_in_list() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();

        let trip = coordinator.add_trip(new_trip("Busan")).await.unwrap();

        let list = coordinator.queries().cached_trips().unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.iter().any(|s| s.id == trip.id));
        assert!(store.contains_trip(&trip.id));
        let detail = coordinator.queries().cached_trip(&trip.id).unwrap();
        assert!(detail.logs.is_empty());
    }

    #[tokio::test]
    async fn test_add_trip_failure_leaves_no_trace() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        store.fail_next(StoreOp::CreateTrip, unavailable());

        let err = coordinator.add_trip(new_trip("Busan")).await.unwrap_err();

        assert!(err.is_unavailable());
        let list = coordinator.queries().cached_trips().unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|s| s.title != "Busan"));
        assert_eq!(store.trip_count(), 3);
    }

    #[tokio::test]
    async fn test_add_trip_rejects_reversed_dates() {
        let (store, coordinator) = setup();
        let mut trip = new_trip("Backwards");
        trip.end_date = date("2024-08-01");

        let err = coordinator.add_trip(trip).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(store.calls(StoreOp::CreateTrip), 0);
    }

    #[tokio::test]
    async fn test_update_trip_keeps_dates_and_entries() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        coordinator.queries().trip("1").await.unwrap();

        let detail = coordinator
            .update_trip("1", TripPatch::title("Tokyo Again"))
            .await
            .unwrap();

        assert_eq!(detail.trip.title, "Tokyo Again");
        assert_eq!(detail.trip.start_date, date("2024-03-10"));
        assert_eq!(detail.trip.end_date, date("2024-03-15"));
        assert_eq!(detail.logs.len(), 2);
        let summary = coordinator
            .queries()
            .cached_trips()
            .unwrap()
            .into_iter()
            .find(|s| s.id == "1")
            .unwrap();
        assert_eq!(summary.title, "Tokyo Again");
        assert_eq!(store.trip_detail("1").await.unwrap().trip.title, "Tokyo Again");
    }

    #[tokio::test]
    async fn test_update_trip_validates_against_cached_dates() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let patch = TripPatch {
            end_date: Some(date("2024-03-01")),
            ..Default::default()
        };
        let err = coordinator.update_trip("1", patch).await.unwrap_err();

        assert!(matches!(
            err,
            TripError::Validation(ValidationError::InvalidDateRange { .. })
        ));
        assert_eq!(store.calls(StoreOp::UpdateTrip), 0);
        let cached = coordinator.queries().cached_trip("1").unwrap();
        assert_eq!(cached.trip.end_date, date("2024-03-15"));
    }

    #[tokio::test]
    async fn test_update_uncached_trip_checks_stored_dates() {
        let (store, coordinator) = setup();

        let patch = TripPatch {
            end_date: Some(date("2024-03-01")),
            ..Default::default()
        };
        let err = coordinator.update_trip("1", patch).await.unwrap_err();

        assert!(matches!(
            err,
            TripError::Validation(ValidationError::InvalidDateRange { .. })
        ));
        assert_eq!(store.calls(StoreOp::UpdateTrip), 0);
        let stored = store.trip_detail("1").await.unwrap().trip;
        assert_eq!(stored.end_date, date("2024-03-15"));
    }

    #[tokio::test]
    async fn test_update_uncached_trip_with_valid_date() {
        let (store, coordinator) = setup();

        let patch = TripPatch {
            end_date: Some(date("2024-03-20")),
            ..Default::default()
        };
        let detail = coordinator.update_trip("1", patch).await.unwrap();

        assert_eq!(detail.trip.end_date, date("2024-03-20"));
        assert_eq!(store.trip_detail("1").await.unwrap().trip.end_date, date("2024-03-20"));
    }

    #[tokio::test]
    async fn test_update_trip_unavailable_restores() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        let before = coordinator.queries().trip("1").await.unwrap();
        store.fail_next(StoreOp::UpdateTrip, unavailable());

        let err = coordinator
            .update_trip("1", TripPatch::title("Never saved"))
            .await
            .unwrap_err();

        assert!(err.is_unavailable());
        let cached = coordinator.queries().cached_trip("1").unwrap();
        assert_eq!(cached.trip, before.trip);
        let summary = coordinator
            .queries()
            .cached_trips()
            .unwrap()
            .into_iter()
            .find(|s| s.id == "1")
            .unwrap();
        assert_eq!(summary.title, "Tokyo");
    }

    #[tokio::test]
    async fn test_update_trip_not_found_invalidates() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        coordinator.queries().trip("2").await.unwrap();
        store.fail_next(StoreOp::UpdateTrip, StoreError::trip_not_found("2"));

        let err = coordinator
            .update_trip("2", TripPatch::title("Gone"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        let cache = coordinator.queries().cache();
        assert!(!cache.is_fresh(&QueryKey::detail("2")));
        assert!(!cache.is_fresh(&QueryKey::TripList));
    }

    #[tokio::test]
    async fn test_delete_trip_navigates_to_list() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        coordinator.queries().trip("3").await.unwrap();

        let nav = coordinator.delete_trip("3").await.unwrap();

        assert_eq!(nav, Navigation::TripList);
        assert!(coordinator.queries().cached_trip("3").is_none());
        assert!(!store.contains_trip("3"));
        assert_eq!(store.entry_count("3"), 0);

        // The list was invalidated, so this read goes back to the store
        let list = coordinator.queries().trips().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(store.calls(StoreOp::ListTrips), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_trip_keeps_list() {
        let (_, coordinator) = setup();
        let before = coordinator.queries().trips().await.unwrap();

        let err = coordinator.delete_trip("99").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(coordinator.queries().cached_trips().unwrap(), before);
        assert!(coordinator.queries().cache().is_fresh(&QueryKey::TripList));
    }

    #[tokio::test]
    async fn test_delete_trip_unavailable_changes_nothing() {
        let (store, coordinator) = setup();
        coordinator.queries().trips().await.unwrap();
        coordinator.queries().trip("1").await.unwrap();
        store.fail_next(StoreOp::DeleteTrip, unavailable());

        assert!(coordinator.delete_trip("1").await.unwrap_err().is_unavailable());

        assert_eq!(coordinator.queries().cached_trips().unwrap().len(), 3);
        assert!(coordinator.queries().cache().is_fresh(&QueryKey::detail("1")));
    }

    // ----- entries -----

    #[tokio::test]
    async fn test_add_entry_appends() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let entry = coordinator
            .add_entry("1", EntryDraft::new(date("2024-03-12"), "  Shibuya crossing  "))
            .await
            .unwrap();

        assert_eq!(entry.content, "Shibuya crossing");
        let cached = coordinator.queries().cached_trip("1").unwrap();
        assert_eq!(cached.logs.last().unwrap().id, entry.id);
        assert_eq!(store.entry_count("1"), 3);

        // Views see it between the two existing entries
        let view = coordinator.queries().trip("1").await.unwrap();
        let ids: Vec<_> = view.logs.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", entry.id.as_str(), "2"]);
    }

    #[tokio::test]
    async fn test_add_entry_failure_rolls_back() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();
        store.fail_next(StoreOp::SaveEntry, unavailable());

        let err = coordinator
            .add_entry("1", EntryDraft::new(date("2024-03-12"), "lost"))
            .await
            .unwrap_err();

        assert!(err.is_unavailable());
        assert_eq!(coordinator.queries().cached_trip("1").unwrap().logs.len(), 2);
    }

    #[tokio::test]
    async fn test_add_entry_rejects_too_many_images() {
        let (store, coordinator) = setup();
        let mut draft = EntryDraft::new(date("2024-03-12"), "photo dump");
        draft.images = (0..7).map(|i| format!("data:image/png;base64,{}", i)).collect();

        let err = coordinator.add_entry("1", draft).await.unwrap_err();

        assert!(matches!(
            err,
            TripError::Validation(ValidationError::TooManyImages { count: 7, max: 6 })
        ));
        assert_eq!(store.calls(StoreOp::SaveEntry), 0);
    }

    #[tokio::test]
    async fn test_update_entry_replaces_in_place() {
        let (_, coordinator) = setup();
        coordinator.queries().trip("2").await.unwrap();

        coordinator
            .update_entry("2", "3", EntryDraft::new(date("2024-05-01"), "Edited"))
            .await
            .unwrap();

        let cached = coordinator.queries().cached_trip("2").unwrap();
        assert_eq!(cached.logs.len(), 2);
        assert_eq!(cached.logs[0].id, "3");
        assert_eq!(cached.logs[0].content, "Edited");
    }

    #[tokio::test]
    async fn test_update_unknown_entry_is_not_found() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let err = coordinator
            .update_entry("1", "ghost", EntryDraft::new(date("2024-03-11"), "Nope"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.calls(StoreOp::SaveEntry), 0);
        assert_eq!(store.entry_count("1"), 2);
        assert_eq!(coordinator.queries().cached_trip("1").unwrap().logs.len(), 2);
    }

    #[tokio::test]
    async fn test_update_entry_reads_uncached_trip() {
        let (store, coordinator) = setup();

        let saved = coordinator
            .update_entry("2", "4", EntryDraft::new(date("2024-05-02"), "Sunrise"))
            .await
            .unwrap();

        assert_eq!(saved.content, "Sunrise");
        assert_eq!(store.calls(StoreOp::TripDetail), 1);
        let cached = coordinator.queries().cached_trip("2").unwrap();
        assert_eq!(cached.entry("4").unwrap().content, "Sunrise");
    }

    #[tokio::test]
    async fn test_update_entry_unavailable_restores() {
        let (store, coordinator) = setup();
        let before = coordinator.queries().trip("2").await.unwrap();
        store.fail_next(StoreOp::SaveEntry, unavailable());

        let err = coordinator
            .update_entry("2", "3", EntryDraft::new(date("2024-05-03"), "Edited"))
            .await
            .unwrap_err();

        assert!(err.is_unavailable());
        assert_eq!(coordinator.queries().cached_trip("2").unwrap().logs, before.logs);
    }

    #[tokio::test]
    async fn test_delete_entry_declined_touches_nothing() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let outcome = coordinator
            .delete_entry("1", "1", Confirmation::Declined)
            .await
            .unwrap();

        assert_eq!(outcome, EntryDeletion::Cancelled);
        assert_eq!(store.calls(StoreOp::DeleteEntry), 0);
        assert_eq!(coordinator.queries().cached_trip("1").unwrap().logs.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_entry_confirmed() {
        let (store, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let outcome = coordinator
            .delete_entry("1", "1", Confirmation::from(true))
            .await
            .unwrap();

        assert_eq!(outcome, EntryDeletion::Deleted);
        let cached = coordinator.queries().cached_trip("1").unwrap();
        assert_eq!(cached.logs.len(), 1);
        assert_eq!(cached.logs[0].id, "2");
        assert_eq!(store.entry_count("1"), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_entry_invalidates_detail() {
        let (_, coordinator) = setup();
        coordinator.queries().trip("1").await.unwrap();

        let err = coordinator
            .delete_entry("1", "42", Confirmation::Confirmed)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!coordinator.queries().cache().is_fresh(&QueryKey::detail("1")));
    }

    // ----- tags -----

    #[tokio::test]
    async fn test_create_tag_trims_and_rejects_duplicates() {
        let (_, coordinator) = setup();

        let tag = coordinator.create_tag("  street food ", None).await.unwrap();
        assert_eq!(tag.name, "street food");
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);
        assert_eq!(coordinator.queries().cached_tags().unwrap().len(), 6);

        let err = coordinator.create_tag("food", Some("#000000")).await.unwrap_err();
        assert!(matches!(
            err,
            TripError::Validation(ValidationError::DuplicateTagName(_))
        ));
        let err = coordinator.create_tag("   ", None).await.unwrap_err();
        assert!(matches!(err, TripError::Validation(ValidationError::EmptyTagName)));
        assert_eq!(coordinator.queries().cached_tags().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_add_tag_is_idempotent() {
        let (_, coordinator) = setup();

        let tags = coordinator.add_tag("1", "1").await.unwrap();
        assert_eq!(tags.len(), 4);
        let again = coordinator.add_tag("1", "1").await.unwrap();
        assert_eq!(again, tags);
    }

    #[tokio::test]
    async fn test_add_unknown_tag() {
        let (_, coordinator) = setup();
        let err = coordinator.add_tag("1", "nope").await.unwrap_err();
        assert!(matches!(err, TripError::Validation(ValidationError::UnknownTag(_))));
    }

    #[tokio::test]
    async fn test_add_tag_limit() {
        let (_, coordinator) = setup();
        // Trip 1 starts with three tags
        for name in ["a", "b", "c", "d"] {
            let tag = coordinator.create_tag(name, None).await.unwrap();
            coordinator.add_tag("1", &tag.id).await.unwrap();
        }
        let extra = coordinator.create_tag("e", None).await.unwrap();

        let err = coordinator.add_tag("1", &extra.id).await.unwrap_err();

        assert_eq!(err, TripError::Validation(ValidationError::TooManyTags { max: MAX_TRIP_TAGS }));
        let cached = coordinator.queries().cached_trip("1").unwrap();
        assert_eq!(cached.trip.tags.len(), MAX_TRIP_TAGS);
    }

    #[tokio::test]
    async fn test_remove_tag() {
        let (_, coordinator) = setup();

        let tags = coordinator.remove_tag("1", "4").await.unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|t| t.id != "4"));
        // Removing again is harmless
        assert_eq!(coordinator.remove_tag("1", "4").await.unwrap(), tags);
    }
}
