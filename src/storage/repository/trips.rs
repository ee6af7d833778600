// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trip repository.
//!
//! Trips live in the top-level `trips` collection.

use tracing::warn;

use super::super::{CollectionPath, DocumentStore, StorageResult};
use super::{decode, encode};
use crate::models::{Trip, TripChanges};

/// Repository for trip operations.
pub struct TripRepository<'a> {
    store: &'a dyn DocumentStore,
    collection: CollectionPath,
}

impl<'a> TripRepository<'a> {
    /// Create a new TripRepository.
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            collection: CollectionPath::trips(),
        }
    }

    /// Store a new trip and return it with its assigned identifier.
    pub fn add(&self, trip: &Trip) -> StorageResult<Trip> {
        let id = self.store.add(&self.collection, encode(trip, &["id"])?)?;
        Ok(Trip {
            id,
            ..trip.clone()
        })
    }

    /// Get a trip by ID, or `None` if it does not exist.
    pub fn get(&self, trip_id: &str) -> StorageResult<Option<Trip>> {
        self.store
            .get(&self.collection, trip_id)?
            .map(|data| decode(data, &[("id", trip_id)]))
            .transpose()
    }

    /// List every trip. Documents that fail to decode are skipped.
    pub fn list(&self) -> StorageResult<Vec<Trip>> {
        let documents = self.store.get_all(&self.collection)?;

        let mut trips = Vec::with_capacity(documents.len());
        for doc in documents {
            match decode::<Trip>(doc.data, &[("id", &doc.id)]) {
                Ok(trip) => trips.push(trip),
                Err(e) => warn!(trip_id = %doc.id, error = %e, "Skipping malformed trip"),
            }
        }
        Ok(trips)
    }

    /// Merge `changes` into an existing trip.
    pub fn update(&self, trip_id: &str, changes: &TripChanges) -> StorageResult<()> {
        self.store
            .update(&self.collection, trip_id, encode(changes, &[])?)
    }

    /// Delete a trip document. Its expenses are not touched.
    pub fn delete(&self, trip_id: &str) -> StorageResult<()> {
        self.store.delete(&self.collection, trip_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Visibility};
    use crate::storage::{MemoryDocumentStore, StorageError};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_trip() -> Trip {
        Trip {
            id: String::new(),
            title: "Lisbon".to_string(),
            destination: "Portugal".to_string(),
            start_date: date("2027-05-01"),
            end_date: date("2027-05-07"),
            budget: dec!(1200),
            currency: Currency::Eur,
            visibility: Visibility::Private,
            creator_id: "u1".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn add_assigns_id_and_persists_without_it() {
        let store = MemoryDocumentStore::new();
        let repo = TripRepository::new(&store);

        let trip = repo.add(&sample_trip()).unwrap();
        assert!(!trip.id.is_empty());

        let raw = store
            .get(&CollectionPath::trips(), &trip.id)
            .unwrap()
            .unwrap();
        assert!(!raw.contains_key("id"));
        assert_eq!(raw["budget"], json!(1200.0));

        let loaded = repo.get(&trip.id).unwrap().unwrap();
        assert_eq!(loaded, trip);
    }

    #[test]
    fn update_merges_changes() {
        let store = MemoryDocumentStore::new();
        let repo = TripRepository::new(&store);
        let trip = repo.add(&sample_trip()).unwrap();

        let changes = TripChanges {
            title: "Porto".to_string(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            budget: dec!(900),
            currency: Currency::Usd,
            visibility: Visibility::Public,
            updated_at: Utc::now(),
        };
        repo.update(&trip.id, &changes).unwrap();

        let loaded = repo.get(&trip.id).unwrap().unwrap();
        assert_eq!(loaded, trip.with_changes(&changes));
        assert_eq!(loaded.creator_id, "u1");
    }

    #[test]
    fn list_skips_malformed_documents() {
        let store = MemoryDocumentStore::new();
        let repo = TripRepository::new(&store);
        repo.add(&sample_trip()).unwrap();
        store
            .add(
                &CollectionPath::trips(),
                json!({"title": 7}).as_object().cloned().unwrap(),
            )
            .unwrap();

        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_trip_is_not_found() {
        let store = MemoryDocumentStore::new();
        let repo = TripRepository::new(&store);
        assert!(matches!(
            repo.delete("missing"),
            Err(StorageError::NotFound { .. })
        ));
    }
}
