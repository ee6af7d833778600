// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Expense repository.
//!
//! Expenses are nested under their trip at `trips/{trip_id}/expenses`. The
//! owning trip is implied by the collection and is not stored in the body.

use tracing::warn;

use super::super::{CollectionPath, DocumentStore, StorageResult};
use super::{decode, encode};
use crate::models::{Expense, ExpenseChanges};

const DERIVED_KEYS: [&str; 2] = ["id", "trip_id"];

/// Repository for the expenses of one trip.
pub struct ExpenseRepository<'a> {
    store: &'a dyn DocumentStore,
    trip_id: String,
    collection: CollectionPath,
}

impl<'a> ExpenseRepository<'a> {
    /// Create a repository scoped to `trip_id`.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidPath` if `trip_id` is not a valid segment.
    pub fn new(store: &'a dyn DocumentStore, trip_id: &str) -> StorageResult<Self> {
        Ok(Self {
            store,
            trip_id: trip_id.to_string(),
            collection: CollectionPath::expenses(trip_id)?,
        })
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    fn derived<'b>(&'b self, id: &'b str) -> [(&'b str, &'b str); 2] {
        [("id", id), ("trip_id", &self.trip_id)]
    }

    /// Store a new expense and return it with its identifier and trip.
    pub fn add(&self, expense: &Expense) -> StorageResult<Expense> {
        let id = self
            .store
            .add(&self.collection, encode(expense, &DERIVED_KEYS)?)?;
        Ok(Expense {
            id,
            trip_id: self.trip_id.clone(),
            ..expense.clone()
        })
    }

    /// Get an expense by ID, or `None` if it does not exist.
    pub fn get(&self, expense_id: &str) -> StorageResult<Option<Expense>> {
        self.store
            .get(&self.collection, expense_id)?
            .map(|data| decode(data, &self.derived(expense_id)))
            .transpose()
    }

    /// List every expense of the trip. Documents that fail to decode are skipped.
    pub fn list(&self) -> StorageResult<Vec<Expense>> {
        let documents = self.store.get_all(&self.collection)?;

        let mut expenses = Vec::with_capacity(documents.len());
        for doc in documents {
            match decode::<Expense>(doc.data, &self.derived(&doc.id)) {
                Ok(expense) => expenses.push(expense),
                Err(e) => warn!(
                    trip_id = %self.trip_id,
                    expense_id = %doc.id,
                    error = %e,
                    "Skipping malformed expense"
                ),
            }
        }
        Ok(expenses)
    }

    /// Merge `changes` into an existing expense.
    pub fn update(&self, expense_id: &str, changes: &ExpenseChanges) -> StorageResult<()> {
        self.store
            .update(&self.collection, expense_id, encode(changes, &[])?)
    }

    pub fn delete(&self, expense_id: &str) -> StorageResult<()> {
        self.store.delete(&self.collection, expense_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, Visibility};
    use crate::storage::{MemoryDocumentStore, StorageError};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn lunch() -> Expense {
        Expense {
            id: String::new(),
            trip_id: String::new(),
            category: ExpenseCategory::Food,
            amount: dec!(18.40),
            description: Some("Lunch".to_string()),
            creator_id: "u1".to_string(),
            visibility: Visibility::Public,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn add_then_list_fills_trip_id() {
        let store = MemoryDocumentStore::new();
        let repo = ExpenseRepository::new(&store, "trip-1").unwrap();

        let added = repo.add(&lunch()).unwrap();
        assert_eq!(added.trip_id, "trip-1");

        let raw = store
            .get(&CollectionPath::expenses("trip-1").unwrap(), &added.id)
            .unwrap()
            .unwrap();
        assert!(!raw.contains_key("trip_id"));
        assert!(!raw.contains_key("id"));

        let listed = repo.list().unwrap();
        assert_eq!(listed, vec![added]);
    }

    #[test]
    fn legacy_text_amount_is_coerced() {
        let store = MemoryDocumentStore::new();
        let collection = CollectionPath::expenses("trip-1").unwrap();
        let id = store
            .add(
                &collection,
                json!({
                    "category": "transportation",
                    "amount": "35.5",
                    "creator_id": "u1",
                    "visibility": "private",
                    "created_at": "2026-10-01T10:00:00Z"
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .unwrap();

        let repo = ExpenseRepository::new(&store, "trip-1").unwrap();
        let expense = repo.get(&id).unwrap().unwrap();
        assert_eq!(expense.amount, dec!(35.5));
        assert_eq!(expense.category, ExpenseCategory::Transportation);
    }

    #[test]
    fn clearing_description_overwrites_stored_text() {
        let store = MemoryDocumentStore::new();
        let repo = ExpenseRepository::new(&store, "trip-1").unwrap();
        let added = repo.add(&lunch()).unwrap();

        let changes = ExpenseChanges {
            category: ExpenseCategory::Food,
            amount: dec!(20),
            description: None,
            updated_at: Utc::now(),
        };
        repo.update(&added.id, &changes).unwrap();

        let raw = store
            .get(&CollectionPath::expenses("trip-1").unwrap(), &added.id)
            .unwrap()
            .unwrap();
        assert_eq!(raw["description"], Value::Null);
        assert_eq!(repo.get(&added.id).unwrap().unwrap().description, None);
    }

    #[test]
    fn invalid_trip_id_is_rejected() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            ExpenseRepository::new(&store, "../users"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
