// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory document store.
//!
//! Used by tests and by `STORAGE_BACKEND=memory`. Contents are lost when the
//! process exits.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::document::{new_document_id, validate_segment};
use super::{CollectionPath, Document, DocumentStore, StorageError, StorageResult, StoredDocument};

type Collections = HashMap<CollectionPath, BTreeMap<String, Document>>;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn add(&self, collection: &CollectionPath, record: Document) -> StorageResult<String> {
        let id = new_document_id();
        self.write()?
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    fn get(&self, collection: &CollectionPath, id: &str) -> StorageResult<Option<Document>> {
        validate_segment(id)?;
        Ok(self
            .read()?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn get_all(&self, collection: &CollectionPath) -> StorageResult<Vec<StoredDocument>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        partial: Document,
    ) -> StorageResult<()> {
        validate_segment(id)?;
        let mut collections = self.write()?;
        let current = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StorageError::not_found(collection, id))?;
        current.extend(partial);
        Ok(())
    }

    fn delete(&self, collection: &CollectionPath, id: &str) -> StorageResult<()> {
        validate_segment(id)?;
        self.write()?
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn crud_round_trip() {
        let store = MemoryDocumentStore::new();
        let trips = CollectionPath::trips();

        let id = store.add(&trips, doc(json!({"title": "Oslo"}))).unwrap();
        assert_eq!(store.get(&trips, &id).unwrap().unwrap()["title"], "Oslo");

        store
            .update(&trips, &id, doc(json!({"title": "Bergen"})))
            .unwrap();
        assert_eq!(store.get(&trips, &id).unwrap().unwrap()["title"], "Bergen");

        store.delete(&trips, &id).unwrap();
        assert!(store.get(&trips, &id).unwrap().is_none());
    }

    #[test]
    fn collections_are_isolated() {
        let store = MemoryDocumentStore::new();
        let a = CollectionPath::expenses("trip-a").unwrap();
        let b = CollectionPath::expenses("trip-b").unwrap();

        store.add(&a, doc(json!({"amount": 1}))).unwrap();
        store.add(&a, doc(json!({"amount": 2}))).unwrap();
        store.add(&b, doc(json!({"amount": 3}))).unwrap();

        assert_eq!(store.get_all(&a).unwrap().len(), 2);
        assert_eq!(store.get_all(&b).unwrap().len(), 1);
        assert!(store.get_all(&CollectionPath::trips()).unwrap().is_empty());
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let store = MemoryDocumentStore::new();
        let trips = CollectionPath::trips();
        let ids: Vec<_> = (0..5)
            .map(|n| store.add(&trips, doc(json!({ "n": n }))).unwrap())
            .collect();

        let listed: Vec<_> = store
            .get_all(&trips)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn missing_documents_are_not_found() {
        let store = MemoryDocumentStore::new();
        let trips = CollectionPath::trips();
        assert!(matches!(
            store.update(&trips, "x", Document::new()),
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&trips, "x"),
            Err(StorageError::NotFound { .. })
        ));
    }
}
