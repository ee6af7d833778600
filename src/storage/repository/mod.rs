// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to document storage.
//!
//! Each repository provides CRUD operations for a specific entity type over
//! any [`DocumentStore`](super::DocumentStore). Identifiers live outside the
//! stored body: they are stripped on write and filled in on read.

pub mod expenses;
pub mod trips;
pub mod users;

pub use expenses::ExpenseRepository;
pub use trips::TripRepository;
pub use users::UserProfileRepository;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Document, StorageError, StorageResult};

/// Serialize a record into a document body, dropping the listed keys.
pub(crate) fn encode<T: Serialize>(record: &T, skip: &[&str]) -> StorageResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            for key in skip {
                map.remove(*key);
            }
            Ok(map)
        }
        other => Err(StorageError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Deserialize a document body, inserting storage-derived keys first.
pub(crate) fn decode<T: DeserializeOwned>(
    mut data: Document,
    derived: &[(&str, &str)],
) -> StorageResult<T> {
    for (key, value) in derived {
        data.insert((*key).to_string(), Value::String((*value).to_string()));
    }
    Ok(serde_json::from_value(Value::Object(data))?)
}
