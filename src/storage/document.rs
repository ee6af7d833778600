// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document storage collaborator.
//!
//! The service never talks to a storage engine directly. Every read and
//! write goes through [`DocumentStore`], which models a hosted document
//! database: schemaless JSON documents grouped in collections, addressed by
//! a storage-assigned identifier. Each mutation is a single, independent
//! document operation; there are no multi-document transactions.

use std::fmt;
use std::io;

use serde_json::{Map, Value};

/// A stored document body: top-level JSON fields.
pub type Document = Map<String, Value>;

/// Error type for document storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("invalid path segment: {0:?}")]
    InvalidPath(String),

    #[error("storage not initialized")]
    NotInitialized,

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn not_found(collection: &CollectionPath, id: &str) -> Self {
        StorageError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A document together with its storage-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Slash-separated address of a collection, e.g. `trips/{trip_id}/expenses`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Top-level trip collection.
    pub fn trips() -> Self {
        Self {
            segments: vec!["trips".to_string()],
        }
    }

    /// Expenses nested under a single trip.
    pub fn expenses(trip_id: &str) -> StorageResult<Self> {
        validate_segment(trip_id)?;
        Ok(Self {
            segments: vec![
                "trips".to_string(),
                trip_id.to_string(),
                "expenses".to_string(),
            ],
        })
    }

    /// User profiles written at sign-up.
    pub fn users() -> Self {
        Self {
            segments: vec!["users".to_string()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Reject identifiers that could escape their collection.
pub fn validate_segment(segment: &str) -> StorageResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);

    if invalid {
        Err(StorageError::InvalidPath(segment.to_string()))
    } else {
        Ok(())
    }
}

/// Document storage operations consumed by the application.
///
/// Implementations must be safe to share between request handlers. No
/// ordering is promised between independent writes to the same document:
/// the last write to reach the store wins.
pub trait DocumentStore: Send + Sync {
    /// Store a new document and return its assigned identifier.
    fn add(&self, collection: &CollectionPath, record: Document) -> StorageResult<String>;

    /// Fetch a document, or `None` if it does not exist.
    fn get(&self, collection: &CollectionPath, id: &str) -> StorageResult<Option<Document>>;

    /// Fetch every document in a collection, ordered by identifier.
    fn get_all(&self, collection: &CollectionPath) -> StorageResult<Vec<StoredDocument>>;

    /// Merge `partial` into the top-level fields of an existing document.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if the document does not exist.
    fn update(&self, collection: &CollectionPath, id: &str, partial: Document)
        -> StorageResult<()>;

    /// Delete a single document. Nested collections are left untouched.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if the document does not exist.
    fn delete(&self, collection: &CollectionPath, id: &str) -> StorageResult<()>;

    /// Verify the backend is reachable and writable.
    fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Generate a time-ordered document identifier.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
