// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trip and Expense Form Controller
//!
//! Stateful boards that run one user intent at a time against the document
//! store and keep a local copy of what the viewer is looking at.
//!
//! - [`TripBoard`]: trip list and trip detail (create, update, delete)
//! - [`ExpenseBoard`]: one trip's expenses plus its budget summary
//!
//! ## Mutation Rules
//!
//! - Forms are validated before any storage call.
//! - Only the creator of a record may update or delete it. Anyone else gets
//!   [`Outcome::Refused`]: nothing is written and local state is unchanged.
//! - A mutation performs exactly one storage write. Local state changes only
//!   after the store confirms it.

pub mod expenses;
pub mod trips;

pub use expenses::ExpenseBoard;
pub use trips::TripBoard;

use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::StorageError;
use crate::validation::FormError;

/// Whether a notification reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// User-facing message produced by every intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: message.into(),
        }
    }
}

/// Result of an intent that passed validation and reached the creator check.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Written to storage and reflected locally.
    Applied { record: T, notification: Notification },
    /// The viewer is not the creator. Nothing happened.
    Refused,
}

impl<T> Outcome<T> {
    fn applied(record: T, message: &str) -> Self {
        Outcome::Applied {
            record,
            notification: Notification::success(message),
        }
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, Outcome::Refused)
    }
}

/// Failures that block an intent.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] FormError),

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ControllerError {
    /// Blocking notification carrying the failure text.
    pub fn notification(&self) -> Notification {
        Notification::failure(self.to_string())
    }
}

pub(crate) const SIGN_IN_REQUIRED: &str = "Please sign in to continue.";

/// Map a storage failure, treating a missing or unaddressable document as
/// `entity` not found.
pub(crate) fn storage_failure(
    context: &'static str,
    entity: &'static str,
) -> impl FnOnce(StorageError) -> ControllerError {
    move |source| match source {
        StorageError::NotFound { .. } | StorageError::InvalidPath(_) => {
            ControllerError::NotFound(entity)
        }
        source => ControllerError::Storage { context, source },
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Store double that counts calls and can be told to fail writes.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::storage::{
        CollectionPath, Document, DocumentStore, MemoryDocumentStore, StorageError,
        StorageResult, StoredDocument,
    };

    #[derive(Default)]
    pub struct CountingStore {
        inner: MemoryDocumentStore,
        writes: AtomicUsize,
        reads: AtomicUsize,
        fail_writes: AtomicBool,
    }

    impl CountingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn calls(&self) -> usize {
            self.writes() + self.reads()
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn write(&self) -> StorageResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("permission denied".to_string()));
            }
            Ok(())
        }
    }

    impl DocumentStore for CountingStore {
        fn add(&self, collection: &CollectionPath, record: Document) -> StorageResult<String> {
            self.write()?;
            self.inner.add(collection, record)
        }

        fn get(&self, collection: &CollectionPath, id: &str) -> StorageResult<Option<Document>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(collection, id)
        }

        fn get_all(&self, collection: &CollectionPath) -> StorageResult<Vec<StoredDocument>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_all(collection)
        }

        fn update(
            &self,
            collection: &CollectionPath,
            id: &str,
            partial: Document,
        ) -> StorageResult<()> {
            self.write()?;
            self.inner.update(collection, id, partial)
        }

        fn delete(&self, collection: &CollectionPath, id: &str) -> StorageResult<()> {
            self.write()?;
            self.inner.delete(collection, id)
        }
    }
}
