// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Storage Module
//!
//! Persistence for trips, expenses, and user profiles behind the
//! [`DocumentStore`] collaborator. Two backends are provided:
//!
//! - [`JsonFileStore`]: one JSON file per document under a data root
//! - [`MemoryDocumentStore`]: process-local maps, for tests and demos
//!
//! ## Collection Layout
//!
//! ```text
//! trips/                       # Trip documents
//!   {trip_id}/expenses/        # Expenses of one trip
//! users/                       # Profiles captured at sign-up
//! ```
//!
//! Typed access goes through the repositories in [`repository`], which
//! translate between [`Document`] bodies and the records in `crate::models`.
//! Deleting a trip leaves its expense collection in place.

pub mod document;
pub mod json_fs;
pub mod memory;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use document::{
    validate_segment, CollectionPath, Document, DocumentStore, StorageError, StorageResult,
    StoredDocument,
};
pub use json_fs::JsonFileStore;
pub use memory::MemoryDocumentStore;
pub use ownership::CreatedResource;
pub use paths::StoragePaths;
pub use repository::{ExpenseRepository, TripRepository, UserProfileRepository};
