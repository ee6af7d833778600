// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk document layout.

use std::path::{Path, PathBuf};

use super::CollectionPath;

/// Default base directory for persistent storage.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the JSON document store.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Collections ==========

    /// Directory holding the documents of a collection.
    pub fn collection_dir(&self, collection: &CollectionPath) -> PathBuf {
        collection
            .segments()
            .iter()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Path to a single document file.
    pub fn document(&self, collection: &CollectionPath, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.json"))
    }

    pub fn trips_dir(&self) -> PathBuf {
        self.collection_dir(&CollectionPath::trips())
    }

    pub fn users_dir(&self) -> PathBuf {
        self.collection_dir(&CollectionPath::users())
    }

    // ========== Session Profile Cache ==========

    /// Directory containing per-session profile mirrors.
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// The single `user` entry mirrored for one session, under its cache key.
    pub fn session_profile(&self, key: &str) -> PathBuf {
        self.sessions_dir().join(key).join("user.json")
    }
}
