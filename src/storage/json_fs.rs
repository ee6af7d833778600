// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-file document store.
//!
//! Every document lives in its own pretty-printed JSON file:
//!
//! ```text
//! {root}/
//!   trips/{trip_id}.json
//!   trips/{trip_id}/expenses/{expense_id}.json
//!   users/{profile_id}.json
//!   sessions/{digest}/user.json    # profile cache, see identity::profile_cache
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written document.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::document::{new_document_id, validate_segment};
use super::{
    CollectionPath, Document, DocumentStore, StorageError, StorageResult, StoragePaths,
    StoredDocument,
};

/// Read and deserialize a JSON file, returning `None` if it does not exist.
pub(crate) fn read_json_opt<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(value))
}

/// Write a JSON file atomically (temp file + rename).
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Unique temp name so concurrent writers of one document never share it
    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// File-backed [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    paths: StoragePaths,
    initialized: bool,
}

impl JsonFileStore {
    /// Create a new store. Call `initialize()` before use.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create the top-level directory structure. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.trips_dir(),
            self.paths.users_dir(),
            self.paths.sessions_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    /// Identifiers of every `*.json` file directly inside `dir`, sorted.
    fn list_ids(&self, dir: &Path) -> StorageResult<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl DocumentStore for JsonFileStore {
    fn add(&self, collection: &CollectionPath, record: Document) -> StorageResult<String> {
        self.ensure_initialized()?;
        let id = new_document_id();
        write_json_atomic(&self.paths.document(collection, &id), &record)?;
        Ok(id)
    }

    fn get(&self, collection: &CollectionPath, id: &str) -> StorageResult<Option<Document>> {
        self.ensure_initialized()?;
        validate_segment(id)?;
        read_json_opt(&self.paths.document(collection, id))
    }

    fn get_all(&self, collection: &CollectionPath) -> StorageResult<Vec<StoredDocument>> {
        self.ensure_initialized()?;

        let mut documents = Vec::new();
        for id in self.list_ids(&self.paths.collection_dir(collection))? {
            match read_json_opt::<Document>(&self.paths.document(collection, &id)) {
                Ok(Some(data)) => documents.push(StoredDocument { id, data }),
                // Deleted between listing and reading
                Ok(None) => {}
                Err(e) => {
                    warn!(collection = %collection, id = %id, error = %e, "Skipping unreadable document");
                }
            }
        }
        Ok(documents)
    }

    fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        partial: Document,
    ) -> StorageResult<()> {
        self.ensure_initialized()?;
        validate_segment(id)?;

        let path = self.paths.document(collection, id);
        let mut current: Document =
            read_json_opt(&path)?.ok_or_else(|| StorageError::not_found(collection, id))?;
        current.extend(partial);
        write_json_atomic(&path, &current)
    }

    fn delete(&self, collection: &CollectionPath, id: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        validate_segment(id)?;

        match fs::remove_file(self.paths.document(collection, id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(collection, id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write-read-delete round trip under the data root.
    fn health_check(&self) -> StorageResult<()> {
        self.ensure_initialized()?;

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }

        Ok(())
    }
}
