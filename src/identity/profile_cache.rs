// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-session mirror of the signed-in user's display name and email.
//!
//! Written when a session starts and removed when it ends. Nothing reads it
//! to make an access decision; the session table is the only authority.
//!
//! Entries are keyed by a SHA-256 digest of the session token, so the bearer
//! token itself never reaches the filesystem.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::storage::json_fs::{read_json_opt, write_json_atomic};
use crate::storage::{StorageError, StorageResult, StoragePaths};

/// The single `user` entry kept per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
enum Backend {
    Files(StoragePaths),
    Memory(Arc<Mutex<HashMap<String, CachedProfile>>>),
}

/// Cache key for a session token. URL-safe base64, so it is a valid path segment.
fn cache_key(token: &str) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(token.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct ProfileCache {
    backend: Backend,
}

impl ProfileCache {
    /// Cache under `{root}/sessions/{digest}/user.json`.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            backend: Backend::Files(paths),
        }
    }

    /// Process-local cache, used with the in-memory document store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    fn lock(
        map: &Mutex<HashMap<String, CachedProfile>>,
    ) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, CachedProfile>>> {
        map.lock()
            .map_err(|_| StorageError::Unavailable("profile cache lock poisoned".to_string()))
    }

    pub fn store(&self, token: &str, profile: &CachedProfile) -> StorageResult<()> {
        let key = cache_key(token);
        match &self.backend {
            Backend::Files(paths) => write_json_atomic(&paths.session_profile(&key), profile),
            Backend::Memory(map) => {
                Self::lock(map)?.insert(key, profile.clone());
                Ok(())
            }
        }
    }

    pub fn load(&self, token: &str) -> StorageResult<Option<CachedProfile>> {
        let key = cache_key(token);
        match &self.backend {
            Backend::Files(paths) => read_json_opt(&paths.session_profile(&key)),
            Backend::Memory(map) => Ok(Self::lock(map)?.get(&key).cloned()),
        }
    }

    /// Remove the entry for `token`. Clearing a missing entry is not an error.
    pub fn clear(&self, token: &str) -> StorageResult<()> {
        let key = cache_key(token);
        match &self.backend {
            Backend::Files(paths) => match fs::remove_dir_all(paths.sessions_dir().join(&key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Backend::Memory(map) => {
                Self::lock(map)?.remove(&key);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn profile() -> CachedProfile {
        CachedProfile {
            name: "ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn all_paths(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                found.extend(all_paths(&path));
            }
            found.push(path);
        }
        found
    }

    #[test]
    fn file_cache_writes_and_clears_user_entry() {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let cache = ProfileCache::new(paths.clone());

        cache.store("tok_1", &profile()).unwrap();
        assert!(paths.session_profile(&cache_key("tok_1")).exists());
        assert_eq!(cache.load("tok_1").unwrap(), Some(profile()));

        cache.clear("tok_1").unwrap();
        assert!(!paths.sessions_dir().join(cache_key("tok_1")).exists());
        assert_eq!(cache.load("tok_1").unwrap(), None);

        // Second clear is a no-op
        cache.clear("tok_1").unwrap();
    }

    #[test]
    fn raw_token_never_appears_on_disk() {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let cache = ProfileCache::new(paths.clone());
        let token = "Zm9vYmFyLXNlc3Npb24tdG9rZW4tdmFsdWUtMTIzNDU2Nzg5MA";

        cache.store(token, &profile()).unwrap();

        let stored = all_paths(&paths.sessions_dir());
        assert!(!stored.is_empty());
        for path in &stored {
            assert!(
                !path.to_string_lossy().contains(token),
                "token leaked into {}",
                path.display()
            );
            if path.is_file() {
                assert!(!fs::read_to_string(path).unwrap().contains(token));
            }
        }
    }

    #[test]
    fn hostile_tokens_stay_inside_sessions_dir() {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let cache = ProfileCache::new(paths.clone());

        cache.store("../../escape", &profile()).unwrap();

        assert_eq!(all_paths(temp.path()).len(), 3);
        assert!(paths.session_profile(&cache_key("../../escape")).exists());
        assert_eq!(cache.load("../../escape").unwrap(), Some(profile()));
    }

    #[test]
    fn memory_cache_round_trip() {
        let cache = ProfileCache::in_memory();
        cache.store("tok", &profile()).unwrap();
        assert_eq!(cache.load("tok").unwrap(), Some(profile()));
        cache.clear("tok").unwrap();
        assert_eq!(cache.load("tok").unwrap(), None);
    }
}
