// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile repository.
//!
//! Profiles are written once at sign-up into the `users` collection.

use super::super::{CollectionPath, DocumentStore, StorageResult};
use super::{decode, encode};
use crate::models::UserProfile;

pub struct UserProfileRepository<'a> {
    store: &'a dyn DocumentStore,
    collection: CollectionPath,
}

impl<'a> UserProfileRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            collection: CollectionPath::users(),
        }
    }

    /// Store a profile and return it with its assigned identifier.
    pub fn add(&self, profile: &UserProfile) -> StorageResult<UserProfile> {
        let id = self.store.add(&self.collection, encode(profile, &["id"])?)?;
        Ok(UserProfile {
            id,
            ..profile.clone()
        })
    }

    pub fn get(&self, profile_id: &str) -> StorageResult<Option<UserProfile>> {
        self.store
            .get(&self.collection, profile_id)?
            .map(|data| decode(data, &[("id", profile_id)]))
            .transpose()
    }

    /// Find the profile written for `user_id`, if any.
    pub fn find_by_user(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        for doc in self.store.get_all(&self.collection)? {
            if doc.data.get("user_id").and_then(|v| v.as_str()) == Some(user_id) {
                return decode(doc.data, &[("id", &doc.id)]).map(Some);
            }
        }
        Ok(None)
    }
}
