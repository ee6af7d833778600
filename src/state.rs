// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state handed to every handler.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::JwksCache;
use crate::identity::{IdentityProvider, LocalIdentityProvider, ProfileCache, SessionManager};
use crate::storage::{DocumentStore, MemoryDocumentStore};

/// Federated ID token verification settings.
///
/// With a JWKS cache, ID tokens are signature-checked. Without one, federated
/// sign-in is refused unless `allow_unsigned` is set, which is development
/// mode.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub jwks: Option<Arc<JwksCache>>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Accept ID tokens without a signature check when no JWKS is configured.
    pub allow_unsigned: bool,
}

impl AuthConfig {
    /// Development mode: unsigned ID tokens are accepted.
    pub fn development() -> Self {
        Self {
            allow_unsigned: true,
            ..Self::default()
        }
    }

    pub fn is_production(&self) -> bool {
        self.jwks.is_some()
    }

    /// Whether `/v1/auth/federated` can succeed at all.
    pub fn federated_enabled(&self) -> bool {
        self.jwks.is_some() || self.allow_unsigned
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Document storage collaborator
    pub documents: Arc<dyn DocumentStore>,
    /// Identity provider collaborator
    pub identity: Arc<dyn IdentityProvider>,
    /// Owner of the active session table
    pub sessions: SessionManager,
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            documents,
            identity,
            sessions,
            auth_config: AuthConfig::default(),
        }
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    /// Start the session manager on the identity provider's event stream.
    ///
    /// The subscription is taken before this returns, so no event published
    /// afterwards is missed.
    pub fn spawn_session_manager(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let events = self.identity.subscribe();
        tokio::spawn(
            self.sessions
                .clone()
                .run(self.identity.clone(), events, shutdown),
        )
    }
}

impl Default for AppState {
    /// Fully in-memory state: documents, accounts and profile cache.
    fn default() -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(LocalIdentityProvider::new()),
            SessionManager::new(ProfileCache::in_memory()),
        )
    }
}
