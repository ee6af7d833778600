// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session values and the manager that owns them.
//!
//! The identity provider never touches session state directly. It publishes
//! [`IdentityEvent`]s, and [`SessionManager::run`] applies them in order.
//! Dependents observe the current table through a `watch` channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::{CachedProfile, Identity, IdentityEvent, IdentityProvider, ProfileCache};

/// An active sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Session {
    /// Opaque bearer token presented on later requests.
    pub token: String,
    pub identity: Identity,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.identity.user_id.clone(),
            session_token: self.token.clone(),
        }
    }
}

/// The acting user of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Viewer {
    pub user_id: String,
    pub session_token: String,
}

/// Active sessions keyed by token.
pub type SessionTable = HashMap<String, Session>;

struct Inner {
    table: watch::Sender<SessionTable>,
    cache: ProfileCache,
}

/// Single owner of session state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(cache: ProfileCache) -> Self {
        let (table, _) = watch::channel(SessionTable::new());
        Self {
            inner: Arc::new(Inner { table, cache }),
        }
    }

    /// Apply one identity event to the session table and profile cache.
    pub fn apply(&self, event: &IdentityEvent) {
        match event {
            IdentityEvent::SignedIn(session) => {
                self.inner.table.send_modify(|table| {
                    table.insert(session.token.clone(), session.clone());
                });
                self.cache_profile(session);
                info!(user_id = %session.identity.user_id, "Session started");
            }
            IdentityEvent::SignedOut { token } => {
                let removed = self
                    .inner
                    .table
                    .send_if_modified(|table| table.remove(token).is_some());

                self.clear_profile(token);
                if removed {
                    info!("Session ended");
                } else {
                    debug!("Sign-out for unknown session ignored");
                }
            }
        }
    }

    /// Replace the whole table with the provider's list of live sessions.
    ///
    /// Tokens missing from `sessions` are dropped along with their cached
    /// profile. Events still queued after this call apply on top as usual.
    pub fn reconcile(&self, sessions: Vec<Session>) {
        let fresh: SessionTable = sessions
            .into_iter()
            .map(|session| (session.token.clone(), session))
            .collect();
        let previous = self.inner.table.send_replace(fresh.clone());

        let mut ended = 0usize;
        for token in previous.keys().filter(|token| !fresh.contains_key(*token)) {
            self.clear_profile(token);
            ended += 1;
        }
        for session in fresh.values().filter(|s| !previous.contains_key(&s.token)) {
            self.cache_profile(session);
        }
        info!(active = fresh.len(), ended, "Session table resynchronised");
    }

    fn cache_profile(&self, session: &Session) {
        let profile = CachedProfile {
            name: session.identity.display_name.clone(),
            email: session.identity.email.clone(),
        };
        if let Err(e) = self.inner.cache.store(&session.token, &profile) {
            warn!(user_id = %session.identity.user_id, error = %e, "Failed to cache profile");
        }
    }

    fn clear_profile(&self, token: &str) {
        if let Err(e) = self.inner.cache.clear(token) {
            warn!(error = %e, "Failed to clear cached profile");
        }
    }

    /// Look up the session behind a bearer token.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        self.inner.table.borrow().get(token).cloned()
    }

    pub fn viewer(&self, token: &str) -> Option<Viewer> {
        self.resolve(token).map(|session| session.viewer())
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.table.borrow().len()
    }

    /// Watch the session table.
    pub fn subscribe(&self) -> watch::Receiver<SessionTable> {
        self.inner.table.subscribe()
    }

    /// Wait until `token` appears in the table, up to `timeout`.
    pub async fn wait_for_session(&self, token: &str, timeout: Duration) -> Option<Session> {
        let mut rx = self.subscribe();
        let wait = async {
            loop {
                if let Some(session) = rx.borrow_and_update().get(token).cloned() {
                    return Some(session);
                }
                if rx.changed().await.is_err() {
                    return None;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }

    /// Wait until `token` is gone from the table. Returns `false` on timeout.
    pub async fn wait_for_sign_out(&self, token: &str, timeout: Duration) -> bool {
        let mut rx = self.subscribe();
        let wait = async {
            loop {
                if !rx.borrow_and_update().contains_key(token) {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    /// Consume identity events until `shutdown` fires or the channel closes.
    ///
    /// When the receiver lags, the skipped events are gone, so the table is
    /// rebuilt from `identity` before carrying on.
    pub async fn run(
        self,
        identity: Arc<dyn IdentityProvider>,
        mut events: broadcast::Receiver<IdentityEvent>,
        shutdown: CancellationToken,
    ) {
        info!("Session manager started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session manager shutting down");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => self.apply(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session manager fell behind identity events");
                        match identity.active_sessions() {
                            Ok(sessions) => self.reconcile(sessions),
                            Err(e) => {
                                warn!(error = %e, "Failed to resynchronise session table");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Identity event channel closed");
                        break;
                    }
                },
            }
        }
    }
}
