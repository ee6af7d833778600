// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Module
//!
//! Account and session handling behind the [`IdentityProvider`]
//! collaborator.
//!
//! ## Session Flow
//!
//! 1. A handler calls `sign_in` (or `sign_in_federated`) on the provider
//! 2. The provider publishes [`IdentityEvent::SignedIn`] on its broadcast channel
//! 3. [`SessionManager::run`] applies the event to the session table and
//!    mirrors the profile into the [`ProfileCache`]
//! 4. Request extractors resolve bearer tokens against that table
//!
//! Sign-out follows the same path with [`IdentityEvent::SignedOut`]. The
//! session manager is the only writer of session state.

pub mod local;
pub mod profile_cache;
pub mod session;

pub use local::LocalIdentityProvider;
pub use profile_cache::{CachedProfile, ProfileCache};
pub use session::{Session, SessionManager, Viewer};

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// An account known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}

/// Email and password as typed by the user.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Verified claims from a federated ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedAssertion {
    pub issuer: String,
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Identity changes published by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    SignedIn(Session),
    SignedOut { token: String },
}

/// Identity provider failures. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("An account with this email already exists.")]
    EmailInUse,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password should be at least {min} characters.")]
    WeakPassword { min: usize },

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("The federated account did not provide an email address.")]
    MissingFederatedEmail,

    #[error("Session is not active.")]
    UnknownSession,

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Identity provider collaborator.
///
/// Every successful sign-in or sign-out is also published to subscribers.
pub trait IdentityProvider: Send + Sync {
    /// Create an account. Does not start a session.
    fn sign_up(
        &self,
        credentials: &Credentials,
        display_name: Option<&str>,
    ) -> Result<Identity, IdentityError>;

    fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError>;

    /// Start a session for an already verified federated identity, creating
    /// the account on first use.
    fn sign_in_federated(&self, assertion: &FederatedAssertion) -> Result<Session, IdentityError>;

    fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    /// Every session that has not been signed out. Used to resynchronise
    /// subscribers that missed events.
    fn active_sessions(&self) -> Result<Vec<Session>, IdentityError>;

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;
}
