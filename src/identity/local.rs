// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process identity provider.
//!
//! Accounts and active session tokens live in memory. Passwords are kept as
//! salted HMAC-SHA256 digests and compared in constant time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::broadcast;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use super::{
    Credentials, FederatedAssertion, Identity, IdentityError, IdentityEvent, IdentityProvider,
    Session,
};

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Identity events buffered for slow subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Normalize an email for lookup: NFKC, trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.nfkc().collect::<String>().trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

/// Display name fallback: the part of the email before `@`.
fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

struct PasswordDigest {
    salt: [u8; 16],
    digest: Vec<u8>,
}

impl PasswordDigest {
    fn mac(salt: &[u8], password: &str) -> Result<HmacSha256, IdentityError> {
        let mut mac = HmacSha256::new_from_slice(salt)
            .map_err(|e| IdentityError::Unavailable(format!("HMAC init failed: {e}")))?;
        mac.update(password.as_bytes());
        Ok(mac)
    }

    fn new(password: &str) -> Result<Self, IdentityError> {
        let salt = *Uuid::new_v4().as_bytes();
        let digest = Self::mac(&salt, password)?.finalize().into_bytes().to_vec();
        Ok(Self { salt, digest })
    }

    fn verify(&self, password: &str) -> bool {
        Self::mac(&self.salt, password)
            .map(|mac| mac.verify_slice(&self.digest).is_ok())
            .unwrap_or(false)
    }
}

struct Account {
    identity: Identity,
    /// `None` for accounts created through federated sign-in.
    password: Option<PasswordDigest>,
}

#[derive(Default)]
struct Directory {
    /// Accounts keyed by user ID.
    accounts: HashMap<String, Account>,
    /// Normalized email to user ID.
    by_email: HashMap<String, String>,
    /// Live sessions keyed by token.
    active_sessions: HashMap<String, Session>,
}

/// Identity provider backed by process memory.
pub struct LocalIdentityProvider {
    directory: Mutex<Directory>,
    events: broadcast::Sender<IdentityEvent>,
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            directory: Mutex::new(Directory::default()),
            events,
        }
    }

    fn directory(&self) -> Result<MutexGuard<'_, Directory>, IdentityError> {
        self.directory
            .lock()
            .map_err(|_| IdentityError::Unavailable("account directory lock poisoned".to_string()))
    }

    fn publish(&self, event: IdentityEvent) {
        if self.events.send(event).is_err() {
            debug!("No identity event subscribers");
        }
    }

    /// Register a session token and announce it.
    fn start_session(
        &self,
        directory: &mut Directory,
        identity: Identity,
    ) -> Session {
        let session = Session {
            token: new_session_token(),
            identity,
            signed_in_at: Utc::now(),
        };
        directory
            .active_sessions
            .insert(session.token.clone(), session.clone());
        session
    }
}

/// 32 random bytes, base64url without padding.
fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    Base64UrlUnpadded::encode_string(&bytes)
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_up(
        &self,
        credentials: &Credentials,
        display_name: Option<&str>,
    ) -> Result<Identity, IdentityError> {
        let email = normalize_email(&credentials.email);
        if !is_plausible_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        let mut directory = self.directory()?;
        if directory.by_email.contains_key(&email) {
            return Err(IdentityError::EmailInUse);
        }

        let identity = Identity {
            user_id: Uuid::new_v4().to_string(),
            display_name: display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_display_name(&email)),
            email: email.clone(),
        };
        let account = Account {
            identity: identity.clone(),
            password: Some(PasswordDigest::new(&credentials.password)?),
        };

        directory
            .by_email
            .insert(email, identity.user_id.clone());
        directory
            .accounts
            .insert(identity.user_id.clone(), account);

        info!(user_id = %identity.user_id, "Account created");
        Ok(identity)
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError> {
        let email = normalize_email(&credentials.email);

        let session = {
            let mut directory = self.directory()?;
            let identity = directory
                .by_email
                .get(&email)
                .and_then(|user_id| directory.accounts.get(user_id))
                .filter(|account| {
                    account
                        .password
                        .as_ref()
                        .is_some_and(|digest| digest.verify(&credentials.password))
                })
                .map(|account| account.identity.clone())
                .ok_or(IdentityError::InvalidCredentials)?;
            self.start_session(&mut directory, identity)
        };

        self.publish(IdentityEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn sign_in_federated(&self, assertion: &FederatedAssertion) -> Result<Session, IdentityError> {
        let email = assertion
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|email| is_plausible_email(email))
            .ok_or(IdentityError::MissingFederatedEmail)?;
        let user_id = Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("{}#{}", assertion.issuer, assertion.subject).as_bytes(),
        )
        .to_string();

        let session = {
            let mut directory = self.directory()?;
            if let Some(owner) = directory.by_email.get(&email) {
                if *owner != user_id {
                    return Err(IdentityError::EmailInUse);
                }
            }

            let display_name = assertion
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_display_name(&email));
            let identity = Identity {
                user_id: user_id.clone(),
                email: email.clone(),
                display_name,
            };

            if !directory.accounts.contains_key(&user_id) {
                info!(user_id = %user_id, issuer = %assertion.issuer, "Federated account created");
            }
            directory.by_email.insert(email, user_id.clone());
            directory.accounts.insert(
                user_id,
                Account {
                    identity: identity.clone(),
                    password: None,
                },
            );
            self.start_session(&mut directory, identity)
        };

        self.publish(IdentityEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        if self.directory()?.active_sessions.remove(token).is_none() {
            return Err(IdentityError::UnknownSession);
        }
        self.publish(IdentityEvent::SignedOut {
            token: token.to_string(),
        });
        Ok(())
    }

    fn active_sessions(&self) -> Result<Vec<Session>, IdentityError> {
        Ok(self.directory()?.active_sessions.values().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }
}
