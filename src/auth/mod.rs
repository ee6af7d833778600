// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request authentication for the trip planner API.
//!
//! ## Auth Flow
//!
//! 1. Client signs in via `/v1/auth/login` (email and password) or
//!    `/v1/auth/federated` (ID token from an external provider)
//! 2. The server returns an opaque session token
//! 3. Client sends `Authorization: Bearer <session token>`
//! 4. [`Auth`] / [`OptionalAuth`] resolve the token to a
//!    [`Viewer`](crate::identity::Viewer) via the session table
//!
//! ## Federated ID Tokens
//!
//! - JWKS is fetched over HTTPS only and cached with a TTL
//! - Signature, expiry, issuer and audience are verified
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod federated;
pub mod jwks;

pub use claims::IdTokenClaims;
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use federated::verify_id_token;
pub use jwks::JwksCache;
