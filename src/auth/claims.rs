// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federated ID token claims.

use serde::Deserialize;

use crate::identity::FederatedAssertion;

/// Standard OIDC claims read from a federated ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    /// Subject, stable per issuer
    pub sub: String,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    #[serde(default)]
    pub email: Option<String>,

    /// Unverified emails are not trusted for account matching
    #[serde(default)]
    pub email_verified: Option<bool>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Audience (validated by jsonwebtoken in production mode)
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl IdTokenClaims {
    /// The identity these claims vouch for.
    ///
    /// An email explicitly marked unverified is dropped.
    pub fn into_assertion(self) -> FederatedAssertion {
        let email = match self.email_verified {
            Some(false) => None,
            _ => self.email,
        };
        FederatedAssertion {
            issuer: self.iss,
            subject: self.sub,
            email,
            name: self.name,
        }
    }
}
