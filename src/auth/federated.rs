// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federated ID token verification.
//!
//! ## Verification Modes
//!
//! - **Production mode** (`FEDERATED_JWKS_URL` set): signature checked against
//!   the provider's JWKS, plus expiry, issuer and audience
//! - **Development mode** (`AUTH_MODE=development`, no JWKS URL): claims
//!   decoded without signature verification, expiry checked manually
//! - **Disabled** (neither): every ID token is refused

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::warn;

use super::{AuthError, IdTokenClaims, JwksCache};
use crate::state::AuthConfig;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verify an ID token and return its claims.
pub async fn verify_id_token(token: &str, config: &AuthConfig) -> Result<IdTokenClaims, AuthError> {
    match &config.jwks {
        Some(jwks) => verify_production(token, jwks, config).await,
        None if config.allow_unsigned => verify_development(token),
        None => Err(AuthError::FederatedDisabled),
    }
}

async fn verify_production(
    token: &str,
    jwks: &JwksCache,
    config: &AuthConfig,
) -> Result<IdTokenClaims, AuthError> {
    let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
    let (decoding_key, algorithm) = jwks.decoding_key(header.kid.as_deref()).await?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            _ => AuthError::MalformedToken,
        }
    })?;

    Ok(token_data.claims)
}

/// Development verification (no signature check).
fn verify_development(token: &str) -> Result<IdTokenClaims, AuthError> {
    warn!("Accepting federated ID token without signature verification (development mode)");

    let token_data = jsonwebtoken::dangerous::insecure_decode::<IdTokenClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;
    let claims = token_data.claims;

    let now = Utc::now().timestamp();
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}
