// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the acting viewer.
//!
//! Use the `Auth` extractor in handlers to require a signed-in viewer:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(viewer): Auth) -> impl IntoResponse {
//!     // viewer.user_id is the signed-in user
//! }
//! ```
//!
//! Bearer tokens are session tokens issued at sign-in. They are resolved
//! against the [`SessionManager`](crate::identity::SessionManager) table, so a
//! token stops working as soon as its sign-out event has been applied.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::identity::Viewer;
use crate::state::AppState;

/// Extractor for a signed-in viewer.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_trip(
///     Auth(viewer): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<TripMutationResponse>, ApiError> {
///     // viewer.user_id becomes the trip's creator
/// }
/// ```
pub struct Auth(pub Viewer);

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(AuthError::InvalidAuthHeader)
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AuthError::MissingAuthHeader)?;
        let viewer = state
            .sessions
            .viewer(token)
            .ok_or(AuthError::InvalidSession)?;
        Ok(Auth(viewer))
    }
}

/// Optional viewer extractor.
///
/// Anonymous callers get `None` and see public records only. A header that is
/// present but malformed or names an ended session is still rejected, so a
/// stale client does not silently fall back to the anonymous view.
pub struct OptionalAuth(pub Option<Viewer>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            None => Ok(OptionalAuth(None)),
            Some(token) => {
                let viewer = state
                    .sessions
                    .viewer(token)
                    .ok_or(AuthError::InvalidSession)?;
                Ok(OptionalAuth(Some(viewer)))
            }
        }
    }
}
