// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-up, sign-in and sign-out.
//!
//! Sign-in handlers return only once the session manager has applied the
//! `SignedIn` event, so the returned token is immediately usable.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    auth::{verify_id_token, Auth},
    error::ApiError,
    identity::{Credentials, Identity, Session},
    models::UserProfile,
    state::AppState,
    storage::UserProfileRepository,
};

/// How long a handler waits for the session table to reflect its event.
const SESSION_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Display name. Defaults to the local part of the email.
    #[serde(default)]
    pub name: Option<String>,
    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default)]
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub identity: Identity,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FederatedLoginRequest {
    /// ID token issued by the federated provider.
    pub id_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

async fn await_session(state: &AppState, session: Session) -> Result<Session, ApiError> {
    state
        .sessions
        .wait_for_session(&session.token, SESSION_PROPAGATION_TIMEOUT)
        .await
        .ok_or_else(|| {
            warn!(user_id = %session.identity.user_id, "Session was not applied in time");
            ApiError::internal("Session could not be established")
        })
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses(
        (status = 201, body = SignupResponse),
        (status = 400, description = "Invalid email or weak password"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let credentials = Credentials {
        email: request.email,
        password: request.password,
    };
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let identity = state.identity.sign_up(&credentials, name)?;

    let profile = UserProfileRepository::new(state.documents()).add(&UserProfile {
        id: String::new(),
        user_id: identity.user_id.clone(),
        name: identity.display_name.clone(),
        email: identity.email.clone(),
        dob: request.dob,
    })?;

    info!(user_id = %identity.user_id, "Account created");
    Ok((StatusCode::CREATED, Json(SignupResponse { identity, profile })))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = Session),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.identity.sign_in(&Credentials {
        email: request.email,
        password: request.password,
    })?;
    Ok(Json(await_session(&state, session).await?))
}

#[utoipa::path(
    post,
    path = "/v1/auth/federated",
    request_body = FederatedLoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = Session),
        (status = 400, description = "Token carries no email"),
        (status = 401, description = "ID token rejected"),
        (status = 409, description = "Email belongs to another account"),
        (status = 503, description = "Federated sign-in is not configured")
    )
)]
pub async fn federated_login(
    State(state): State<AppState>,
    Json(request): Json<FederatedLoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let claims = verify_id_token(&request.id_token, &state.auth_config).await?;
    let session = state.identity.sign_in_federated(&claims.into_assertion())?;
    Ok(Json(await_session(&state, session).await?))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 401),
        (status = 500, description = "Session table did not drop the token in time")
    )
)]
pub async fn logout(
    Auth(viewer): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.identity.sign_out(&viewer.session_token)?;
    if !state
        .sessions
        .wait_for_sign_out(&viewer.session_token, SESSION_PROPAGATION_TIMEOUT)
        .await
    {
        warn!(user_id = %viewer.user_id, "Sign-out was not applied in time");
        return Err(ApiError::internal("Sign-out could not be confirmed"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses((status = 200, body = MeResponse), (status = 401))
)]
pub async fn me(
    Auth(viewer): Auth,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, ApiError> {
    let session = state
        .sessions
        .resolve(&viewer.session_token)
        .ok_or_else(|| ApiError::unauthorized("Session is not active."))?;
    let profile = UserProfileRepository::new(state.documents()).find_by_user(&viewer.user_id)?;
    Ok(Json(MeResponse { session, profile }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::federated::tests::unsigned_id_token;
    use crate::identity::{IdentityEvent, Viewer};
    use crate::state::AuthConfig;
    use tokio_util::sync::CancellationToken;

    /// In-memory state with the session manager running.
    pub(crate) fn running_state() -> (AppState, CancellationToken) {
        let state = AppState::default();
        let shutdown = CancellationToken::new();
        state.spawn_session_manager(shutdown.clone());
        (state, shutdown)
    }

    /// Sign up and sign in `email`, returning the viewer for the new session.
    pub(crate) async fn sign_in_as(state: &AppState, email: &str) -> Viewer {
        let (status, _) = signup(
            State(state.clone()),
            Json(SignupRequest {
                email: email.to_string(),
                password: "secret1".to_string(),
                name: None,
                dob: None,
            }),
        )
        .await
        .expect("signup succeeds");
        assert_eq!(status, StatusCode::CREATED);

        let Json(session) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: email.to_string(),
                password: "secret1".to_string(),
            }),
        )
        .await
        .expect("login succeeds");
        session.viewer()
    }

    #[tokio::test]
    async fn signup_writes_profile_document() {
        let (state, shutdown) = running_state();
        let (status, Json(body)) = signup(
            State(state.clone()),
            Json(SignupRequest {
                email: "Ada@Example.com".to_string(),
                password: "secret1".to_string(),
                name: Some("Ada Lovelace".to_string()),
                dob: Some("1815-12-10".parse().unwrap()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.identity.email, "ada@example.com");
        assert_eq!(body.profile.name, "Ada Lovelace");

        let stored = UserProfileRepository::new(state.documents())
            .find_by_user(&body.identity.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, body.profile);
        // Sign-up alone does not open a session.
        assert_eq!(state.sessions.active_sessions(), 0);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn duplicate_signup_is_conflict() {
        let (state, shutdown) = running_state();
        sign_in_as(&state, "ada@example.com").await;

        let err = signup(
            State(state),
            Json(SignupRequest {
                email: "ada@example.com".to_string(),
                password: "another1".to_string(),
                name: None,
                dob: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn login_session_is_resolvable_immediately() {
        let (state, shutdown) = running_state();
        let viewer = sign_in_as(&state, "ada@example.com").await;

        assert_eq!(state.sessions.viewer(&viewer.session_token), Some(viewer.clone()));

        let Json(me) = me(Auth(viewer.clone()), State(state.clone())).await.unwrap();
        assert_eq!(me.session.identity.user_id, viewer.user_id);
        assert_eq!(me.profile.map(|p| p.email).as_deref(), Some("ada@example.com"));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, shutdown) = running_state();
        sign_in_as(&state, "ada@example.com").await;

        let err = login(
            State(state),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn logout_ends_session() {
        let (state, shutdown) = running_state();
        let viewer = sign_in_as(&state, "ada@example.com").await;

        let status = logout(Auth(viewer.clone()), State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.viewer(&viewer.session_token).is_none());
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn logout_fails_when_sign_out_is_not_applied() {
        // No session manager running, so the table never drops the token.
        let state = AppState::default();
        let credentials = Credentials {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
        };
        state.identity.sign_up(&credentials, None).unwrap();
        let session = state.identity.sign_in(&credentials).unwrap();
        state.sessions.apply(&IdentityEvent::SignedIn(session.clone()));

        let err = logout(Auth(session.viewer()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Sign-out could not be confirmed");
    }

    #[tokio::test]
    async fn federated_login_in_development_mode() {
        let (state, shutdown) = running_state();
        let state = state.with_auth_config(AuthConfig::development());
        let token = unsigned_id_token(serde_json::json!({
            "sub": "fed-1",
            "iss": "https://accounts.example.com",
            "exp": 9999999999i64,
            "email": "fed@example.com",
            "name": "Fed User"
        }));

        let Json(session) = federated_login(
            State(state.clone()),
            Json(FederatedLoginRequest { id_token: token }),
        )
        .await
        .unwrap();

        assert_eq!(session.identity.display_name, "Fed User");
        assert!(state.sessions.resolve(&session.token).is_some());
        shutdown.cancel();
    }

    #[tokio::test]
    async fn federated_login_without_email_is_bad_request() {
        let (state, shutdown) = running_state();
        let state = state.with_auth_config(AuthConfig::development());
        let token = unsigned_id_token(serde_json::json!({
            "sub": "fed-2",
            "iss": "https://accounts.example.com",
            "exp": 9999999999i64
        }));

        let err = federated_login(State(state), Json(FederatedLoginRequest { id_token: token }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn federated_login_is_refused_without_jwks_or_development_mode() {
        let (state, shutdown) = running_state();
        let token = unsigned_id_token(serde_json::json!({
            "sub": "fed-3",
            "exp": 9999999999i64,
            "email": "someone@example.com"
        }));

        let err = federated_login(
            State(state.clone()),
            Json(FederatedLoginRequest { id_token: token }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.sessions.active_sessions(), 0);
        shutdown.cancel();
    }
}
