// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    budget::BudgetSummary,
    controller::{Notification, NotificationKind, Outcome},
    error::ApiError,
    identity::{Identity, Session},
    models::{Currency, Expense, ExpenseCategory, Trip, UserProfile, Visibility},
    state::AppState,
    validation::{ExpenseForm, TripForm},
};

pub mod auth;
pub mod expenses;
pub mod health;
pub mod trips;

const NOT_CREATOR: &str = "Only the creator can change this record.";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unwrap an applied intent. A refused one becomes 403.
fn applied<T>(outcome: Outcome<T>) -> Result<(T, Notification), ApiError> {
    match outcome {
        Outcome::Applied {
            record,
            notification,
        } => Ok((record, notification)),
        Outcome::Refused => Err(ApiError::forbidden(NOT_CREATOR)),
    }
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/federated", post(auth::federated_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/trips", get(trips::list_trips).post(trips::create_trip))
        .route("/trips/sample", post(trips::create_sample_trip))
        .route(
            "/trips/{trip_id}",
            get(trips::get_trip)
                .put(trips::update_trip)
                .delete(trips::delete_trip),
        )
        .route(
            "/trips/{trip_id}/expenses",
            get(expenses::expense_board).post(expenses::add_expense),
        )
        .route(
            "/trips/{trip_id}/expenses/{expense_id}",
            put(expenses::edit_expense).delete(expenses::delete_expense),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .layer(CorsLayer::permissive())
}

/// Trace span for one request, tagged with its request id.
fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Session token returned by sign-in"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::signup,
        auth::login,
        auth::federated_login,
        auth::logout,
        auth::me,
        trips::list_trips,
        trips::create_trip,
        trips::create_sample_trip,
        trips::get_trip,
        trips::update_trip,
        trips::delete_trip,
        expenses::expense_board,
        expenses::add_expense,
        expenses::edit_expense,
        expenses::delete_expense
    ),
    components(
        schemas(
            Trip,
            Expense,
            UserProfile,
            Visibility,
            Currency,
            ExpenseCategory,
            TripForm,
            ExpenseForm,
            BudgetSummary,
            Notification,
            NotificationKind,
            Identity,
            Session,
            auth::SignupRequest,
            auth::SignupResponse,
            auth::LoginRequest,
            auth::FederatedLoginRequest,
            auth::MeResponse,
            trips::TripMutationResponse,
            trips::TripDetailResponse,
            expenses::ExpenseBoardResponse,
            expenses::ExpenseMutationResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Trips", description = "Trip planning"),
        (name = "Expenses", description = "Per-trip expenses and budget summary")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_route_responds() {
        let response = router(AppState::default())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn anonymous_trip_list_is_empty() {
        let response = router(AppState::default())
            .oneshot(Request::get("/v1/trips").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"[]");
    }

    #[tokio::test]
    async fn create_trip_requires_bearer_token() {
        let response = router(AppState::default())
            .oneshot(
                Request::post("/v1/trips")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn stale_token_is_rejected_on_public_routes() {
        let response = router(AppState::default())
            .oneshot(
                Request::get("/v1/trips")
                    .header("authorization", "Bearer not-a-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = router(AppState::default())
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("request id header")
            .to_str()
            .unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn client_request_id_is_echoed() {
        let response = router(AppState::default())
            .oneshot(
                Request::get("/health/live")
                    .header("x-request-id", "trace-me-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "trace-me-42");
    }

    #[test]
    fn openapi_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/v1/trips/{trip_id}/expenses"));
    }
}
