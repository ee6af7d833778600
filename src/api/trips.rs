// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::applied;
use crate::{
    auth::{Auth, OptionalAuth},
    controller::{Notification, TripBoard},
    error::ApiError,
    models::Trip,
    state::AppState,
    validation::TripForm,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TripMutationResponse {
    pub trip: Trip,
    pub notification: Notification,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TripDetailResponse {
    pub trip: Trip,
    /// Whether the viewer may edit or delete this trip.
    pub is_creator: bool,
}

#[utoipa::path(
    get,
    path = "/v1/trips",
    tag = "Trips",
    security((), ("bearer_auth" = [])),
    responses((status = 200, body = [Trip]))
)]
pub async fn list_trips(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Trip>>, ApiError> {
    let board = TripBoard::load(state.documents(), viewer)?;
    Ok(Json(board.into_trips()))
}

#[utoipa::path(
    post,
    path = "/v1/trips",
    request_body = TripForm,
    tag = "Trips",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = TripMutationResponse),
        (status = 401),
        (status = 422, description = "Form validation failed")
    )
)]
pub async fn create_trip(
    Auth(viewer): Auth,
    State(state): State<AppState>,
    Json(form): Json<TripForm>,
) -> Result<(StatusCode, Json<TripMutationResponse>), ApiError> {
    let mut board = TripBoard::new(state.documents(), Some(viewer));
    let (trip, notification) = applied(board.create_trip(&form)?)?;
    Ok((
        StatusCode::CREATED,
        Json(TripMutationResponse { trip, notification }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/trips/sample",
    tag = "Trips",
    security(("bearer_auth" = [])),
    responses((status = 201, body = TripMutationResponse), (status = 401))
)]
pub async fn create_sample_trip(
    Auth(viewer): Auth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TripMutationResponse>), ApiError> {
    let mut board = TripBoard::new(state.documents(), Some(viewer));
    let (trip, notification) = applied(board.add_sample_trip()?)?;
    Ok((
        StatusCode::CREATED,
        Json(TripMutationResponse { trip, notification }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = String, Path, description = "Trip identifier")),
    tag = "Trips",
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, body = TripDetailResponse),
        (status = 404, description = "Missing, or private to another user")
    )
)]
pub async fn get_trip(
    Path(trip_id): Path<String>,
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<TripDetailResponse>, ApiError> {
    let board = TripBoard::load_trip(state.documents(), viewer, &trip_id)?;
    let is_creator = board.is_creator(&trip_id);
    let trip = board
        .into_trips()
        .pop()
        .ok_or_else(|| ApiError::not_found("Trip not found"))?;
    Ok(Json(TripDetailResponse { trip, is_creator }))
}

#[utoipa::path(
    put,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = String, Path, description = "Trip identifier")),
    request_body = TripForm,
    tag = "Trips",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = TripMutationResponse),
        (status = 403, description = "Viewer is not the creator"),
        (status = 404),
        (status = 422, description = "Form validation failed")
    )
)]
pub async fn update_trip(
    Path(trip_id): Path<String>,
    Auth(viewer): Auth,
    State(state): State<AppState>,
    Json(form): Json<TripForm>,
) -> Result<Json<TripMutationResponse>, ApiError> {
    let mut board = TripBoard::load_trip(state.documents(), Some(viewer), &trip_id)?;
    let (trip, notification) = applied(board.update_trip(&trip_id, &form)?)?;
    Ok(Json(TripMutationResponse { trip, notification }))
}

#[utoipa::path(
    delete,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = String, Path, description = "Trip identifier")),
    tag = "Trips",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = TripMutationResponse),
        (status = 403, description = "Viewer is not the creator"),
        (status = 404)
    )
)]
pub async fn delete_trip(
    Path(trip_id): Path<String>,
    Auth(viewer): Auth,
    State(state): State<AppState>,
) -> Result<Json<TripMutationResponse>, ApiError> {
    let mut board = TripBoard::load_trip(state.documents(), Some(viewer), &trip_id)?;
    let (trip, notification) = applied(board.delete_trip(&trip_id)?)?;
    Ok(Json(TripMutationResponse { trip, notification }))
}
