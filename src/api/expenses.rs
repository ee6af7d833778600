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
    budget::BudgetSummary,
    controller::{ExpenseBoard, Notification},
    error::ApiError,
    models::{Expense, Trip},
    state::AppState,
    validation::ExpenseForm,
};

/// One trip's expense screen.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseBoardResponse {
    pub trip: Trip,
    /// Expenses the viewer may see.
    pub expenses: Vec<Expense>,
    /// Totals over every expense of the trip, visible or not.
    pub summary: BudgetSummary,
    /// Whether the viewer created the trip and may add expenses.
    pub is_creator: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseMutationResponse {
    pub expense: Expense,
    pub summary: BudgetSummary,
    pub notification: Notification,
}

fn mutation_response(
    board: &ExpenseBoard<'_>,
    (expense, notification): (Expense, Notification),
) -> ExpenseMutationResponse {
    ExpenseMutationResponse {
        expense,
        summary: board.summary(),
        notification,
    }
}

#[utoipa::path(
    get,
    path = "/v1/trips/{trip_id}/expenses",
    params(("trip_id" = String, Path, description = "Trip identifier")),
    tag = "Expenses",
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, body = ExpenseBoardResponse),
        (status = 404, description = "Missing, or private to another user")
    )
)]
pub async fn expense_board(
    Path(trip_id): Path<String>,
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<ExpenseBoardResponse>, ApiError> {
    let board = ExpenseBoard::load(state.documents(), viewer, &trip_id)?;
    Ok(Json(ExpenseBoardResponse {
        trip: board.trip().clone(),
        expenses: board.visible_expenses(),
        summary: board.summary(),
        is_creator: board.is_creator(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/trips/{trip_id}/expenses",
    params(("trip_id" = String, Path, description = "Trip identifier")),
    request_body = ExpenseForm,
    tag = "Expenses",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = ExpenseMutationResponse),
        (status = 403, description = "Viewer did not create the trip"),
        (status = 404),
        (status = 422, description = "Form validation failed")
    )
)]
pub async fn add_expense(
    Path(trip_id): Path<String>,
    Auth(viewer): Auth,
    State(state): State<AppState>,
    Json(form): Json<ExpenseForm>,
) -> Result<(StatusCode, Json<ExpenseMutationResponse>), ApiError> {
    let mut board = ExpenseBoard::load(state.documents(), Some(viewer), &trip_id)?;
    let applied = applied(board.add_expense(&form)?)?;
    Ok((StatusCode::CREATED, Json(mutation_response(&board, applied))))
}

#[utoipa::path(
    put,
    path = "/v1/trips/{trip_id}/expenses/{expense_id}",
    params(
        ("trip_id" = String, Path, description = "Trip identifier"),
        ("expense_id" = String, Path, description = "Expense identifier")
    ),
    request_body = ExpenseForm,
    tag = "Expenses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = ExpenseMutationResponse),
        (status = 403, description = "Viewer did not create the expense"),
        (status = 404),
        (status = 422, description = "Form validation failed")
    )
)]
pub async fn edit_expense(
    Path((trip_id, expense_id)): Path<(String, String)>,
    Auth(viewer): Auth,
    State(state): State<AppState>,
    Json(form): Json<ExpenseForm>,
) -> Result<Json<ExpenseMutationResponse>, ApiError> {
    let mut board = ExpenseBoard::load(state.documents(), Some(viewer), &trip_id)?;
    let applied = applied(board.edit_expense(&expense_id, &form)?)?;
    Ok(Json(mutation_response(&board, applied)))
}

#[utoipa::path(
    delete,
    path = "/v1/trips/{trip_id}/expenses/{expense_id}",
    params(
        ("trip_id" = String, Path, description = "Trip identifier"),
        ("expense_id" = String, Path, description = "Expense identifier")
    ),
    tag = "Expenses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = ExpenseMutationResponse),
        (status = 403, description = "Viewer did not create the expense"),
        (status = 404)
    )
)]
pub async fn delete_expense(
    Path((trip_id, expense_id)): Path<(String, String)>,
    Auth(viewer): Auth,
    State(state): State<AppState>,
) -> Result<Json<ExpenseMutationResponse>, ApiError> {
    let mut board = ExpenseBoard::load(state.documents(), Some(viewer), &trip_id)?;
    let applied = applied(board.delete_expense(&expense_id)?)?;
    Ok(Json(mutation_response(&board, applied)))
}
