// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Expense board for a single trip.
//!
//! Holds every expense of the trip so the budget summary reflects real
//! spend, and exposes the viewer-filtered subset for display.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{storage_failure, ControllerError, Outcome, SIGN_IN_REQUIRED};
use crate::budget::{self, BudgetSummary};
use crate::identity::Viewer;
use crate::models::{Expense, ExpenseChanges, Trip};
use crate::storage::{CreatedResource, DocumentStore, ExpenseRepository, TripRepository};
use crate::validation::ExpenseForm;
use crate::visibility;

pub const EXPENSE_ADDED: &str = "Expense added successfully!";
pub const EXPENSE_UPDATED: &str = "Expense updated successfully!";
pub const EXPENSE_DELETED: &str = "Expense deleted successfully!";

pub struct ExpenseBoard<'a> {
    store: &'a dyn DocumentStore,
    viewer: Option<Viewer>,
    trip: Trip,
    expenses: Vec<Expense>,
    summary: BudgetSummary,
}

impl<'a> ExpenseBoard<'a> {
    /// Load a trip and all of its expenses, then aggregate once.
    ///
    /// A missing trip, or a private trip the viewer did not create, is
    /// reported as not found.
    pub fn load(
        store: &'a dyn DocumentStore,
        viewer: Option<Viewer>,
        trip_id: &str,
    ) -> Result<Self, ControllerError> {
        let viewer_id = viewer.as_ref().map(|v| v.user_id.as_str());
        let trip = TripRepository::new(store)
            .get(trip_id)
            .map_err(storage_failure("Failed to load trip", "Trip"))?
            .filter(|trip| visibility::is_visible(trip, viewer_id))
            .ok_or(ControllerError::NotFound("Trip"))?;

        let expenses = ExpenseRepository::new(store, trip_id)
            .and_then(|repo| repo.list())
            .map_err(storage_failure("Failed to load expenses", "Trip"))?;

        let summary = budget::aggregate(&expenses, trip.budget);
        debug!(trip_id, expenses = expenses.len(), total = %summary.total, "Loaded expenses");

        Ok(Self {
            store,
            viewer,
            trip,
            expenses,
            summary,
        })
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer.as_ref().map(|v| v.user_id.as_str())
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    /// Expenses the viewer may see, in storage order.
    pub fn visible_expenses(&self) -> Vec<Expense> {
        visibility::filter(&self.expenses, self.viewer_id())
    }

    /// Budget summary over every expense of the trip.
    pub fn summary(&self) -> BudgetSummary {
        self.summary
    }

    /// Whether the viewer created the trip, and so may add expenses.
    pub fn is_creator(&self) -> bool {
        self.trip.is_created_by(self.viewer_id())
    }

    fn repository(&self) -> Result<ExpenseRepository<'a>, ControllerError> {
        ExpenseRepository::new(self.store, &self.trip.id)
            .map_err(storage_failure("Failed to open expenses", "Trip"))
    }

    fn reaggregate(&mut self) {
        self.summary = budget::aggregate(&self.expenses, self.trip.budget);
    }

    /// Locate a local expense the viewer may change.
    ///
    /// `Ok(None)` means the viewer is not its creator.
    fn owned_expense(&self, expense_id: &str) -> Result<Option<&Expense>, ControllerError> {
        let expense = self
            .expenses
            .iter()
            .find(|e| e.id == expense_id)
            .ok_or(ControllerError::NotFound("Expense"))?;
        if expense.is_created_by(self.viewer_id()) {
            Ok(Some(expense))
        } else {
            debug!(expense_id, viewer = ?self.viewer_id(), "Refusing change by non-creator");
            Ok(None)
        }
    }

    // ========== Intents ==========

    /// Add an expense to the trip. Only the trip creator may do this.
    ///
    /// The new expense takes the trip's current visibility.
    pub fn add_expense(&mut self, form: &ExpenseForm) -> Result<Outcome<Expense>, ControllerError> {
        let creator_id = self
            .viewer
            .as_ref()
            .ok_or(ControllerError::Unauthenticated(SIGN_IN_REQUIRED))?
            .user_id
            .clone();
        if !self.is_creator() {
            debug!(trip_id = %self.trip.id, viewer = %creator_id, "Refusing expense by non-creator");
            return Ok(Outcome::Refused);
        }

        let valid = form.validate()?;
        let expense = Expense {
            id: String::new(),
            trip_id: self.trip.id.clone(),
            category: valid.category,
            amount: valid.amount,
            description: valid.description,
            creator_id,
            visibility: self.trip.visibility,
            created_at: Utc::now(),
            updated_at: None,
        };

        let expense = self
            .repository()?
            .add(&expense)
            .map_err(storage_failure("Failed to add expense", "Trip"))?;

        info!(trip_id = %expense.trip_id, expense_id = %expense.id, amount = %expense.amount, "Expense added");
        self.expenses.push(expense.clone());
        self.reaggregate();
        Ok(Outcome::applied(expense, EXPENSE_ADDED))
    }

    /// Edit an expense the viewer created. Visibility is left as it was.
    pub fn edit_expense(
        &mut self,
        expense_id: &str,
        form: &ExpenseForm,
    ) -> Result<Outcome<Expense>, ControllerError> {
        if self.viewer.is_none() {
            return Err(ControllerError::Unauthenticated(SIGN_IN_REQUIRED));
        }
        let Some(current) = self.owned_expense(expense_id)? else {
            return Ok(Outcome::Refused);
        };

        let valid = form.validate()?;
        let changes = ExpenseChanges {
            category: valid.category,
            amount: valid.amount,
            description: valid.description,
            updated_at: Utc::now(),
        };
        let patched = current.with_changes(&changes);

        let repo = self.repository()?;
        repo.update(expense_id, &changes)
            .map_err(storage_failure("Failed to update expense", "Expense"))?;

        let refreshed = match repo.get(expense_id) {
            Ok(Some(expense)) => expense,
            Ok(None) => patched,
            Err(e) => {
                warn!(expense_id, error = %e, "Re-read after update failed, using local copy");
                patched
            }
        };

        info!(trip_id = %self.trip.id, expense_id, "Expense updated");
        if let Some(slot) = self.expenses.iter_mut().find(|e| e.id == expense_id) {
            *slot = refreshed.clone();
        }
        self.reaggregate();
        Ok(Outcome::applied(refreshed, EXPENSE_UPDATED))
    }

    /// Delete an expense the viewer created.
    pub fn delete_expense(&mut self, expense_id: &str) -> Result<Outcome<Expense>, ControllerError> {
        if self.viewer.is_none() {
            return Err(ControllerError::Unauthenticated(SIGN_IN_REQUIRED));
        }
        let Some(current) = self.owned_expense(expense_id)?.cloned() else {
            return Ok(Outcome::Refused);
        };

        self.repository()?
            .delete(expense_id)
            .map_err(storage_failure("Failed to delete expense", "Expense"))?;

        info!(trip_id = %self.trip.id, expense_id, "Expense deleted");
        self.expenses.retain(|e| e.id != expense_id);
        self.reaggregate();
        Ok(Outcome::applied(current, EXPENSE_DELETED))
    }
}
