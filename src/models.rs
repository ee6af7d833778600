// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Records persisted through the document store and returned by the API.
//! All types derive `Serialize`, `Deserialize`, and `ToSchema` for JSON
//! handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Trips**: planned journeys with dates, a budget, and a visibility
//! - **Expenses**: categorized cost entries scoped to one trip
//! - **User profiles**: sign-up details stored alongside the identity
//!
//! Identifiers are assigned by storage and are not part of the stored
//! document body; repositories fill them in when reading.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::budget::deserialize_amount;
use crate::storage::CreatedResource;
use crate::visibility::Visible;

// =============================================================================
// Enumerations
// =============================================================================

/// Access policy on a trip or expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Readable by any viewer.
    Public,
    /// Readable only by the creator.
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currencies a trip budget can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Inr,
    Cad,
    Gbp,
    Jpy,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
            Currency::Cad => "CAD",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Accommodation,
    Transportation,
    Food,
    Activities,
    #[serde(rename = "flight ticket")]
    FlightTicket,
    Others,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Accommodation => "accommodation",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::Food => "food",
            ExpenseCategory::Activities => "activities",
            ExpenseCategory::FlightTicket => "flight ticket",
            ExpenseCategory::Others => "others",
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Trip
// =============================================================================

/// A planned journey.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Trip {
    /// Storage-assigned identifier.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Budget amount. Legacy text values are coerced to numbers on read.
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "deserialize_amount"
    )]
    #[schema(value_type = f64, example = 1800)]
    pub budget: Decimal,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub visibility: Visibility,
    /// Identity that created the trip; immutable.
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Apply an update locally, as storage would after merging it.
    pub fn with_changes(&self, changes: &TripChanges) -> Trip {
        Trip {
            title: changes.title.clone(),
            destination: changes.destination.clone(),
            start_date: changes.start_date,
            end_date: changes.end_date,
            budget: changes.budget,
            currency: changes.currency,
            visibility: changes.visibility,
            updated_at: Some(changes.updated_at),
            ..self.clone()
        }
    }
}

impl CreatedResource for Trip {
    fn creator_id(&self) -> &str {
        &self.creator_id
    }
}

impl Visible for Trip {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// Fields written by a trip update. The creator is deliberately absent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripChanges {
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub budget: Decimal,
    pub currency: Currency,
    pub visibility: Visibility,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// A cost entry scoped to one trip.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Expense {
    /// Storage-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Owning trip, derived from the collection the expense lives in.
    #[serde(default)]
    pub trip_id: String,
    pub category: ExpenseCategory,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "deserialize_amount"
    )]
    #[schema(value_type = f64, example = 250.0)]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub creator_id: String,
    /// Copied from the trip at creation and never re-synced.
    #[serde(default)]
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    /// Apply an edit locally, as storage would after merging it.
    pub fn with_changes(&self, changes: &ExpenseChanges) -> Expense {
        Expense {
            category: changes.category,
            amount: changes.amount,
            description: changes.description.clone(),
            updated_at: Some(changes.updated_at),
            ..self.clone()
        }
    }
}

impl CreatedResource for Expense {
    fn creator_id(&self) -> &str {
        &self.creator_id
    }
}

impl Visible for Expense {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// Fields written by an expense edit. Visibility is never touched.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExpenseChanges {
    pub category: ExpenseCategory,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    /// Serialized as `null` when cleared so the merge overwrites old text.
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User Profile
// =============================================================================

/// Profile details captured at sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
}
