// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Budget Aggregation
//!
//! Sums expense amounts for a trip and flags when spend exceeds the budget.
//!
//! The total covers every expense of the trip, including line items the
//! viewer cannot see, so the flag reflects the trip's real spend.
//!
//! ## Amount Coercion
//!
//! Stored amounts and budgets may be JSON numbers or numeric text (older
//! documents kept budgets as strings). Anything that does not parse as a
//! number counts as zero.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::Expense;

/// Parse a JSON value as a decimal amount.
///
/// Returns `None` for anything that is not a number or numeric text.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

/// Coerce a JSON value to an amount, treating non-numeric input as zero.
pub fn coerce_amount(value: &Value) -> Decimal {
    parse_amount(value).unwrap_or(Decimal::ZERO)
}

/// Serde helper for amount fields that may hold legacy text values.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}

/// Derived spend figures for one trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BudgetSummary {
    /// Sum of every expense amount
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64)]
    pub total: Decimal,
    /// Trip budget the total is compared against
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    #[schema(value_type = f64)]
    pub budget: Decimal,
    /// `total > budget`
    pub exceeded: bool,
}

impl BudgetSummary {
    /// Amount left before the budget is exceeded. Negative once over.
    pub fn remaining(&self) -> Decimal {
        self.budget - self.total
    }
}

/// Sum `expenses` and compare against `budget`.
///
/// The sum saturates at `Decimal::MAX` instead of overflowing.
pub fn aggregate(expenses: &[Expense], budget: Decimal) -> BudgetSummary {
    let total = expenses.iter().fold(Decimal::ZERO, |acc, expense| {
        acc.checked_add(expense.amount).unwrap_or(Decimal::MAX)
    });

    BudgetSummary {
        total,
        budget,
        exceeded: total > budget,
    }
}
