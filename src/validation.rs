// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trip and expense form validation.
//!
//! Validation runs before any collaborator call. A form that fails here
//! never reaches storage and never receives an identifier.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::budget::parse_amount;
use crate::models::{Currency, ExpenseCategory, Visibility};

/// Reasons a submitted form is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill all fields before continuing.")]
    MissingFields(Vec<&'static str>),

    #[error("Dates cannot be in the past.")]
    DateInPast,

    #[error("End date cannot be before the start date.")]
    EndBeforeStart,

    #[error("Please fill in category and amount.")]
    MissingExpenseFields,

    #[error("The {field} must be a number.")]
    NotNumeric { field: &'static str },

    #[error("The {field} cannot be negative.")]
    Negative { field: &'static str },
}

fn present_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A JSON value counts as filled in unless it is null or blank text.
fn present_value(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn non_negative_amount(value: &Value, field: &'static str) -> Result<Decimal, FormError> {
    let amount = parse_amount(value).ok_or(FormError::NotNumeric { field })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FormError::Negative { field });
    }
    Ok(amount)
}

// =============================================================================
// Trip Form
// =============================================================================

/// Trip form as submitted for create and update.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TripForm {
    #[schema(example = "Spring Break in Amsterdam")]
    pub title: Option<String>,
    #[schema(example = "Amsterdam")]
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Number or numeric text.
    #[schema(value_type = Option<f64>, example = 1800)]
    pub budget: Option<Value>,
    pub currency: Option<Currency>,
    pub visibility: Option<Visibility>,
}

/// A trip form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTrip {
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Decimal,
    pub currency: Currency,
    pub visibility: Visibility,
}

impl TripForm {
    /// Validate against the calendar day `today`.
    ///
    /// Checks run in order: required fields, past dates, date order, budget.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidTrip, FormError> {
        let title = present_text(&self.title);
        let destination = present_text(&self.destination);
        let budget = present_value(&self.budget);

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if destination.is_none() {
            missing.push("destination");
        }
        if self.start_date.is_none() {
            missing.push("start_date");
        }
        if self.end_date.is_none() {
            missing.push("end_date");
        }
        if budget.is_none() {
            missing.push("budget");
        }
        if self.currency.is_none() {
            missing.push("currency");
        }
        if self.visibility.is_none() {
            missing.push("visibility");
        }

        let (
            Some(title),
            Some(destination),
            Some(start_date),
            Some(end_date),
            Some(budget),
            Some(currency),
            Some(visibility),
        ) = (
            title,
            destination,
            self.start_date,
            self.end_date,
            budget,
            self.currency,
            self.visibility,
        )
        else {
            return Err(FormError::MissingFields(missing));
        };

        if start_date < today || end_date < today {
            return Err(FormError::DateInPast);
        }
        if end_date < start_date {
            return Err(FormError::EndBeforeStart);
        }
        let budget = non_negative_amount(budget, "budget")?;

        Ok(ValidTrip {
            title: title.to_string(),
            destination: destination.to_string(),
            start_date,
            end_date,
            budget,
            currency,
            visibility,
        })
    }
}

// =============================================================================
// Expense Form
// =============================================================================

/// Expense form as submitted for add and edit.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExpenseForm {
    pub category: Option<ExpenseCategory>,
    /// Number or numeric text.
    #[schema(value_type = Option<f64>, example = 42.5)]
    pub amount: Option<Value>,
    pub description: Option<String>,
}

/// An expense form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExpense {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl ExpenseForm {
    pub fn validate(&self) -> Result<ValidExpense, FormError> {
        let (Some(category), Some(amount)) = (self.category, present_value(&self.amount)) else {
            return Err(FormError::MissingExpenseFields);
        };

        Ok(ValidExpense {
            category,
            amount: non_negative_amount(amount, "amount")?,
            description: present_text(&self.description).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn today() -> NaiveDate {
        "2026-10-18".parse().unwrap()
    }

    fn complete_form() -> TripForm {
        TripForm {
            title: Some("Spring Break".into()),
            destination: Some("Amsterdam".into()),
            start_date: "2026-11-01".parse().ok(),
            end_date: "2026-11-07".parse().ok(),
            budget: Some(json!("1800")),
            currency: Some(Currency::Eur),
            visibility: Some(Visibility::Public),
        }
    }

    #[test]
    fn complete_form_is_valid() {
        let valid = complete_form().validate(today()).unwrap();
        assert_eq!(valid.budget, dec!(1800));
        assert_eq!(valid.title, "Spring Break");
    }

    #[test]
    fn missing_fields_are_reported() {
        let form = TripForm {
            title: Some("   ".into()),
            budget: Some(json!("")),
            ..complete_form()
        };
        assert_eq!(
            form.validate(today()),
            Err(FormError::MissingFields(vec!["title", "budget"]))
        );

        let err = TripForm::default().validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "Please fill all fields before continuing.");
    }

    #[test]
    fn start_date_before_today_is_rejected() {
        let form = TripForm {
            start_date: "2026-10-17".parse().ok(),
            ..complete_form()
        };
        assert_eq!(form.validate(today()), Err(FormError::DateInPast));
    }

    #[test]
    fn trip_may_start_today() {
        let form = TripForm {
            start_date: Some(today()),
            end_date: Some(today()),
            ..complete_form()
        };
        assert!(form.validate(today()).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let form = TripForm {
            start_date: "2026-11-07".parse().ok(),
            end_date: "2026-11-01".parse().ok(),
            ..complete_form()
        };
        assert_eq!(form.validate(today()), Err(FormError::EndBeforeStart));
    }

    #[test]
    fn budget_must_be_numeric_and_non_negative() {
        let form = TripForm {
            budget: Some(json!("lots")),
            ..complete_form()
        };
        assert_eq!(
            form.validate(today()),
            Err(FormError::NotNumeric { field: "budget" })
        );

        let form = TripForm {
            budget: Some(json!(-5)),
            ..complete_form()
        };
        assert_eq!(
            form.validate(today()),
            Err(FormError::Negative { field: "budget" })
        );
    }

    #[test]
    fn expense_requires_category_and_amount() {
        let form = ExpenseForm {
            category: Some(ExpenseCategory::Food),
            amount: None,
            description: None,
        };
        assert_eq!(form.validate(), Err(FormError::MissingExpenseFields));

        let form = ExpenseForm {
            category: None,
            amount: Some(json!(10)),
            description: None,
        };
        assert_eq!(form.validate(), Err(FormError::MissingExpenseFields));
    }

    #[test]
    fn expense_amount_is_coerced_and_description_trimmed() {
        let form = ExpenseForm {
            category: Some(ExpenseCategory::FlightTicket),
            amount: Some(json!(" 420.00 ")),
            description: Some("   ".into()),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.amount, dec!(420));
        assert_eq!(valid.description, None);
    }

    #[test]
    fn zero_amount_is_accepted() {
        let form = ExpenseForm {
            category: Some(ExpenseCategory::Others),
            amount: Some(json!(0)),
            description: Some("Free museum day".into()),
        };
        assert_eq!(form.validate().unwrap().amount, Decimal::ZERO);
    }
}
