//! Expense domain model.

use chrono::{NaiveDate, NaiveDateTime};
use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};

use super::ids::ExpenseId;
use super::timestamp;
use crate::error::DomainError;

/// A single payment made by one traveler during a trip.
///
/// Expenses are append-only within a trip's working set; they are removed
/// by identity, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier
    #[serde(default)]
    pub id: ExpenseId,
    #[serde(default)]
    pub description: String,
    /// Amount in `currency`, never negative
    pub amount: f64,
    /// Currency the expense was paid in
    pub currency: CurrencyCode,
    /// Free-text tag such as "food" or "transport"
    pub category: String,
    /// Name of the paying traveler (not checked against the trip)
    pub paid_by: String,
    /// When the expense happened
    #[serde(with = "timestamp::serde_timestamp", default = "timestamp::now")]
    pub date: NaiveDateTime,
    /// Names the expense was shared with. Stored, not used by settlement.
    #[serde(default)]
    pub split_with: Vec<String>,
}

impl Expense {
    /// Creates a new expense dated now.
    ///
    /// # Validation
    /// - Amount must be finite and not negative
    /// - Category and payer cannot be empty
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        currency: CurrencyCode,
        category: impl Into<String>,
        paid_by: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let expense = Self {
            id: ExpenseId::new(),
            description: description.into().trim().to_string(),
            amount,
            currency,
            category: category.into().trim().to_string(),
            paid_by: paid_by.into().trim().to_string(),
            date: timestamp::now(),
            split_with: Vec::new(),
        };
        expense.validate()?;
        Ok(expense)
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = date;
        self
    }

    pub fn with_split(mut self, names: Vec<String>) -> Self {
        self.split_with = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.amount.is_finite() {
            return Err(DomainError::ValidationError(
                "Amount must be a finite number".into(),
            ));
        }
        if self.amount < 0.0 {
            return Err(DomainError::NegativeAmount);
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Category cannot be empty".into(),
            ));
        }
        if self.paid_by.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Payer cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Calendar day the expense falls on.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// Optional filters for listing expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| expense.category == c)
            && self.paid_by.as_deref().is_none_or(|p| expense.paid_by == p)
    }

    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e)).collect()
    }
}
