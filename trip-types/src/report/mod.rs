//! Report rows and their text rendering.
//!
//! Builders turn an [`ExpenseSummary`] into serializable rows; renderers turn
//! rows into grid tables. Nothing here computes beyond grouping by day.

pub mod table;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};

use crate::domain::{BalanceStatus, Expense, ExpenseSummary, Ledger, Trip, TripId, percentage};
pub use table::{Align, TextTable};

pub const NO_EXPENSES: &str = "No expenses to report.";
pub const NO_TRAVELERS: &str = "No travelers to split expenses with.";

// ─────────────────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────────────────

/// Sum of all expenses converted into one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedTotal {
    pub amount: f64,
    pub currency: CurrencyCode,
    /// At least one expense was converted without a usable rate
    pub approximated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub trip_id: TripId,
    pub trip_name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: usize,
    pub total_expenses: f64,
    pub num_expenses: usize,
    pub average_expense: f64,
    pub currency: CurrencyCode,
    pub currency_breakdown: BTreeMap<CurrencyCode, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_total: Option<ConvertedTotal>,
}

impl SummaryReport {
    pub fn build(trip: &Trip, summary: &ExpenseSummary) -> Self {
        Self {
            trip_id: trip.id.clone(),
            trip_name: trip.name.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            travelers: trip.travelers.len(),
            total_expenses: summary.total,
            num_expenses: summary.count,
            average_expense: summary.average(),
            currency: trip.currency,
            currency_breakdown: summary.currencies.clone(),
            converted_total: None,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Trip: {}\nDestination: {}\nDates: {} to {}\nTravelers: {}\n\n\
             Total Expenses: {:.2} {}\nNumber of Expenses: {}\nAverage per Expense: {:.2} {}",
            self.trip_name,
            self.destination,
            self.start_date,
            self.end_date,
            self.travelers,
            self.total_expenses,
            self.currency,
            self.num_expenses,
            self.average_expense,
            self.currency,
        );

        if self.currency_breakdown.len() > 1 {
            out.push_str("\n\nBy currency:");
            for (code, amount) in &self.currency_breakdown {
                out.push_str(&format!("\n  {}: {}", code, code.format_amount(*amount)));
            }
        }
        if let Some(converted) = &self.converted_total {
            out.push_str(&format!(
                "\n\nConverted total: {}{}",
                converted.currency.format_amount(converted.amount),
                if converted.approximated {
                    " (approximate)"
                } else {
                    ""
                }
            ));
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Breakdown rows
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLine {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub currency_breakdown: BTreeMap<CurrencyCode, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonLine {
    pub person: String,
    pub amount: f64,
    pub num_expenses: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLine {
    pub date: NaiveDate,
    pub num_expenses: usize,
    pub total: f64,
}

/// Category rows, largest amount first.
pub fn category_lines(summary: &ExpenseSummary) -> Vec<CategoryLine> {
    summary
        .categories
        .ranked()
        .into_iter()
        .map(|(category, bucket)| CategoryLine {
            category: category.clone(),
            amount: bucket.amount,
            percentage: percentage(bucket.amount, summary.total),
            currency_breakdown: summary
                .category_currencies
                .get(category)
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

/// Payer rows, largest amount first.
pub fn person_lines(summary: &ExpenseSummary) -> Vec<PersonLine> {
    summary
        .people
        .ranked()
        .into_iter()
        .map(|(person, bucket)| PersonLine {
            person: person.clone(),
            amount: bucket.amount,
            num_expenses: bucket.count,
            percentage: percentage(bucket.amount, summary.total),
        })
        .collect()
}

/// Expenses grouped by calendar day, earliest first.
pub fn daily_lines<'a, I>(expenses: I) -> Vec<DailyLine>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for expense in expenses {
        let day = days.entry(expense.day()).or_default();
        day.0 += 1;
        day.1 += expense.amount;
    }
    days.into_iter()
        .map(|(date, (num_expenses, total))| DailyLine {
            date,
            num_expenses,
            total,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Text rendering
// ─────────────────────────────────────────────────────────────────────────────

pub fn render_categories(lines: &[CategoryLine]) -> String {
    if lines.is_empty() {
        return NO_EXPENSES.to_string();
    }

    let mut table = TextTable::new(["Category", "Amount", "Percentage"]).right_align(&[1]);
    for line in lines {
        table.push_row([
            capitalize(&line.category),
            format!("{:.2}", line.amount),
            format!("{:.1}%", line.percentage),
        ]);
    }
    let total: f64 = lines.iter().map(|l| l.amount).sum();
    table.push_row(["TOTAL".to_string(), format!("{total:.2}"), "100%".to_string()]);
    table.render()
}

pub fn render_people(lines: &[PersonLine]) -> String {
    if lines.is_empty() {
        return NO_EXPENSES.to_string();
    }

    let mut table =
        TextTable::new(["Person", "Total Paid", "# Expenses", "Percentage"]).right_align(&[1, 2]);
    for line in lines {
        table.push_row([
            line.person.clone(),
            format!("{:.2}", line.amount),
            line.num_expenses.to_string(),
            format!("{:.1}%", line.percentage),
        ]);
    }
    table.render()
}

pub fn render_daily(lines: &[DailyLine]) -> String {
    if lines.is_empty() {
        return NO_EXPENSES.to_string();
    }

    let mut table = TextTable::new(["Date", "# Expenses", "Total"]).right_align(&[1, 2]);
    for line in lines {
        table.push_row([
            line.date.to_string(),
            line.num_expenses.to_string(),
            format!("{:.2}", line.total),
        ]);
    }
    table.render()
}

/// A ledger always has at least one traveler; a trip without travelers never
/// produces one.
pub fn render_ledger(ledger: &Ledger) -> String {
    let mut table = TextTable::new(["Person", "Paid", "Fair Share", "Balance"]).right_align(&[1, 2]);
    for entry in &ledger.balances {
        let status = match entry.status {
            BalanceStatus::Owed => format!("Owed {:.2}", entry.balance),
            BalanceStatus::Owes => format!("Owes {:.2}", entry.balance.abs()),
            BalanceStatus::Settled => "Settled".to_string(),
        };
        table.push_row([
            entry.person.clone(),
            format!("{:.2}", entry.paid),
            format!("{:.2}", entry.fair_share),
            status,
        ]);
    }
    let mut out = table.render();

    if !ledger.transfers.is_empty() {
        let mut transfers = TextTable::new(["From", "To", "Amount"]).right_align(&[2]);
        for t in &ledger.transfers {
            transfers.push_row([t.from.clone(), t.to.clone(), format!("{:.2}", t.amount)]);
        }
        out.push_str("\n\nSuggested transfers:\n");
        out.push_str(&transfers.render());
    }
    if ledger.split_with_ignored > 0 {
        out.push_str(&format!(
            "\n\nNote: {} expense(s) name a split list; all expenses are split equally.",
            ledger.split_with_ignored
        ));
    }
    out
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
