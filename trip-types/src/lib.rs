//! # Trip Types
//!
//! Domain types, the aggregation and settlement engine, and port traits for
//! the trip ledger. Like the rest of the core, this crate does no IO: it
//! takes expenses and travelers in and hands totals and balances back.
//!
//! ## Architecture
//!
//! - `domain/` - Trips, travelers, expenses, aggregation and settlement
//! - `report/` - Structured report rows and text grid rendering
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, repository and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod report;

// Re-export commonly used types
pub use domain::{
    BalanceStatus, Bucket, Expense, ExpenseFilter, ExpenseId, ExpenseSummary, Ledger,
    LedgerEntry, Tally, Transfer, Traveler, TravelerId, Trip, TripId, TripListing, TripRecord,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use exchange_rates::{Conversion, CurrencyCode, RateTable};
pub use ports::{ExchangeError, RateSource, TripRepository};
