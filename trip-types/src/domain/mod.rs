//! Domain models and the settlement engine.

pub mod expense;
pub mod ids;
pub mod settlement;
pub mod summary;
pub mod timestamp;
pub mod traveler;
pub mod trip;

pub use expense::{Expense, ExpenseFilter};
pub use ids::{ExpenseId, TravelerId, TripId};
pub use settlement::{BalanceStatus, Ledger, LedgerEntry, Transfer};
pub use summary::{Bucket, ExpenseSummary, Tally, average, percentage};
pub use traveler::Traveler;
pub use trip::{Trip, TripListing, TripRecord};
