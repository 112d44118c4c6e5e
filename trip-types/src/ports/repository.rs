//! Repository port trait.
//!
//! Trips are stored whole: the trip with its travelers and the full expense
//! list travel together. Adapters (SQLite, JSON files) implement this trait.

use crate::domain::{Expense, Trip, TripId, TripListing, TripRecord};
use crate::error::RepoError;

/// The persistence port for trips.
///
/// `save_trip` replaces whatever was stored under the trip's id.
#[async_trait::async_trait]
pub trait TripRepository: Send + Sync + 'static {
    /// Inserts or replaces a trip and its expenses.
    async fn save_trip(&self, trip: &Trip, expenses: &[Expense]) -> Result<(), RepoError>;

    async fn load_trip(&self, id: &TripId) -> Result<Option<TripRecord>, RepoError>;

    /// Stored trips, newest first, with their expense counts.
    async fn list_trips(&self) -> Result<Vec<TripListing>, RepoError>;

    /// Deletes a stored trip. Returns whether anything was deleted.
    async fn delete_trip(&self, id: &TripId) -> Result<bool, RepoError>;

    /// Backend name for the status endpoint.
    fn backend(&self) -> &'static str;
}
