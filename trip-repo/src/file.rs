//! JSON file repository adapter.
//!
//! One `<trip id>.json` document per trip, shaped `{"trip": .., "expenses": [..]}`.
//! Used when no database is configured.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use trip_types::{Expense, RepoError, Trip, TripId, TripListing, TripRecord, TripRepository};

pub struct JsonFileRepo {
    dir: PathBuf,
}

impl JsonFileRepo {
    /// Opens (and creates if needed) the storage directory.
    pub async fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for a trip id. Ids that could escape the directory
    /// have no path.
    fn path_for(&self, id: &TripId) -> Option<PathBuf> {
        let id = id.as_str();
        if id.starts_with('.') || id.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(self.dir.join(format!("{id}.json")))
    }

    async fn read_record(path: &Path) -> Result<Option<TripRecord>, RepoError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }
}

fn storage_err(e: std::io::Error) -> RepoError {
    RepoError::Storage(e.to_string())
}

#[async_trait]
impl TripRepository for JsonFileRepo {
    #[tracing::instrument(skip(self, trip, expenses), fields(trip_id = %trip.id))]
    async fn save_trip(&self, trip: &Trip, expenses: &[Expense]) -> Result<(), RepoError> {
        let path = self.path_for(&trip.id).ok_or_else(|| {
            RepoError::Storage(format!("Trip id {:?} is not a valid file name", trip.id.as_str()))
        })?;

        let record = serde_json::json!({ "trip": trip, "expenses": expenses });
        let body = serde_json::to_vec_pretty(&record)?;

        // write-then-rename so readers never see a half-written document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(storage_err)?;
        Ok(())
    }

    async fn load_trip(&self, id: &TripId) -> Result<Option<TripRecord>, RepoError> {
        match self.path_for(id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn list_trips(&self) -> Result<Vec<TripListing>, RepoError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(storage_err)?;
        let mut listings = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(storage_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(record)) => listings.push(TripListing {
                    expense_count: record.expenses.len(),
                    trip: record.trip,
                }),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable trip file"),
            }
        }

        listings.sort_by(|a, b| b.trip.created_at.cmp(&a.trip.created_at));
        Ok(listings)
    }

    async fn delete_trip(&self, id: &TripId) -> Result<bool, RepoError> {
        let Some(path) = self.path_for(id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_types::{CurrencyCode, Traveler};

    fn trip(name: &str) -> Trip {
        let mut trip = Trip::new(
            name,
            "Somewhere",
            "2024-01-01".parse().unwrap(),
            "2024-01-05".parse().unwrap(),
            CurrencyCode::EUR,
        )
        .unwrap();
        trip.add_traveler(Traveler::new("Ana", "ana@example.com").unwrap());
        trip
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepo::new(dir.path()).await.unwrap();

        let trip = trip("Porto");
        let expense = Expense::new("Wine", 18.0, CurrencyCode::EUR, "food", "Ana").unwrap();
        repo.save_trip(&trip, std::slice::from_ref(&expense)).await.unwrap();

        let record = repo.load_trip(&trip.id).await.unwrap().unwrap();
        assert_eq!(record.trip, trip);
        assert_eq!(record.expenses, vec![expense]);
        assert!(dir.path().join(format!("{}.json", trip.id)).exists());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepo::new(dir.path()).await.unwrap();
        assert!(repo.load_trip(&TripId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_path_like_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepo::new(dir.path()).await.unwrap();

        let sneaky: TripId = "../etc/passwd".parse().unwrap();
        assert!(repo.load_trip(&sneaky).await.unwrap().is_none());
        assert!(!repo.delete_trip(&sneaky).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepo::new(dir.path()).await.unwrap();

        let mut older = trip("Older");
        older.created_at = trip_types::domain::timestamp::parse_timestamp("2023-01-01").unwrap();
        let newer = trip("Newer");
        repo.save_trip(&older, &[]).await.unwrap();
        repo.save_trip(&newer, &[]).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignore me").await.unwrap();

        let listings = repo.list_trips().await.unwrap();
        let names: Vec<&str> = listings.iter().map(|l| l.trip.name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
        assert_eq!(listings[0].expense_count, 0);

        assert!(repo.delete_trip(&older.id).await.unwrap());
        assert!(!repo.delete_trip(&older.id).await.unwrap());
        assert_eq!(repo.list_trips().await.unwrap().len(), 1);
    }
}
