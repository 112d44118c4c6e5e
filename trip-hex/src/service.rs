//! Trip Application Service
//!
//! Orchestrates the domain engine, the rate cache and the repository port.
//! Contains NO infrastructure logic - pure business orchestration.
//!
//! Each trip being worked on has a session: its trip and expense list held
//! in memory, keyed by trip id. Sessions open on create or first access and
//! close on delete. Mutations write the whole session back to storage; a
//! failed write is reported as `saved: false` and leaves the session as is.

use dashmap::DashMap;
use exchange_rates::round_amount;

use trip_types::domain::timestamp;
use trip_types::report::{
    CategoryLine, ConvertedTotal, DailyLine, PersonLine, SummaryReport, category_lines,
    daily_lines, person_lines,
};
use trip_types::{
    AddExpenseRequest, AddTravelerRequest, AppError, Conversion, ConvertRequest, ConvertResponse,
    CreateTripRequest, DeleteExpenseResponse, DeleteTripResponse, Expense, ExpenseFilter,
    ExpenseId, ExpenseSummary, Ledger, Persisted, RateSource, SaveResponse, StatusResponse,
    Traveler, Trip, TripId, TripListing, TripRecord, TripRepository,
};

use crate::fx::CurrencyConverter;

/// In-memory working set of one trip.
#[derive(Debug, Clone)]
pub struct TripSession {
    pub trip: Trip,
    pub expenses: Vec<Expense>,
}

impl From<TripRecord> for TripSession {
    fn from(record: TripRecord) -> Self {
        Self {
            trip: record.trip,
            expenses: record.expenses,
        }
    }
}

impl From<TripSession> for TripRecord {
    fn from(session: TripSession) -> Self {
        Self {
            trip: session.trip,
            expenses: session.expenses,
        }
    }
}

/// Application service for trip operations.
///
/// Generic over the storage and rate-source adapters, injected at compile time.
pub struct TripService<R: TripRepository, S: RateSource> {
    repo: R,
    fx: CurrencyConverter<S>,
    sessions: DashMap<TripId, TripSession>,
}

impl<R: TripRepository, S: RateSource> TripService<R, S> {
    pub fn new(repo: R, fx: CurrencyConverter<S>) -> Self {
        Self {
            repo,
            fx,
            sessions: DashMap::new(),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn fx(&self) -> &CurrencyConverter<S> {
        &self.fx
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Copy of the session for `id`, opening it from storage if needed.
    async fn session(&self, id: &TripId) -> Result<TripSession, AppError> {
        if let Some(session) = self.sessions.get(id) {
            return Ok(session.clone());
        }

        let record = self
            .repo
            .load_trip(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip {id}")))?;

        // another request may have opened it meanwhile; keep theirs
        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| record.into())
            .clone();
        tracing::debug!(trip_id = %id, "Session opened from storage");
        Ok(session)
    }

    /// Applies `f` to the open session and returns its result together with
    /// a copy of the session afterwards.
    async fn mutate<T>(
        &self,
        id: &TripId,
        f: impl FnOnce(&mut TripSession) -> Result<T, AppError>,
    ) -> Result<(T, TripSession), AppError> {
        self.session(id).await?;
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Trip {id}")))?;
        let out = f(&mut session)?;
        Ok((out, session.clone()))
    }

    /// Writes a session to storage. Failures are logged and reported as `false`.
    async fn persist(&self, session: &TripSession) -> bool {
        match self.repo.save_trip(&session.trip, &session.expenses).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(trip_id = %session.trip.id, error = %e, "Could not save trip; changes kept in memory");
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Trips
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_trip(&self, req: CreateTripRequest) -> Result<Persisted<Trip>, AppError> {
        let trip = Trip::new(
            req.name,
            req.destination,
            req.start_date,
            req.end_date,
            req.currency,
        )?;
        let session = TripSession {
            trip: trip.clone(),
            expenses: Vec::new(),
        };
        self.sessions.insert(trip.id.clone(), session.clone());
        tracing::info!(trip_id = %trip.id, "Trip created");

        let saved = self.persist(&session).await;
        Ok(Persisted::new(trip, saved))
    }

    pub async fn get_trip(&self, id: &TripId) -> Result<Trip, AppError> {
        Ok(self.session(id).await?.trip)
    }

    /// Writes the session back to storage.
    #[tracing::instrument(skip(self))]
    pub async fn save_trip(&self, id: &TripId) -> Result<SaveResponse, AppError> {
        let session = self.session(id).await?;
        let saved = self.persist(&session).await;
        Ok(SaveResponse {
            trip_id: id.clone(),
            saved,
        })
    }

    /// Replaces the session with the stored copy.
    #[tracing::instrument(skip(self))]
    pub async fn load_trip(&self, id: &TripId) -> Result<TripRecord, AppError> {
        let record = self
            .repo
            .load_trip(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip {id}")))?;
        self.sessions.insert(id.clone(), record.clone().into());
        Ok(record)
    }

    pub async fn list_trips(&self) -> Result<Vec<TripListing>, AppError> {
        self.repo.list_trips().await.map_err(Into::into)
    }

    /// Closes the session and deletes the stored copy.
    #[tracing::instrument(skip(self))]
    pub async fn delete_trip(&self, id: &TripId) -> Result<DeleteTripResponse, AppError> {
        let deleted = self.repo.delete_trip(id).await?;
        let closed = self.sessions.remove(id).is_some();
        if !closed && !deleted {
            return Err(AppError::NotFound(format!("Trip {id}")));
        }
        tracing::info!(trip_id = %id, closed, deleted, "Trip deleted");
        Ok(DeleteTripResponse {
            trip_id: id.clone(),
            closed,
            deleted,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Travelers
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn add_traveler(
        &self,
        id: &TripId,
        req: AddTravelerRequest,
    ) -> Result<Persisted<Traveler>, AppError> {
        let traveler = Traveler::new(req.name, req.email)?;
        let (traveler, session) = self
            .mutate(id, |s| {
                s.trip.add_traveler(traveler.clone());
                Ok(traveler)
            })
            .await?;

        let saved = self.persist(&session).await;
        Ok(Persisted::new(traveler, saved))
    }

    pub async fn list_travelers(&self, id: &TripId) -> Result<Vec<Traveler>, AppError> {
        Ok(self.session(id).await?.trip.travelers)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_traveler(&self, id: &TripId, name: &str) -> Result<Persisted<Trip>, AppError> {
        let ((), session) = self
            .mutate(id, |s| {
                if s.trip.remove_traveler(name) {
                    Ok(())
                } else {
                    Err(AppError::NotFound(format!("Traveler {name}")))
                }
            })
            .await?;

        let saved = self.persist(&session).await;
        Ok(Persisted::new(session.trip, saved))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Expenses
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, req), fields(amount = req.amount, paid_by = %req.paid_by))]
    pub async fn add_expense(
        &self,
        id: &TripId,
        req: AddExpenseRequest,
    ) -> Result<Persisted<Expense>, AppError> {
        let (expense, session) = self
            .mutate(id, |s| {
                let currency = req.currency.unwrap_or(s.trip.currency);
                let expense = Expense::new(
                    req.description,
                    req.amount,
                    currency,
                    req.category,
                    req.paid_by,
                )?
                .with_date(req.date.unwrap_or_else(timestamp::now))
                .with_split(req.split_with);
                s.expenses.push(expense.clone());
                Ok(expense)
            })
            .await?;

        let saved = self.persist(&session).await;
        Ok(Persisted::new(expense, saved))
    }

    pub async fn list_expenses(
        &self,
        id: &TripId,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, AppError> {
        let session = self.session(id).await?;
        Ok(session
            .expenses
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_expense(
        &self,
        id: &TripId,
        expense_id: &ExpenseId,
    ) -> Result<DeleteExpenseResponse, AppError> {
        let ((), session) = self
            .mutate(id, |s| {
                let before = s.expenses.len();
                s.expenses.retain(|e| &e.id != expense_id);
                if s.expenses.len() == before {
                    return Err(AppError::NotFound(format!("Expense {expense_id}")));
                }
                Ok(())
            })
            .await?;

        let saved = self.persist(&session).await;
        Ok(DeleteExpenseResponse {
            expense_id: expense_id.clone(),
            saved,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────────

    /// Trip summary. With `convert`, also totals every expense in the trip
    /// currency.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, id: &TripId, convert: bool) -> Result<SummaryReport, AppError> {
        let session = self.session(id).await?;
        let summary = ExpenseSummary::from_expenses(&session.expenses);
        let mut report = SummaryReport::build(&session.trip, &summary);

        if convert {
            let target = session.trip.currency;
            let needs_rates = session.expenses.iter().any(|e| e.currency != target);
            let table = if needs_rates {
                Some(self.fx.snapshot().await)
            } else {
                None
            };

            let mut amount = 0.0;
            let mut approximated = false;
            for expense in &session.expenses {
                let conversion = match &table {
                    Some(table) => table.convert(expense.amount, expense.currency, target),
                    None => Conversion::exact(expense.amount),
                };
                amount += conversion.value;
                approximated |= conversion.approximated;
            }
            report.converted_total = Some(ConvertedTotal {
                amount: round_amount(amount),
                currency: target,
                approximated,
            });
        }
        Ok(report)
    }

    pub async fn categories(&self, id: &TripId) -> Result<Vec<CategoryLine>, AppError> {
        let session = self.session(id).await?;
        Ok(category_lines(&ExpenseSummary::from_expenses(
            &session.expenses,
        )))
    }

    pub async fn people(&self, id: &TripId) -> Result<Vec<PersonLine>, AppError> {
        let session = self.session(id).await?;
        Ok(person_lines(&ExpenseSummary::from_expenses(&session.expenses)))
    }

    pub async fn daily(&self, id: &TripId) -> Result<Vec<DailyLine>, AppError> {
        let session = self.session(id).await?;
        Ok(daily_lines(&session.expenses))
    }

    /// Equal-split settlement over the trip's travelers.
    #[tracing::instrument(skip(self))]
    pub async fn split(&self, id: &TripId) -> Result<Ledger, AppError> {
        let session = self.session(id).await?;
        let summary = ExpenseSummary::from_expenses(&session.expenses);
        let ledger = Ledger::from_summary(&summary, &session.trip.travelers)?;
        if ledger.split_with_ignored > 0 {
            tracing::warn!(
                trip_id = %id,
                ignored = ledger.split_with_ignored,
                "Expenses name split lists; settling as an equal split"
            );
        }
        Ok(ledger)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Conversion & Status
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn convert(&self, req: ConvertRequest) -> Result<ConvertResponse, AppError> {
        if !req.amount.is_finite() {
            return Err(AppError::BadRequest("Amount must be a finite number".into()));
        }
        let (from, to) = (req.from_currency, req.to_currency);
        let (converted, rate) = if from == to {
            (Conversion::exact(req.amount), Conversion::exact(1.0))
        } else {
            // one table for both so amount and rate agree
            let table = self.fx.snapshot().await;
            (table.convert(req.amount, from, to), table.rate(from, to))
        };
        Ok(ConvertResponse {
            converted_amount: converted.value,
            rate: rate.value,
            from_currency: req.from_currency,
            to_currency: req.to_currency,
            approximated: converted.approximated || rate.approximated,
        })
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            storage_backend: self.repo.backend().to_string(),
            open_sessions: self.open_sessions(),
            rates: self.fx.status(),
        }
    }
}
