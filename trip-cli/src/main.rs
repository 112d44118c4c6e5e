//! Trip CLI
//!
//! Command-line interface for the trip ledger API.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use trip_client::{ClientError, TripClient};
use trip_types::domain::timestamp::{format_timestamp, parse_timestamp};
use trip_types::report::{self, TextTable};
use trip_types::{
    AddExpenseRequest, AppError, CreateTripRequest, CurrencyCode, Expense, ExpenseFilter, ExpenseId,
    Traveler, TripId, TripListing,
};

#[derive(Parser)]
#[command(name = "trip")]
#[command(author, version, about = "Trip ledger API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the trip ledger API
    #[arg(long, env = "TRIP_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Trip operations
    Trip {
        #[command(subcommand)]
        action: TripCommands,
    },
    /// Traveler operations
    Traveler {
        #[command(subcommand)]
        action: TravelerCommands,
    },
    /// Expense operations
    Expense {
        #[command(subcommand)]
        action: ExpenseCommands,
    },
    /// Expense reports and settlement
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
    /// Convert an amount between currencies
    Convert {
        amount: f64,
        /// Source currency (e.g. USD)
        from: CurrencyCode,
        /// Target currency (e.g. EUR)
        to: CurrencyCode,
    },
    /// Show storage and exchange-rate status
    Status,
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum TripCommands {
    /// Create a new trip
    Create {
        /// Trip name
        name: String,
        #[arg(long, default_value = "")]
        destination: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "USD")]
        currency: CurrencyCode,
    },
    /// Get trip details
    Get { id: TripId },
    /// List saved trips
    List,
    /// Write the trip to storage
    Save { id: TripId },
    /// Reload the trip from storage, discarding unsaved changes
    Load { id: TripId },
    /// Delete a trip
    Delete { id: TripId },
}

#[derive(Subcommand)]
enum TravelerCommands {
    /// Add a traveler to a trip
    Add {
        trip: TripId,
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// List a trip's travelers
    List { trip: TripId },
    /// Remove every traveler with this name
    Remove { trip: TripId, name: String },
}

#[derive(Subcommand)]
enum ExpenseCommands {
    /// Record an expense
    Add {
        trip: TripId,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        /// Name of the traveler who paid
        #[arg(long)]
        paid_by: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to the trip currency
        #[arg(long)]
        currency: Option<CurrencyCode>,
        /// When it happened (YYYY-MM-DD [HH:MM:SS]), defaults to now
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDateTime>,
        /// Names the expense was shared with (comma-separated)
        #[arg(long, value_delimiter = ',')]
        split_with: Vec<String>,
    },
    /// List expenses, optionally filtered
    List {
        trip: TripId,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        paid_by: Option<String>,
    },
    /// Delete an expense
    Delete { trip: TripId, expense: ExpenseId },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Totals, averages and the currency breakdown
    Summary {
        trip: TripId,
        /// Also total everything in the trip currency
        #[arg(long)]
        convert: bool,
    },
    /// Spending per category
    Categories { trip: TripId },
    /// Spending per payer
    People { trip: TripId },
    /// Spending per day
    Daily { trip: TripId },
    /// Equal-split balances and suggested transfers
    Split { trip: TripId },
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| e.to_string())
}

/// Prints `value` as pretty JSON or as the text produced by `table`.
fn emit<T: Serialize>(format: Format, value: &T, table: impl FnOnce(&T) -> String) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Table => println!("{}", table(value)),
    }
    Ok(())
}

fn saved_note(saved: bool) -> &'static str {
    if saved { "" } else { " (not saved: storage unavailable)" }
}

/// The server's 400 for a split over a trip without travelers.
fn is_no_travelers(err: &ClientError) -> bool {
    matches!(err, ClientError::Api { status: 400, message }
        if *message == AppError::NoParticipants.to_string())
}

fn trips_table(trips: &[TripListing]) -> String {
    if trips.is_empty() {
        return "No saved trips.".to_string();
    }
    let mut table =
        TextTable::new(["ID", "Name", "Destination", "Dates", "Expenses"]).right_align(&[4]);
    for listing in trips {
        let trip = &listing.trip;
        table.push_row([
            trip.id.to_string(),
            trip.name.clone(),
            trip.destination.clone(),
            format!("{} to {}", trip.start_date, trip.end_date),
            listing.expense_count.to_string(),
        ]);
    }
    table.render()
}

fn travelers_table(travelers: &[Traveler]) -> String {
    if travelers.is_empty() {
        return report::NO_TRAVELERS.to_string();
    }
    let mut table = TextTable::new(["Name", "Email"]);
    for t in travelers {
        table.push_row([t.name.clone(), t.email.clone()]);
    }
    table.render()
}

fn expenses_table(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return report::NO_EXPENSES.to_string();
    }
    let mut table = TextTable::new([
        "ID",
        "Date",
        "Description",
        "Category",
        "Paid By",
        "Amount",
    ])
    .right_align(&[5]);
    for e in expenses {
        table.push_row([
            e.id.to_string(),
            format_timestamp(&e.date),
            e.description.clone(),
            e.category.clone(),
            e.paid_by.clone(),
            e.currency.format_amount(e.amount),
        ]);
    }
    table.render()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = TripClient::new(&cli.api_url);
    let format = cli.format;

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Status => {
            let status = client.status().await?;
            emit(format, &status, |s| {
                let refreshed = s
                    .rates
                    .refreshed_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "never".into());
                format!(
                    "Storage: {}\nOpen trips: {}\nRates: {} ({} base, {} loaded, refreshed {}{})",
                    s.storage_backend,
                    s.open_sessions,
                    s.rates.source,
                    s.rates.base,
                    s.rates.rates_loaded,
                    refreshed,
                    if s.rates.stale { ", stale" } else { "" }
                )
            })?;
        }

        Commands::Trip { action } => match action {
            TripCommands::Create {
                name,
                destination,
                start,
                end,
                currency,
            } => {
                let req = CreateTripRequest {
                    name,
                    destination,
                    start_date: start,
                    end_date: end,
                    currency,
                };
                let created = client.create_trip(&req).await?;
                emit(format, &created, |c| {
                    format!("✓ Trip created: {}{}", c.data.id, saved_note(c.saved))
                })?;
            }
            TripCommands::Get { id } => {
                let trip = client.get_trip(&id).await?;
                emit(format, &trip, |t| {
                    format!(
                        "{} ({})\nDestination: {}\nDates: {} to {}\nCurrency: {}\n{}",
                        t.name,
                        t.id,
                        t.destination,
                        t.start_date,
                        t.end_date,
                        t.currency,
                        travelers_table(&t.travelers)
                    )
                })?;
            }
            TripCommands::List => {
                let trips = client.list_trips().await?;
                emit(format, &trips, |t| trips_table(t))?;
            }
            TripCommands::Save { id } => {
                let saved = client.save_trip(&id).await?;
                emit(format, &saved, |s| {
                    if s.saved {
                        format!("✓ Trip {} saved", s.trip_id)
                    } else {
                        format!("✗ Trip {} could not be saved", s.trip_id)
                    }
                })?;
            }
            TripCommands::Load { id } => {
                let record = client.load_trip(&id).await?;
                emit(format, &record, |r| {
                    format!(
                        "✓ Loaded {} with {} expense(s)",
                        r.trip.name,
                        r.expenses.len()
                    )
                })?;
            }
            TripCommands::Delete { id } => {
                let deleted = client.delete_trip(&id).await?;
                emit(format, &deleted, |d| format!("✓ Trip {} deleted", d.trip_id))?;
            }
        },

        Commands::Traveler { action } => match action {
            TravelerCommands::Add { trip, name, email } => {
                let added = client.add_traveler(&trip, &name, email.as_deref()).await?;
                emit(format, &added, |a| {
                    format!("✓ Traveler {} added{}", a.data.name, saved_note(a.saved))
                })?;
            }
            TravelerCommands::List { trip } => {
                let travelers = client.list_travelers(&trip).await?;
                emit(format, &travelers, |t| travelers_table(t))?;
            }
            TravelerCommands::Remove { trip, name } => {
                let updated = client.remove_traveler(&trip, &name).await?;
                emit(format, &updated, |u| {
                    format!("✓ Traveler {} removed{}", name, saved_note(u.saved))
                })?;
            }
        },

        Commands::Expense { action } => match action {
            ExpenseCommands::Add {
                trip,
                amount,
                category,
                paid_by,
                description,
                currency,
                date,
                split_with,
            } => {
                let req = AddExpenseRequest {
                    description,
                    amount,
                    currency,
                    category,
                    paid_by,
                    date,
                    split_with,
                };
                let added = client.add_expense(&trip, &req).await?;
                emit(format, &added, |a| {
                    format!(
                        "✓ Expense {} recorded: {}{}",
                        a.data.id,
                        a.data.currency.format_amount(a.data.amount),
                        saved_note(a.saved)
                    )
                })?;
            }
            ExpenseCommands::List {
                trip,
                category,
                paid_by,
            } => {
                let filter = ExpenseFilter { category, paid_by };
                let expenses = client.list_expenses(&trip, &filter).await?;
                emit(format, &expenses, |e| expenses_table(e))?;
            }
            ExpenseCommands::Delete { trip, expense } => {
                let deleted = client.delete_expense(&trip, &expense).await?;
                emit(format, &deleted, |d| {
                    format!("✓ Expense {} deleted{}", d.expense_id, saved_note(d.saved))
                })?;
            }
        },

        Commands::Report { action } => match action {
            ReportCommands::Summary { trip, convert } => {
                let summary = client.summary(&trip, convert).await?;
                emit(format, &summary, |s| s.to_text())?;
            }
            ReportCommands::Categories { trip } => {
                let lines = client.categories(&trip).await?;
                emit(format, &lines, |l| report::render_categories(l))?;
            }
            ReportCommands::People { trip } => {
                let lines = client.people(&trip).await?;
                emit(format, &lines, |l| report::render_people(l))?;
            }
            ReportCommands::Daily { trip } => {
                let lines = client.daily(&trip).await?;
                emit(format, &lines, |l| report::render_daily(l))?;
            }
            ReportCommands::Split { trip } => match client.split(&trip).await {
                Err(err) if format == Format::Table && is_no_travelers(&err) => {
                    println!("{}", report::NO_TRAVELERS);
                }
                result => emit(format, &result?, report::render_ledger)?,
            },
        },

        Commands::Convert { amount, from, to } => {
            let converted = client.convert(amount, from, to).await?;
            emit(format, &converted, |c| {
                format!(
                    "{} = {} (rate {:.4}){}",
                    from.format_amount(amount),
                    to.format_amount(c.converted_amount),
                    c.rate,
                    if c.approximated { " (approximate)" } else { "" }
                )
            })?;
        }
    }

    Ok(())
}
