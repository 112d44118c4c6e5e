//! # Trip Hex
//!
//! Application service layer and HTTP adapter for the trip ledger.
//!
//! ## Architecture
//!
//! - `service/` - Application service (sessions, reports, settlement)
//! - `fx/` - Currency converter with the shared rate cache
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: TripRepository` and `S: RateSource`,
//! allowing different adapters to be injected.

pub mod fx;
pub mod inbound;
pub mod service;


pub use fx::CurrencyConverter;
pub use service::{TripService, TripSession};
