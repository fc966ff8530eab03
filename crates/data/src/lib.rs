//! Durable storage for the cash bid pipeline.
//!
//! This crate provides:
//! - Data models for price observations and scrape runs
//! - Store traits with append-only semantics
//! - PostgreSQL repositories and schema bootstrap
//! - An in-memory store with the same contract
//! - CSV export for read-only consumers

pub mod csv_export;
pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

pub use csv_export::CsvExport;
pub use database::DatabaseClient;
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use models::{PriceObservation, RunStatus, ScrapeRun, StoredId};
pub use repositories::{PriceObservationRepository, Repositories, ScrapeRunRepository};
pub use store::{median, AppendOutcome, HistoryQuery, PriceStore, RunLog};
