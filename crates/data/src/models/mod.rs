//! Data models for the cash bid store.
//!
//! Prices use `rust_decimal::Decimal`. Row structs derive `sqlx::FromRow`
//! and convert into the typed models.

pub mod observation;
pub mod scrape_run;

pub use observation::{PriceObservation, PriceObservationRow, StoredId};
pub use scrape_run::{RunStatus, ScrapeRun, ScrapeRunRow};
