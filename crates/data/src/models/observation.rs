//! Price observation data model.
//!
//! One confirmed cash bid reading. Observations are immutable once stored;
//! the table only ever grows.

use cashbid_core::Commodity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::StorageError;

/// Identifier assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoredId(pub i64);

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized cash bid for one commodity at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub commodity: Commodity,
    /// Cash price in dollars per unit, always positive
    pub price: Decimal,
    /// Signed basis against the reference futures contract
    pub basis: Option<Decimal>,
    /// Signed change of the reference futures contract
    pub futures_change: Option<Decimal>,
    /// Delivery period as shown on the page
    pub delivery: Option<String>,
    /// Extraction time (UTC)
    pub observed_at: DateTime<Utc>,
    /// Raw row text kept for audit
    pub source_snapshot: String,
    /// Run that produced this observation
    pub run_id: Option<Uuid>,
}

impl PriceObservation {
    /// Creates an observation with only the required fields set.
    #[must_use]
    pub fn new(
        commodity: Commodity,
        price: Decimal,
        observed_at: DateTime<Utc>,
        source_snapshot: impl Into<String>,
    ) -> Self {
        Self {
            commodity,
            price,
            basis: None,
            futures_change: None,
            delivery: None,
            observed_at,
            source_snapshot: source_snapshot.into(),
            run_id: None,
        }
    }

    #[must_use]
    pub fn with_basis(mut self, basis: Decimal) -> Self {
        self.basis = Some(basis);
        self
    }

    #[must_use]
    pub fn with_run(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// True when price, basis and futures change all match `other`.
    ///
    /// Decimal equality ignores scale, so "5.1" and "5.10" are the same value.
    #[must_use]
    pub fn same_values(&self, other: &Self) -> bool {
        self.commodity == other.commodity
            && self.price == other.price
            && self.basis == other.basis
            && self.futures_change == other.futures_change
    }

    /// The natural key enforced unique by every store.
    #[must_use]
    pub fn key(&self) -> (Commodity, DateTime<Utc>) {
        (self.commodity, self.observed_at)
    }
}

/// Row shape of `price_observations`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceObservationRow {
    pub id: i64,
    pub commodity: String,
    pub price: Decimal,
    pub basis: Option<Decimal>,
    pub futures_change: Option<Decimal>,
    pub delivery: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub source_snapshot: String,
    pub run_id: Option<Uuid>,
}

impl TryFrom<PriceObservationRow> for PriceObservation {
    type Error = StorageError;

    fn try_from(row: PriceObservationRow) -> Result<Self, Self::Error> {
        let commodity = Commodity::parse(&row.commodity).ok_or_else(|| {
            StorageError::CorruptRow(format!(
                "observation {} has unknown commodity {:?}",
                row.id, row.commodity
            ))
        })?;

        Ok(Self {
            commodity,
            price: row.price,
            basis: row.basis,
            futures_change: row.futures_change,
            delivery: row.delivery,
            observed_at: row.observed_at,
            source_snapshot: row.source_snapshot,
            run_id: row.run_id,
        })
    }
}
