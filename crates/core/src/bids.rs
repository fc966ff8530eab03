//! Raw, unparsed bid text as handed over by a bid source.

use crate::commodity::Commodity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The text of one commodity row exactly as it was read from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBid {
    /// Cash price cell, e.g. "$5.12" or "5.12/bu"
    pub price: String,
    /// Basis cell, if the page shows one
    pub basis: Option<String>,
    /// Futures change cell, if the page shows one
    pub futures_change: Option<String>,
    /// Delivery period text, e.g. "Oct 2026"
    pub delivery: Option<String>,
    /// Whole row text, retained for audit
    pub snapshot: String,
}

impl RawBid {
    /// Creates a bid with only a price cell.
    #[must_use]
    pub fn price_only(price: impl Into<String>) -> Self {
        let price = price.into();
        Self {
            snapshot: price.clone(),
            price,
            basis: None,
            futures_change: None,
            delivery: None,
        }
    }

    #[must_use]
    pub fn with_basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }
}

/// Everything one page load produced, keyed by commodity.
///
/// Commodities the page did not render are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBidSheet {
    /// When the page was read; becomes `observed_at` of every observation
    pub fetched_at: DateTime<Utc>,
    pub bids: BTreeMap<Commodity, RawBid>,
}

impl RawBidSheet {
    #[must_use]
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            bids: BTreeMap::new(),
        }
    }

    /// Adds a bid unless the commodity is already present. The first row wins.
    pub fn insert_first(&mut self, commodity: Commodity, bid: RawBid) -> bool {
        if self.bids.contains_key(&commodity) {
            return false;
        }
        self.bids.insert(commodity, bid);
        true
    }

    #[must_use]
    pub fn get(&self, commodity: Commodity) -> Option<&RawBid> {
        self.bids.get(&commodity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}
