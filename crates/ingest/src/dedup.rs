//! Change detection between a candidate observation and the last stored one.
//!
//! The last known value always comes from the store (`PriceStore::latest`),
//! never from process memory, so decisions survive restarts. The only state
//! held here is the set of keys written during the current run.

use cashbid_core::{Commodity, RetentionPolicy};
use cashbid_data::PriceObservation;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Why a candidate is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistReason {
    /// No stored observation exists for the commodity.
    FirstSighting,
    /// Price, basis or futures change differs from the last stored value.
    Changed,
    /// Same values as last time; kept because the policy retains repeats.
    Reconfirmed,
}

/// Why a candidate is not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `(commodity, observed_at)` is already stored or was written this run.
    DuplicateTimestamp,
    /// Same values as last time under `CollapseUnchanged`.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Persist(PersistReason),
    Skip(SkipReason),
}

impl Decision {
    #[must_use]
    pub fn should_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}

/// Decides, per run, whether a candidate becomes a new row.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    policy: RetentionPolicy,
    recorded: HashSet<(Commodity, DateTime<Utc>)>,
}

impl ChangeDetector {
    #[must_use]
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            recorded: HashSet::new(),
        }
    }

    #[must_use]
    pub fn decide(
        &self,
        candidate: &PriceObservation,
        last_known: Option<&PriceObservation>,
    ) -> Decision {
        if self.recorded.contains(&candidate.key()) {
            return Decision::Skip(SkipReason::DuplicateTimestamp);
        }

        let Some(last) = last_known else {
            return Decision::Persist(PersistReason::FirstSighting);
        };

        if last.key() == candidate.key() {
            return Decision::Skip(SkipReason::DuplicateTimestamp);
        }

        if !candidate.same_values(last) {
            return Decision::Persist(PersistReason::Changed);
        }

        match self.policy {
            RetentionPolicy::RetainAll => Decision::Persist(PersistReason::Reconfirmed),
            RetentionPolicy::CollapseUnchanged => Decision::Skip(SkipReason::Unchanged),
        }
    }

    #[must_use]
    pub fn should_persist(
        &self,
        candidate: &PriceObservation,
        last_known: Option<&PriceObservation>,
    ) -> bool {
        self.decide(candidate, last_known).should_persist()
    }

    /// Remembers that `observation` is stored, so a retry in the same run is a no-op.
    pub fn mark_recorded(&mut self, observation: &PriceObservation) {
        self.recorded.insert(observation.key());
    }
}
