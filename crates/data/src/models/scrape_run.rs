//! Scrape run data model.
//!
//! Operational metadata: one summary row per pipeline invocation, written once
//! after the run is finalized.

use cashbid_core::Commodity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::StorageError;

/// Final outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every tracked commodity was found.
    Success,
    /// Some, but not all, tracked commodities were found.
    Partial,
    /// Nothing was found, or the source or store failed.
    Failed,
}

impl RunStatus {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(Self::Success),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Process exit code reported to the scheduler.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::Partial => 2,
        }
    }
}

/// Finalized summary of one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    /// Tracked commodities that normalized successfully
    pub commodities_found: u32,
    /// Tracked commodities not extracted or rejected this run
    pub commodities_missing: BTreeSet<Commodity>,
    /// New rows written to the observation table
    pub rows_appended: u32,
    pub error_detail: Option<String>,
}

impl ScrapeRun {
    /// One-line human summary, e.g. for the per-run log line.
    #[must_use]
    pub fn summary(&self) -> String {
        let missing = if self.commodities_missing.is_empty() {
            "none".to_string()
        } else {
            self.commodities_missing
                .iter()
                .map(Commodity::as_str)
                .collect::<Vec<_>>()
                .join(",")
        };

        let mut line = format!(
            "run {} {}: found={} appended={} missing={} in {}ms",
            self.run_id,
            self.status.as_str(),
            self.commodities_found,
            self.rows_appended,
            missing,
            (self.finished_at - self.started_at).num_milliseconds()
        );
        if let Some(detail) = &self.error_detail {
            line.push_str(&format!(" error=\"{detail}\""));
        }
        line
    }
}

/// Row shape of `scrape_runs`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: String,
    pub commodities_found: i32,
    pub commodities_missing: Vec<String>,
    pub rows_appended: i32,
    pub error_detail: Option<String>,
}

impl TryFrom<ScrapeRunRow> for ScrapeRun {
    type Error = StorageError;

    fn try_from(row: ScrapeRunRow) -> Result<Self, Self::Error> {
        let status = RunStatus::parse(&row.status).ok_or_else(|| {
            StorageError::CorruptRow(format!("run {} has status {:?}", row.run_id, row.status))
        })?;

        // Commodities retired from the enum are dropped rather than failing the read.
        let commodities_missing = row
            .commodities_missing
            .iter()
            .filter_map(|s| Commodity::parse(s))
            .collect();

        Ok(Self {
            run_id: row.run_id,
            started_at: row.started_at,
            finished_at: row.finished_at,
            status,
            commodities_found: u32::try_from(row.commodities_found).unwrap_or(0),
            commodities_missing,
            rows_appended: u32::try_from(row.rows_appended).unwrap_or(0),
            error_detail: row.error_detail,
        })
    }
}
