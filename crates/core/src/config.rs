use crate::commodity::Commodity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/cashbids".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// Elevator location whose bids are read; `None` reads every table.
    pub location: Option<String>,
    pub user_agent: String,
    /// Upper bound on the whole page load.
    pub timeout_secs: u64,
    /// Replay a saved HTML page instead of fetching `url`.
    pub snapshot_path: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.legacy-cooperative.com/grain#cash-bids".to_string(),
            location: Some("Rolla".to_string()),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout_secs: 30,
            snapshot_path: None,
        }
    }
}

/// Write-time policy for values equal to the last stored observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Record every successful extraction, unchanged or not.
    #[default]
    RetainAll,
    /// Skip a candidate whose values equal the last stored observation.
    CollapseUnchanged,
}

/// Accepted price band for one commodity: `min < price <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBand {
    #[must_use]
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Commodities every run expects to find.
    pub commodities: Vec<Commodity>,
    pub retention: RetentionPolicy,
    /// Attempts per append before the run is failed with a storage error.
    pub append_attempts: u32,
    /// A price at or above `ceiling_multiplier` x trailing median is rejected.
    pub ceiling_multiplier: Decimal,
    /// Number of most recent stored prices the trailing median covers.
    pub median_window: u32,
    pub bounds: BTreeMap<Commodity, PriceBand>,
}

impl PipelineConfig {
    /// Returns the configured band, or the built-in default for the commodity.
    #[must_use]
    pub fn band_for(&self, commodity: Commodity) -> PriceBand {
        self.bounds
            .get(&commodity)
            .copied()
            .unwrap_or_else(|| default_band(commodity))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commodities: Commodity::ALL.to_vec(),
            retention: RetentionPolicy::RetainAll,
            append_attempts: 3,
            ceiling_multiplier: Decimal::TEN,
            median_window: 20,
            bounds: Commodity::ALL
                .into_iter()
                .map(|c| (c, default_band(c)))
                .collect(),
        }
    }
}

/// Dollars per bushel (per hundredweight for canola).
fn default_band(commodity: Commodity) -> PriceBand {
    let max = match commodity {
        Commodity::Corn => 20,
        Commodity::Soybeans | Commodity::SpringWheat14Pro | Commodity::WinterWheat12Pro => 40,
        Commodity::Canola => 100,
    };
    PriceBand::new(Decimal::ZERO, Decimal::from(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_track_all_commodities() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.commodities.len(), 5);
        assert_eq!(config.pipeline.retention, RetentionPolicy::RetainAll);
        assert_eq!(config.pipeline.ceiling_multiplier, dec!(10));
        assert_eq!(config.source.timeout_secs, 30);
    }

    #[test]
    fn test_band_for_falls_back_to_default() {
        let pipeline = PipelineConfig {
            bounds: BTreeMap::new(),
            ..PipelineConfig::default()
        };
        let band = pipeline.band_for(Commodity::Corn);
        assert_eq!(band.min, Decimal::ZERO);
        assert_eq!(band.max, dec!(20));
    }
}
