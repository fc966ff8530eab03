//! Raw bid text to typed observations.
//!
//! Pure: no I/O, no logging. Every rejection is a `NormalizationError` the
//! caller records against the commodity.

use cashbid_core::{Commodity, NormalizationError, PipelineConfig, PriceBand, RawBid};
use cashbid_data::PriceObservation;
use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // sign or opening paren, optional "$", then 1,234.56 | 1234.56 | .56
        Regex::new(
            r"(?P<pre>[+\-\x{2212}(])?\s*\$?\s*(?P<post>[+\-\x{2212}])?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)",
        )
        .expect("number pattern is valid")
    })
}

/// Parses the first numeric token in `text`, ignoring currency symbols,
/// thousands separators and trailing units.
///
/// "$5.12" -> 5.12, "-0.45" -> -0.45, "(0.30)" -> -0.30, "N/A" -> None.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let caps = number_pattern().captures(text)?;
    let digits = caps.name("num")?.as_str().replace(',', "");
    let value = Decimal::from_str(&digits).ok()?;

    let negative = [caps.name("pre"), caps.name("post")]
        .into_iter()
        .flatten()
        .any(|m| matches!(m.as_str(), "-" | "\u{2212}" | "("));

    Some(if negative { -value } else { value })
}

/// Turns raw bid rows into observations and range-checks the price.
#[derive(Debug, Clone)]
pub struct Normalizer {
    bands: BTreeMap<Commodity, PriceBand>,
    ceiling_multiplier: Decimal,
}

impl Normalizer {
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        let bands = Commodity::ALL
            .into_iter()
            .map(|c| (c, config.band_for(c)))
            .collect();
        Self {
            bands,
            ceiling_multiplier: config.ceiling_multiplier,
        }
    }

    /// Normalizes against the configured band only.
    ///
    /// # Errors
    /// `MalformedPrice` when the price cell has no number, `OutOfRange` when the
    /// number falls outside the band.
    pub fn normalize(
        &self,
        commodity: Commodity,
        raw: &RawBid,
        observed_at: DateTime<Utc>,
    ) -> Result<PriceObservation, NormalizationError> {
        self.normalize_with_history(commodity, raw, observed_at, None)
    }

    /// Normalizes against the configured band and, when given, a ceiling of
    /// `ceiling_multiplier` x the trailing median of stored prices.
    ///
    /// # Errors
    /// Same as [`Normalizer::normalize`]; a price at or above the ceiling is `OutOfRange`.
    pub fn normalize_with_history(
        &self,
        commodity: Commodity,
        raw: &RawBid,
        observed_at: DateTime<Utc>,
        trailing_median: Option<Decimal>,
    ) -> Result<PriceObservation, NormalizationError> {
        let price = parse_decimal(&raw.price).ok_or_else(|| NormalizationError::MalformedPrice {
            commodity,
            raw: raw.price.clone(),
        })?;

        let band = self.band(commodity);
        let ceiling = trailing_median
            .filter(|m| *m > Decimal::ZERO)
            .map(|m| m * self.ceiling_multiplier);

        let out_of_band = price <= band.min || price <= Decimal::ZERO || price > band.max;
        let above_ceiling = ceiling.is_some_and(|c| price >= c);

        if out_of_band || above_ceiling {
            let max = match ceiling {
                Some(c) if c < band.max => c,
                _ => band.max,
            };
            return Err(NormalizationError::OutOfRange {
                commodity,
                price,
                min: band.min.max(Decimal::ZERO),
                max,
            });
        }

        Ok(PriceObservation {
            commodity,
            price,
            basis: raw.basis.as_deref().and_then(parse_decimal),
            futures_change: raw.futures_change.as_deref().and_then(parse_decimal),
            delivery: raw
                .delivery
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            observed_at,
            source_snapshot: raw.snapshot.clone(),
            run_id: None,
        })
    }

    fn band(&self, commodity: Commodity) -> PriceBand {
        self.bands
            .get(&commodity)
            .copied()
            .unwrap_or_else(|| PipelineConfig::default().band_for(commodity))
    }
}
