use anyhow::Result;
use csv::Writer;
use std::io::Write;

use crate::models::PriceObservation;

pub struct CsvExport;

impl CsvExport {
    /// Writes observations as CSV, one row each, in the order given.
    ///
    /// Format: observed_at,commodity,price,basis,futures_change,delivery
    ///
    /// # Errors
    /// Returns error if writing fails
    pub fn write_observations<W: Write>(out: W, rows: &[PriceObservation]) -> Result<()> {
        let mut writer = Writer::from_writer(out);

        writer.write_record([
            "observed_at",
            "commodity",
            "price",
            "basis",
            "futures_change",
            "delivery",
        ])?;

        let opt = |d: Option<rust_decimal::Decimal>| d.map(|v| v.to_string()).unwrap_or_default();

        for row in rows {
            writer.write_record(&[
                row.observed_at.to_rfc3339(),
                row.commodity.as_str().to_string(),
                row.price.to_string(),
                opt(row.basis),
                opt(row.futures_change),
                row.delivery.clone().unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
