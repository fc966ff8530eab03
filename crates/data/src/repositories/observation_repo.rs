//! Price observation repository.
//!
//! Append-only access to `price_observations`: single-row idempotent inserts
//! plus the read paths used by the pipeline and by chart/export consumers.

use async_trait::async_trait;
use cashbid_core::Commodity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::StorageError;
use crate::models::{PriceObservation, PriceObservationRow, StoredId};
use crate::store::{AppendOutcome, HistoryQuery, PriceStore};

const SELECT_COLUMNS: &str = "id, commodity, price, basis, futures_change, delivery, \
                              observed_at, source_snapshot, run_id";

/// Repository for price observation operations.
#[derive(Debug, Clone)]
pub struct PriceObservationRepository {
    pool: PgPool,
}

impl PriceObservationRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn existing_id(
        &self,
        commodity: Commodity,
        observed_at: DateTime<Utc>,
    ) -> Result<StoredId, StorageError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            SELECT id FROM price_observations
            WHERE commodity = $1 AND observed_at = $2
            "#,
        )
        .bind(commodity.as_str())
        .bind(observed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredId(id))
    }

    fn into_models(rows: Vec<PriceObservationRow>) -> Result<Vec<PriceObservation>, StorageError> {
        rows.into_iter().map(PriceObservation::try_from).collect()
    }
}

#[async_trait]
impl PriceStore for PriceObservationRepository {
    async fn append(&self, observation: &PriceObservation) -> Result<AppendOutcome, StorageError> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO price_observations
                (commodity, price, basis, futures_change, delivery,
                 observed_at, source_snapshot, run_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (commodity, observed_at) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(observation.commodity.as_str())
        .bind(observation.price)
        .bind(observation.basis)
        .bind(observation.futures_change)
        .bind(&observation.delivery)
        .bind(observation.observed_at)
        .bind(&observation.source_snapshot)
        .bind(observation.run_id)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok(AppendOutcome {
                id: StoredId(id),
                inserted: true,
            }),
            None => {
                let id = self
                    .existing_id(observation.commodity, observation.observed_at)
                    .await?;
                tracing::debug!(
                    "{} at {} already stored as #{}",
                    observation.commodity,
                    observation.observed_at,
                    id
                );
                Ok(AppendOutcome {
                    id,
                    inserted: false,
                })
            }
        }
    }

    async fn latest(&self, commodity: Commodity) -> Result<Option<PriceObservation>, StorageError> {
        let row = sqlx::query_as::<_, PriceObservationRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM price_observations
            WHERE commodity = $1
            ORDER BY observed_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(commodity.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PriceObservation::try_from).transpose()
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<PriceObservation>, StorageError> {
        let rows = sqlx::query_as::<_, PriceObservationRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM price_observations
            WHERE ($1::TEXT IS NULL OR commodity = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR observed_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR observed_at <= $3)
            ORDER BY observed_at ASC, id ASC
            "#
        ))
        .bind(query.commodity.map(|c| c.as_str()))
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await?;

        Self::into_models(rows)
    }

    async fn recent_prices(
        &self,
        commodity: Commodity,
        limit: u32,
    ) -> Result<Vec<Decimal>, StorageError> {
        let prices: Vec<Decimal> = sqlx::query_scalar(
            r#"
            SELECT price FROM price_observations
            WHERE commodity = $1
            ORDER BY observed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(commodity.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(prices)
    }

    async fn latest_all(&self) -> Result<Vec<PriceObservation>, StorageError> {
        let rows = sqlx::query_as::<_, PriceObservationRow>(&format!(
            r#"
            SELECT DISTINCT ON (commodity) {SELECT_COLUMNS}
            FROM price_observations
            ORDER BY commodity, observed_at DESC, id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Self::into_models(rows)
    }

    async fn commodities(&self) -> Result<Vec<Commodity>, StorageError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT commodity FROM price_observations
            ORDER BY commodity
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names
            .iter()
            .filter_map(|name| {
                let parsed = Commodity::parse(name);
                if parsed.is_none() {
                    tracing::warn!("Ignoring unknown stored commodity {:?}", name);
                }
                parsed
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_new() {
        assert!(std::mem::size_of::<PriceObservationRepository>() > 0);
    }

    #[test]
    fn test_select_columns_match_row_fields() {
        for column in [
            "id",
            "commodity",
            "price",
            "basis",
            "futures_change",
            "delivery",
            "observed_at",
            "source_snapshot",
            "run_id",
        ] {
            assert!(SELECT_COLUMNS.contains(column), "missing {column}");
        }
    }
}
