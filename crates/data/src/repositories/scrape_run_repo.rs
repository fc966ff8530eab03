//! Scrape run repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StorageError;
use crate::models::{ScrapeRun, ScrapeRunRow};
use crate::store::RunLog;

/// Repository for the `scrape_runs` table.
#[derive(Debug, Clone)]
pub struct ScrapeRunRepository {
    pool: PgPool,
}

impl ScrapeRunRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunLog for ScrapeRunRepository {
    async fn record_run(&self, run: &ScrapeRun) -> Result<(), StorageError> {
        let missing: Vec<String> = run
            .commodities_missing
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO scrape_runs
                (run_id, started_at, finished_at, status, commodities_found,
                 commodities_missing, rows_appended, error_detail)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (run_id) DO NOTHING
            "#,
        )
        .bind(run.run_id)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.status.as_str())
        .bind(i32::try_from(run.commodities_found).unwrap_or(i32::MAX))
        .bind(&missing)
        .bind(i32::try_from(run.rows_appended).unwrap_or(i32::MAX))
        .bind(&run.error_detail)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> Result<Vec<ScrapeRun>, StorageError> {
        let rows = sqlx::query_as::<_, ScrapeRunRow>(
            r#"
            SELECT run_id, started_at, finished_at, status, commodities_found,
                   commodities_missing, rows_appended, error_detail
            FROM scrape_runs
            ORDER BY started_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ScrapeRun::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_new() {
        assert!(std::mem::size_of::<ScrapeRunRepository>() > 0);
    }
}
