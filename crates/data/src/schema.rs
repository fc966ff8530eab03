//! Table bootstrap.
//!
//! Every statement is idempotent, so the schema can be ensured on each start.
//! Commodity is plain text: new commodities need no migration.

use anyhow::{Context, Result};
use sqlx::PgPool;

pub(crate) const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS price_observations (
        id              BIGSERIAL PRIMARY KEY,
        commodity       TEXT NOT NULL,
        price           NUMERIC NOT NULL CHECK (price > 0),
        basis           NUMERIC,
        futures_change  NUMERIC,
        delivery        TEXT,
        observed_at     TIMESTAMPTZ NOT NULL,
        source_snapshot TEXT NOT NULL,
        run_id          UUID,
        UNIQUE (commodity, observed_at)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_price_observations_observed_at
        ON price_observations (observed_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scrape_runs (
        run_id              UUID PRIMARY KEY,
        started_at          TIMESTAMPTZ NOT NULL,
        finished_at         TIMESTAMPTZ NOT NULL,
        status              TEXT NOT NULL CHECK (status IN ('success', 'partial', 'failed')),
        commodities_found   INTEGER NOT NULL,
        commodities_missing TEXT[] NOT NULL DEFAULT '{}',
        rows_appended       INTEGER NOT NULL,
        error_detail        TEXT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_scrape_runs_started_at
        ON scrape_runs (started_at DESC)
    "#,
    // Observations are history: reject UPDATE and DELETE at the database level.
    r#"
    CREATE OR REPLACE FUNCTION price_observations_append_only() RETURNS trigger AS $$
    BEGIN
        RAISE EXCEPTION 'price_observations is append-only';
    END;
    $$ LANGUAGE plpgsql
    "#,
    r#"
    DO $$
    BEGIN
        IF NOT EXISTS (
            SELECT 1 FROM pg_trigger WHERE tgname = 'price_observations_no_mutation'
        ) THEN
            CREATE TRIGGER price_observations_no_mutation
                BEFORE UPDATE OR DELETE ON price_observations
                FOR EACH ROW EXECUTE FUNCTION price_observations_append_only();
        END IF;
    END
    $$
    "#,
];

/// Creates tables, indexes and the append-only trigger if absent.
///
/// # Errors
/// Returns an error if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for (i, statement) in STATEMENTS.iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Schema statement {} failed", i + 1))?;
    }
    tracing::debug!("Schema ensured ({} statements)", STATEMENTS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for statement in STATEMENTS {
            let s = statement.trim_start();
            assert!(
                s.contains("IF NOT EXISTS") || s.starts_with("CREATE OR REPLACE"),
                "not idempotent: {s}"
            );
        }
    }

    #[test]
    fn test_observation_key_is_unique() {
        assert!(STATEMENTS[0].contains("UNIQUE (commodity, observed_at)"));
    }
}
