//! Database schema management for `hydrosync`.
//!
//! Ensures the station tables exist before the sync loops start.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates `awlr_stations` (latest water level per device) and
/// `arr_stations` (latest rainfall per device). Safe to call on every
/// startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Water-level posts, meters
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS awlr_stations (
            device_id    TEXT PRIMARY KEY,
            post_name    TEXT             NOT NULL,
            time         TIMESTAMPTZ      NOT NULL,
            water_level  DOUBLE PRECISION NOT NULL,
            battery      DOUBLE PRECISION,
            updated_at   TIMESTAMPTZ      NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Rain-gauge posts, millimeters
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS arr_stations (
            device_id    TEXT PRIMARY KEY,
            post_name    TEXT             NOT NULL,
            time         TIMESTAMPTZ      NOT NULL,
            rainfall     DOUBLE PRECISION NOT NULL,
            battery      DOUBLE PRECISION,
            updated_at   TIMESTAMPTZ      NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_awlr_stations_post_name
            ON awlr_stations (post_name);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_arr_stations_post_name
            ON arr_stations (post_name);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
