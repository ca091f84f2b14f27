//! Downstream station stores.
//!
//! The sync loop only needs `update_by_device_id`; the Postgres
//! implementation keeps the latest reading per device in `awlr_stations`
//! or `arr_stations` (see `schema`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{CanonicalReading, SensorKind};

// ---

/// Idempotent latest-value upsert keyed by device id.
#[async_trait]
pub trait StationStore: Send + Sync {
    async fn update_by_device_id(&self, reading: &CanonicalReading) -> Result<()>;
}

/// Postgres-backed store for one sensor kind.
#[derive(Debug, Clone)]
pub struct PgStationStore {
    pool: PgPool,
    kind: SensorKind,
}

impl PgStationStore {
    // ---
    pub fn new(pool: PgPool, kind: SensorKind) -> Self {
        PgStationStore { pool, kind }
    }

    /// Upsert statement for this store's table.
    ///
    /// Older observations never overwrite newer ones, so overlapping
    /// cycles settle on the latest `time`. A missing battery keeps the
    /// stored value.
    fn upsert_sql(&self) -> &'static str {
        match self.kind {
            SensorKind::WaterLevel => {
                r#"
                INSERT INTO awlr_stations (device_id, post_name, time, water_level, battery, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (device_id) DO UPDATE SET
                    post_name   = EXCLUDED.post_name,
                    time        = EXCLUDED.time,
                    water_level = EXCLUDED.water_level,
                    battery     = COALESCE(EXCLUDED.battery, awlr_stations.battery),
                    updated_at  = NOW()
                WHERE awlr_stations.time <= EXCLUDED.time
                "#
            }
            SensorKind::Rainfall => {
                r#"
                INSERT INTO arr_stations (device_id, post_name, time, rainfall, battery, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                ON CONFLICT (device_id) DO UPDATE SET
                    post_name  = EXCLUDED.post_name,
                    time       = EXCLUDED.time,
                    rainfall   = EXCLUDED.rainfall,
                    battery    = COALESCE(EXCLUDED.battery, arr_stations.battery),
                    updated_at = NOW()
                WHERE arr_stations.time <= EXCLUDED.time
                "#
            }
        }
    }
}

#[async_trait]
impl StationStore for PgStationStore {
    async fn update_by_device_id(&self, reading: &CanonicalReading) -> Result<()> {
        // ---
        let result = sqlx::query(self.upsert_sql())
            .bind(&reading.device_id)
            .bind(&reading.post_name)
            .bind(reading.observed_at)
            .bind(reading.value)
            .bind(reading.battery)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "{} upsert failed for device '{}'",
                    self.kind.label(),
                    reading.device_id
                )
            })?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                "{} reading for {} at {} is older than stored value, kept existing row",
                self.kind.label(),
                reading.device_id,
                reading.observed_at
            );
        }
        Ok(())
    }
}
