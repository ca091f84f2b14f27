//! Sync orchestrator: one fetch → normalize → persist pass per vendor.
//!
//! Each vendor runs its AWLR sub-pipeline and then its ARR sub-pipeline.
//! Every device (or batch record) yields a [`DeviceOutcome`]; nothing that
//! goes wrong for one device reaches the next. The only cycle-level
//! failure is a batch fetch error, which ends that vendor's cycle early.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn, Instrument};

use crate::models::{CycleSummary, DeviceOutcome, RawReading, SensorKind, SkipReason, Vendor};
use crate::normalize::normalize;
use crate::registry::VendorRegistry;
use crate::store::StationStore;
use crate::vendors::{AptechClient, HigertechClient};

// ---

/// Sub-pipeline order within a cycle.
const KINDS: [SensorKind; 2] = [SensorKind::WaterLevel, SensorKind::Rainfall];

/// The two downstream stores a cycle writes to.
#[derive(Clone)]
pub struct Stores {
    pub water_level: Arc<dyn StationStore>,
    pub rainfall: Arc<dyn StationStore>,
}

impl Stores {
    // ---
    pub fn for_kind(&self, kind: SensorKind) -> &dyn StationStore {
        match kind {
            SensorKind::WaterLevel => self.water_level.as_ref(),
            SensorKind::Rainfall => self.rainfall.as_ref(),
        }
    }
}

/// A vendor-specific sync pass.
#[async_trait]
pub trait VendorSync: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Process every registered device, recording outcomes in `summary`.
    async fn sync(&self, stores: &Stores, summary: &mut CycleSummary);
}

/// Run one complete cycle for `vendor_sync`. Never fails; the returned
/// summary is the only result.
pub async fn run_cycle(vendor_sync: &dyn VendorSync, stores: &Stores) -> CycleSummary {
    // ---
    let vendor = vendor_sync.vendor();
    let mut summary = CycleSummary::start(vendor);
    let span = tracing::info_span!("sync_cycle", %vendor, cycle_id = %summary.cycle_id);

    async {
        info!("Running {} sync...", vendor);
        vendor_sync.sync(stores, &mut summary).await;

        match &summary.aborted {
            None => info!(
                "{} sync complete: updated={} skipped={} failed={}",
                vendor, summary.updated, summary.skipped, summary.failed
            ),
            Some(reason) => error!("{} sync aborted: {}", vendor, reason),
        }
    }
    .instrument(span)
    .await;

    summary.finish()
}

/// Normalize one raw reading and hand it to `store`.
pub async fn persist_reading(
    vendor: Vendor,
    kind: SensorKind,
    raw: &RawReading,
    post_name: &str,
    store: &dyn StationStore,
) -> DeviceOutcome {
    // ---
    let label = kind.label();
    let reading = match normalize(raw, vendor, kind, post_name) {
        Ok(reading) => reading,
        Err(e) => {
            warn!("Invalid {} record for {} ({}): {}", label, post_name, raw.device_id, e);
            return DeviceOutcome::Failed(e.to_string());
        }
    };

    match store.update_by_device_id(&reading).await {
        Ok(()) => {
            info!("{} updated: {} ({})", label, post_name, raw.device_id);
            DeviceOutcome::Updated
        }
        Err(e) => {
            warn!("Failed to update {} {} ({}): {:#}", label, post_name, raw.device_id, e);
            DeviceOutcome::Failed(format!("{e:#}"))
        }
    }
}

// ---

/// Aptech: one batch request, then both registries filter the same list.
pub struct AptechSync {
    client: AptechClient,
    registry: VendorRegistry,
}

impl AptechSync {
    pub fn new(client: AptechClient, registry: VendorRegistry) -> Self {
        AptechSync { client, registry }
    }
}

#[async_trait]
impl VendorSync for AptechSync {
    // ---
    fn vendor(&self) -> Vendor {
        Vendor::Aptech
    }

    async fn sync(&self, stores: &Stores, summary: &mut CycleSummary) {
        // ---
        let records = match self.client.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                summary.abort(format!("batch fetch failed: {e}"));
                return;
            }
        };

        for kind in KINDS {
            let store = stores.for_kind(kind);

            for record in &records {
                // Devices outside this registry are not ours to process
                let Some(post_name) = self.registry.lookup(&record.device_id, kind) else {
                    continue;
                };

                let outcome = match record.to_raw(kind) {
                    Ok(raw) => persist_reading(Vendor::Aptech, kind, &raw, post_name, store).await,
                    Err(reason) => {
                        warn!(
                            "Skipping {} {} ({}): {}",
                            kind.label(),
                            post_name,
                            record.device_id,
                            reason
                        );
                        DeviceOutcome::Skipped(reason)
                    }
                };
                summary.record(&outcome);
            }
        }
    }
}

/// Higertech: one request per registered device, sequentially.
pub struct HigertechSync {
    client: HigertechClient,
    registry: VendorRegistry,
}

impl HigertechSync {
    // ---
    pub fn new(client: HigertechClient, registry: VendorRegistry) -> Self {
        HigertechSync { client, registry }
    }

    /// Fetch and extract one device. Every failure collapses to a skip.
    async fn fetch_raw(&self, device_id: &str, kind: SensorKind) -> Result<RawReading, (SkipReason, String)> {
        // ---
        match self.client.fetch_one(device_id).await {
            Ok(Some(reading)) => reading
                .to_raw(kind)
                .map_err(|reason| (reason, "missing timestamp or measurement".to_string())),
            Ok(None) => Err((SkipReason::NoData, "device absent from response".to_string())),
            Err(e) => Err((SkipReason::NoData, e.to_string())),
        }
    }
}

#[async_trait]
impl VendorSync for HigertechSync {
    // ---
    fn vendor(&self) -> Vendor {
        Vendor::Higertech
    }

    async fn sync(&self, stores: &Stores, summary: &mut CycleSummary) {
        // ---
        for kind in KINDS {
            let store = stores.for_kind(kind);

            for mapping in self.registry.for_kind(kind).devices() {
                let device_id = mapping.vendor_device_id.as_str();
                let post_name = mapping.post_name.as_str();

                let outcome = match self.fetch_raw(device_id, kind).await {
                    Ok(raw) => persist_reading(Vendor::Higertech, kind, &raw, post_name, store).await,
                    Err((reason, detail)) => {
                        warn!(
                            "Incomplete {} data for device {} ({}): {} - {}",
                            kind.label(),
                            device_id,
                            post_name,
                            reason,
                            detail
                        );
                        DeviceOutcome::Skipped(reason)
                    }
                };
                summary.record(&outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::CanonicalReading;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingStore {
        written: Mutex<Vec<CanonicalReading>>,
        fail: bool,
    }

    #[async_trait]
    impl StationStore for CapturingStore {
        async fn update_by_device_id(&self, reading: &CanonicalReading) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            self.written.lock().unwrap().push(reading.clone());
            Ok(())
        }
    }

    fn raw(value: serde_json::Value) -> RawReading {
        RawReading {
            device_id: "sabagi".into(),
            timestamp: "2024-01-01 00:00:00".into(),
            value,
            battery: None,
        }
    }

    #[test]
    fn test_persist_reading_updates_store() {
        // ---
        let store = CapturingStore::default();
        let outcome = tokio_test::block_on(persist_reading(
            Vendor::Aptech,
            SensorKind::WaterLevel,
            &raw(json!("250")),
            "Sabagi",
            &store,
        ));

        assert_eq!(outcome, DeviceOutcome::Updated);
        let written = store.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].value, 2.5);
        assert_eq!(written[0].post_name, "Sabagi");
    }

    #[test]
    fn test_persist_reading_store_failure_is_outcome() {
        // ---
        let store = CapturingStore {
            fail: true,
            ..Default::default()
        };
        let outcome = tokio_test::block_on(persist_reading(
            Vendor::Aptech,
            SensorKind::WaterLevel,
            &raw(json!("250")),
            "Sabagi",
            &store,
        ));

        match outcome {
            DeviceOutcome::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_persist_reading_parse_failure_skips_store() {
        // ---
        let store = CapturingStore::default();
        let outcome = tokio_test::block_on(persist_reading(
            Vendor::Aptech,
            SensorKind::WaterLevel,
            &raw(json!("--")),
            "Sabagi",
            &store,
        ));

        assert!(matches!(outcome, DeviceOutcome::Failed(_)));
        assert!(store.written.lock().unwrap().is_empty());
    }
}
