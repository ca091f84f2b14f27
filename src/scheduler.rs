//! Fixed-interval triggers with a skip-if-running guard.
//!
//! Every vendor gets its own [`SyncRunner`] and ticker task. Each tick
//! spawns a cycle; a tick (or a manual trigger) that arrives while the
//! previous cycle is still in flight is logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::models::{CycleSummary, Vendor};
use crate::sync::{run_cycle, Stores, VendorSync};

// ---

/// Single-flight flag for one vendor's cycles.
#[derive(Debug, Default)]
pub struct CycleGuard {
    running: AtomicBool,
}

/// Held while a cycle runs; clears the flag on drop.
#[derive(Debug)]
pub struct CyclePermit<'a> {
    guard: &'a CycleGuard,
}

impl CycleGuard {
    // ---
    /// `None` if a cycle is already running.
    pub fn try_acquire(&self) -> Option<CyclePermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CyclePermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for CyclePermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Cycle entry point for one vendor, shared by the ticker and HTTP routes.
pub struct SyncRunner {
    vendor_sync: Box<dyn VendorSync>,
    stores: Stores,
    guard: CycleGuard,
    last: RwLock<Option<CycleSummary>>,
}

impl SyncRunner {
    // ---
    pub fn new(vendor_sync: Box<dyn VendorSync>, stores: Stores) -> Self {
        SyncRunner {
            vendor_sync,
            stores,
            guard: CycleGuard::default(),
            last: RwLock::new(None),
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor_sync.vendor()
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Run one cycle now. Returns `None` without doing anything if a cycle
    /// for this vendor is already in flight.
    pub async fn trigger(&self) -> Option<CycleSummary> {
        // ---
        let Some(_permit) = self.guard.try_acquire() else {
            warn!("{} sync still running, skipping this trigger", self.vendor());
            return None;
        };

        let summary = run_cycle(self.vendor_sync.as_ref(), &self.stores).await;
        *self.last.write().await = Some(summary.clone());
        Some(summary)
    }

    /// Summary of the most recently completed cycle.
    pub async fn last_summary(&self) -> Option<CycleSummary> {
        self.last.read().await.clone()
    }
}

/// Start the ticker for `runner`. The first cycle fires immediately.
pub fn spawn_schedule(runner: Arc<SyncRunner>, every: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            debug!("{} sync tick", runner.vendor());

            let runner = Arc::clone(&runner);
            tokio::spawn(async move {
                runner.trigger().await;
            });
        }
    })
}
