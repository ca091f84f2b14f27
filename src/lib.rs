//! `hydrosync`: scheduled AWLR/ARR telemetry sync.
//!
//! Pulls water-level and rainfall readings from the Aptech and Higertech
//! vendor APIs, maps vendor device ids to canonical post names, normalizes
//! time (WIB, UTC+7) and units, and upserts the latest reading per device
//! into the station stores.
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP): this
//! file is the gateway, siblings import shared types from here.

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod routes;
pub mod scheduler;
pub mod schema;
pub mod store;
pub mod sync;
pub mod vendors;

pub use config::Config;
pub use error::{FetchError, NormalizeError, RegistryError};
pub use models::{
    CanonicalReading, CycleSummary, DeviceMapping, DeviceOutcome, RawReading, SensorKind,
    SkipReason, Vendor,
};
pub use registry::{DeviceRegistry, VendorRegistry};
pub use scheduler::{spawn_schedule, CycleGuard, SyncRunner};
pub use store::{PgStationStore, StationStore};
pub use sync::{run_cycle, AptechSync, HigertechSync, Stores, VendorSync};
