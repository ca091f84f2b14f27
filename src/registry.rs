//! Static device registries: vendor device id to canonical post name.
//!
//! Each vendor has one table for water-level (AWLR) devices and one for
//! rainfall (ARR) devices. Tables are compiled in, validated once at
//! startup, and shared read-only for the life of the process.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::models::{DeviceMapping, SensorKind, Vendor};

// ---

const APTECH_AWLR: &[(&str, &str)] = &[("sabagi", "Sabagi"), ("undarandir", "Undar Andir")];

const APTECH_ARR: &[(&str, &str)] = &[
    ("ciminyak", "Ciminyak"),
    ("pchciomas", "Ciomas"),
    ("kiarasari", "Kiarasari"),
    ("aptechv2_h3", "Padarincang"),
    ("aptechv2_h2", "Pamarayan"),
    ("aptechv2_f1", "Pulo Ampel"),
    ("sepang", "Sepang"),
    ("smp2lewudamar", "SMP2 Leuwidamar"),
    ("sukmajaya", "Sukmajaya"),
    ("telagaluhur", "Telaga Luhur"),
    ("tersaba", "Tersaba"),
    ("toge", "Toge"),
];

const HIGERTECH_AWLR: &[(&str, &str)] = &[
    ("HGT412", "Pabuaran"),
    ("HGT281", "Al Azhar Kaujon"),
    ("HGT414", "Pamarayan Hulu"),
    ("HGT280", "Kenari Kasunyatan"),
    ("HGT282", "Jembatan Cimake"),
    ("HGT278", "Bendung Karet Cibanten"),
    ("HGT413", "Kp. Peusar"),
    ("HGT664", "Bojong Manik"),
    ("HGT671", "Cikande"),
    ("HGT678", "Jasinga"),
    ("HGT679", "Bendungan Karet Cidurian"),
    ("HGT709", "Tanjungsari"),
];

const HIGERTECH_ARR: &[(&str, &str)] = &[("HGT665", "Bojong Manik")];

/// Lookup table for one vendor and one sensor kind.
///
/// Iteration follows declaration order so per-device sync loops are
/// deterministic.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    mappings: Vec<DeviceMapping>,
    index: HashMap<String, usize>,
}

impl DeviceRegistry {
    // ---
    pub fn from_table(kind: SensorKind, table: &[(&str, &str)]) -> Result<Self, RegistryError> {
        // ---
        let mut mappings = Vec::with_capacity(table.len());
        let mut index = HashMap::with_capacity(table.len());

        for (device_id, post_name) in table {
            if index.insert(device_id.to_string(), mappings.len()).is_some() {
                return Err(RegistryError::DuplicateDevice(device_id.to_string()));
            }
            mappings.push(DeviceMapping {
                vendor_device_id: device_id.to_string(),
                post_name: post_name.to_string(),
                sensor_kind: kind,
            });
        }

        Ok(DeviceRegistry {
            mappings,
            index,
        })
    }

    /// Canonical post name, or `None` for a device this table does not track.
    pub fn post_name(&self, device_id: &str) -> Option<&str> {
        self.index
            .get(device_id)
            .map(|&i| self.mappings[i].post_name.as_str())
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Both registries of a single vendor.
#[derive(Debug, Clone)]
pub struct VendorRegistry {
    pub vendor: Vendor,
    pub water_level: DeviceRegistry,
    pub rainfall: DeviceRegistry,
}

impl VendorRegistry {
    // ---
    /// Pair two tables, rejecting a device id that appears in both.
    pub fn new(
        vendor: Vendor,
        water_level: DeviceRegistry,
        rainfall: DeviceRegistry,
    ) -> Result<Self, RegistryError> {
        // ---
        if let Some(dup) = water_level
            .devices()
            .find(|m| rainfall.post_name(&m.vendor_device_id).is_some())
        {
            return Err(RegistryError::DuplicateDevice(dup.vendor_device_id.clone()));
        }

        Ok(VendorRegistry {
            vendor,
            water_level,
            rainfall,
        })
    }

    /// Compiled-in tables for `vendor`.
    pub fn builtin(vendor: Vendor) -> Result<Self, RegistryError> {
        // ---
        let (awlr, arr) = match vendor {
            Vendor::Aptech => (APTECH_AWLR, APTECH_ARR),
            Vendor::Higertech => (HIGERTECH_AWLR, HIGERTECH_ARR),
        };
        VendorRegistry::new(
            vendor,
            DeviceRegistry::from_table(SensorKind::WaterLevel, awlr)?,
            DeviceRegistry::from_table(SensorKind::Rainfall, arr)?,
        )
    }

    pub fn for_kind(&self, kind: SensorKind) -> &DeviceRegistry {
        match kind {
            SensorKind::WaterLevel => &self.water_level,
            SensorKind::Rainfall => &self.rainfall,
        }
    }

    /// Post name for `device_id` in the `kind` table.
    pub fn lookup(&self, device_id: &str, kind: SensorKind) -> Option<&str> {
        self.for_kind(kind).post_name(device_id)
    }
}
