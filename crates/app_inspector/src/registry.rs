//! Per-device driver cache

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::adb::{self, DeviceInfo};
use crate::driver::{DeviceDriver, DeviceKind};
use crate::error::Result;

type DriverFactory = Box<dyn Fn(&str) -> DeviceDriver + Send + Sync>;

/// Maps a device serial to one lazily built, shared driver.
///
/// Lookups for different serials never contend on the same lock, and the
/// first lookup of a serial builds exactly one driver even when several
/// callers race.
pub struct DriverRegistry {
    kind: DeviceKind,
    factory: DriverFactory,
    drivers: DashMap<String, Arc<DeviceDriver>>,
}

impl DriverRegistry {
    /// Registry building production drivers for `kind`
    pub fn new(kind: DeviceKind) -> Self {
        Self::with_factory(kind, move |serial| DeviceDriver::connect(kind, serial))
    }

    /// Registry with a custom driver constructor
    pub fn with_factory<F>(kind: DeviceKind, factory: F) -> Self
    where
        F: Fn(&str) -> DeviceDriver + Send + Sync + 'static,
    {
        Self {
            kind,
            factory: Box::new(factory),
            drivers: DashMap::new(),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// List devices of this registry's family
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        match self.kind {
            DeviceKind::Android => adb::list_devices().await,
        }
    }

    /// Get the driver for `serial`, building it on first use
    pub fn get_driver(&self, serial: &str) -> Arc<DeviceDriver> {
        if let Some(driver) = self.drivers.get(serial) {
            return driver.value().clone();
        }

        self.drivers
            .entry(serial.to_string())
            .or_insert_with(|| {
                debug!("create driver for {}", serial);
                Arc::new((self.factory)(serial))
            })
            .value()
            .clone()
    }

    /// Number of cached drivers
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new(DeviceKind::default())
    }
}

/// Global driver registry instance
static DRIVER_REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();

/// Get the global driver registry
pub fn get_registry() -> &'static DriverRegistry {
    DRIVER_REGISTRY.get_or_init(DriverRegistry::default)
}
