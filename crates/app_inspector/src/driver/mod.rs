//! Device drivers
//!
//! A [`DeviceDriver`] exposes the same capability set for every device family:
//! screenshot, shell, hierarchy dump and basic lifecycle control. Android is
//! the only family implemented today.

mod android;
mod backends;
mod udt;

use image::DynamicImage;
use std::sync::Arc;

use crate::adb::AdbDevice;
use crate::error::Result;
use crate::model::{CurrentApp, Hierarchy, ShellResponse, WindowSize};

pub use android::AndroidDriver;
pub use udt::DebugTransport;

/// Device family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Android,
}

/// Driver for one device, dispatching on the device family
pub enum DeviceDriver {
    Android(AndroidDriver),
}

impl DeviceDriver {
    /// Build the production driver for `serial`
    pub fn connect(kind: DeviceKind, serial: &str) -> Self {
        match kind {
            DeviceKind::Android => {
                DeviceDriver::Android(AndroidDriver::new(Arc::new(AdbDevice::new(serial))))
            }
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            DeviceDriver::Android(_) => DeviceKind::Android,
        }
    }

    pub fn serial(&self) -> &str {
        match self {
            DeviceDriver::Android(d) => d.serial(),
        }
    }

    /// Capture a display as an RGB bitmap
    pub async fn screenshot(&self, display_id: u32) -> Result<DynamicImage> {
        match self {
            DeviceDriver::Android(d) => d.screenshot(display_id).await,
        }
    }

    /// Run a shell command; never fails, errors are reported in the response
    pub async fn shell(&self, command: &str) -> ShellResponse {
        match self {
            DeviceDriver::Android(d) => d.shell(command).await,
        }
    }

    /// Dump the UI hierarchy
    pub async fn dump_hierarchy(&self) -> Result<Hierarchy> {
        match self {
            DeviceDriver::Android(d) => d.dump_hierarchy().await,
        }
    }

    pub async fn window_size(&self) -> Result<WindowSize> {
        match self {
            DeviceDriver::Android(d) => d.window_size().await,
        }
    }

    pub async fn tap(&self, x: i32, y: i32) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.tap(x, y).await,
        }
    }

    pub async fn app_install(&self, apk_path: &str) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.app_install(apk_path).await,
        }
    }

    pub async fn app_current(&self) -> Result<CurrentApp> {
        match self {
            DeviceDriver::Android(d) => d.app_current().await,
        }
    }

    pub async fn app_launch(&self, package: &str) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.app_launch(package).await,
        }
    }

    pub async fn app_terminate(&self, package: &str) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.app_terminate(package).await,
        }
    }

    pub async fn home(&self) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.home().await,
        }
    }

    pub async fn wake_up(&self) -> Result<()> {
        match self {
            DeviceDriver::Android(d) => d.wake_up().await,
        }
    }
}
