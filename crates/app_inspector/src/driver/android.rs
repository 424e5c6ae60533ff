//! Android driver: screenshots, shell and hierarchy dumps for one device

use futures::FutureExt;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::backends::{appium_hierarchy, uiautomator2_hierarchy};
use super::udt::DebugTransport;
use crate::config::{BackendPorts, RpcTimingConfig, ADB_CONFIG, TIMING_CONFIG};
use crate::device::DeviceConnection;
use crate::error::{DriverError, Result};
use crate::hierarchy::{parse_xml, Strategy, StrategyChain};
use crate::model::{CurrentApp, Hierarchy, ShellResponse, WindowSize};

pub struct AndroidDriver {
    device: Arc<dyn DeviceConnection>,
    udt: DebugTransport,
    strategies: StrategyChain,
}

impl AndroidDriver {
    /// Create a driver with the globally configured ports and timeouts
    pub fn new(device: Arc<dyn DeviceConnection>) -> Self {
        Self::with_config(device, ADB_CONFIG.ports, TIMING_CONFIG.rpc.clone())
    }

    pub fn with_config(
        device: Arc<dyn DeviceConnection>,
        ports: BackendPorts,
        timing: RpcTimingConfig,
    ) -> Self {
        let udt = DebugTransport::new(device.clone(), ports.debug_transport, timing.debug_transport());

        // uiautomator2 server conflicts with "uiautomator dump", so the native
        // dump comes last.
        let strategies = StrategyChain::new(vec![
            {
                let device = device.clone();
                let timeout = timing.uiautomator2();
                Strategy::new("uiautomator2", move || {
                    uiautomator2_hierarchy(device.clone(), ports.uiautomator2, timeout).boxed()
                })
            },
            {
                let udt = udt.clone();
                Strategy::new("udt", move || {
                    let udt = udt.clone();
                    async move { udt.dump_hierarchy().await }.boxed()
                })
            },
            {
                let device = device.clone();
                let timeout = timing.appium();
                Strategy::new("appium", move || {
                    appium_hierarchy(device.clone(), ports.appium, timeout).boxed()
                })
            },
            {
                let device = device.clone();
                Strategy::new("uiautomator-dump", move || {
                    let device = device.clone();
                    async move { device.dump_hierarchy().await }.boxed()
                })
            },
        ]);

        Self {
            device,
            udt,
            strategies,
        }
    }

    pub fn serial(&self) -> &str {
        self.device.serial()
    }

    /// Current hierarchy strategy try order
    pub fn strategy_order(&self) -> Vec<String> {
        self.strategies.order()
    }

    /// Capture display `display_id`; only display 0 is supported
    pub async fn screenshot(&self, display_id: u32) -> Result<DynamicImage> {
        // TODO: support multi-display once screencap -d is wired through
        if display_id != 0 {
            return Err(DriverError::UnsupportedDisplay(display_id));
        }

        let img = match self.device.screenshot().await {
            Ok(img) => img,
            Err(err) if err.is_recoverable() => {
                warn!("screenshot error: {}", err);
                self.udt.screenshot().await?
            }
            Err(err) => return Err(err),
        };
        Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
    }

    /// Run a shell command; failures are folded into the response
    pub async fn shell(&self, command: &str) -> ShellResponse {
        match self.device.shell(command, TIMING_CONFIG.device.shell()).await {
            Ok(result) if result.exit_code == 0 => ShellResponse::success(result.output),
            Ok(result) => ShellResponse::failure(format!(
                "exit:{}, output:{}",
                result.exit_code, result.output
            )),
            Err(err) => ShellResponse::failure(format!("adb error: {}", err)),
        }
    }

    /// Dump the current UI hierarchy as raw markup and parsed tree
    pub async fn dump_hierarchy(&self) -> Result<Hierarchy> {
        let size = self.device.window_size().await?;
        debug!("window size: {:?}", size);

        let start = Instant::now();
        let raw = self.strategies.dump().await?;
        debug!("dump_hierarchy cost: {:?}", start.elapsed());

        let root = parse_xml(&raw, size)?;
        Ok(Hierarchy { raw, root })
    }

    pub async fn window_size(&self) -> Result<WindowSize> {
        self.device.window_size().await
    }

    pub async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.device.tap(x, y).await
    }

    pub async fn app_install(&self, apk_path: &str) -> Result<()> {
        self.device.install(apk_path).await
    }

    pub async fn app_current(&self) -> Result<CurrentApp> {
        self.device.app_current().await
    }

    pub async fn app_launch(&self, package: &str) -> Result<()> {
        if !self.device.is_package_installed(package).await? {
            return Err(DriverError::AppNotInstalled(package.to_string()));
        }
        self.device.app_start(package).await
    }

    pub async fn app_terminate(&self, package: &str) -> Result<()> {
        self.device.app_stop(package).await
    }

    pub async fn home(&self) -> Result<()> {
        self.device.keyevent("HOME").await
    }

    pub async fn wake_up(&self) -> Result<()> {
        self.device.keyevent("WAKEUP").await
    }
}
