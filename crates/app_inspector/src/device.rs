//! Device connection capability consumed by the drivers
//!
//! The driver never talks to a transport directly; everything it needs from a
//! device goes through [`DeviceConnection`]. `crate::adb::AdbDevice` is the
//! production implementation.

use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::model::{CurrentApp, WindowSize};

/// Bidirectional byte stream to a service listening on the device
pub trait ForwardedStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ForwardedStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Owned forwarded connection; dropping it closes the connection
pub type BoxedStream = Box<dyn ForwardedStream>;

/// Exit status and captured output of a device shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub exit_code: i32,
    pub output: String,
}

#[async_trait]
pub trait DeviceConnection: Send + Sync {
    /// Device identifier (adb serial)
    fn serial(&self) -> &str;

    /// Capture the default display directly
    async fn screenshot(&self) -> Result<DynamicImage>;

    /// Open a connection to `port` on the device
    async fn create_connection(&self, port: u16) -> Result<BoxedStream>;

    async fn shell(&self, command: &str, timeout: Duration) -> Result<ShellOutput>;

    /// Platform-native hierarchy dump (uiautomator dump)
    async fn dump_hierarchy(&self) -> Result<String>;

    async fn window_size(&self) -> Result<WindowSize>;

    async fn tap(&self, x: i32, y: i32) -> Result<()>;

    async fn keyevent(&self, key: &str) -> Result<()>;

    async fn install(&self, apk_path: &str) -> Result<()>;

    async fn is_package_installed(&self, package: &str) -> Result<bool>;

    async fn app_start(&self, package: &str) -> Result<()>;

    async fn app_stop(&self, package: &str) -> Result<()>;

    async fn app_current(&self) -> Result<CurrentApp>;
}
