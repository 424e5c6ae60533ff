//! Device enumeration through the adb tool

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;

use crate::config::ADB_CONFIG;
use crate::error::{DriverError, Result};

/// Information about a device known to the adb server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub model: String,
    pub name: String,
    pub status: String,
    pub enabled: bool,
}

/// Runs adb host commands
pub struct AdbConnection {
    adb_path: String,
}

impl AdbConnection {
    /// Create a connection using the configured adb path
    pub fn new() -> Self {
        Self::with_path(ADB_CONFIG.adb_path.clone())
    }

    /// Create a connection with a custom adb path
    pub fn with_path(adb_path: String) -> Self {
        Self { adb_path }
    }

    /// List all devices the adb server knows about
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let output = tokio::time::timeout(
            Duration::from_secs(5),
            Command::new(&self.adb_path)
                .arg("devices")
                .arg("-l")
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| DriverError::Timeout("List devices timeout after 5s".to_string()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::Transport(format!(
                "adb devices failed: {}",
                stderr.trim()
            )));
        }

        Ok(parse_devices_output(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Find one device by serial
    pub async fn get_device_info(&self, serial: &str) -> Result<Option<DeviceInfo>> {
        let devices = self.list_devices().await?;
        Ok(devices.into_iter().find(|d| d.serial == serial))
    }
}

impl Default for AdbConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `adb devices -l` output
fn parse_devices_output(stdout: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        // Skip header and daemon chatter
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let mut model = String::new();
        let mut name = String::new();
        for part in &parts[2..] {
            if let Some(value) = part.strip_prefix("model:") {
                model = value.to_string();
            } else if let Some(value) = part.strip_prefix("device:") {
                name = value.to_string();
            }
        }

        let status = parts[1].to_string();
        devices.push(DeviceInfo {
            serial: parts[0].to_string(),
            model,
            name,
            enabled: status == "device",
            status,
        });
    }

    devices
}

/// Quick helper to list connected devices
pub async fn list_devices() -> Result<Vec<DeviceInfo>> {
    AdbConnection::new().list_devices().await
}
