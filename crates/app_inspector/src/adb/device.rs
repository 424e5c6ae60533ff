//! Device control through the adb tool for a single serial

use async_trait::async_trait;
use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::transport::AdbHost;
use crate::config::{AdbConfig, ADB_CONFIG, TIMING_CONFIG};
use crate::device::{BoxedStream, DeviceConnection, ShellOutput};
use crate::error::{DriverError, Result};
use crate::model::{CurrentApp, WindowSize};

const DUMP_PATH: &str = "/data/local/tmp/uidump.xml";
const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

lazy_static! {
    static ref WM_SIZE: Regex = Regex::new(r"(Physical|Override) size:\s*(\d+)x(\d+)").unwrap();
    static ref SURFACE_ORIENTATION: Regex = Regex::new(r"SurfaceOrientation:\s*(\d)").unwrap();
    static ref FOCUSED_WINDOW: Regex =
        Regex::new(r"(?:mCurrentFocus|mFocusedApp)=.*?\s([\w.]+)/([\w.$]+)[\s}]").unwrap();
}

/// One Android device reached through the adb tool and adb server
#[derive(Debug, Clone)]
pub struct AdbDevice {
    serial: String,
    adb_path: String,
    host: AdbHost,
}

impl AdbDevice {
    /// Create a device handle using the global adb configuration
    pub fn new(serial: impl Into<String>) -> Self {
        Self::with_config(serial, &ADB_CONFIG)
    }

    pub fn with_config(serial: impl Into<String>, config: &AdbConfig) -> Self {
        Self {
            serial: serial.into(),
            adb_path: config.adb_path.clone(),
            host: AdbHost::from_config(config),
        }
    }

    /// Build an adb command bound to this device
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        cmd.arg("-s").arg(&self.serial).kill_on_drop(true);
        cmd
    }

    async fn run(&self, args: &[&str], timeout: Duration) -> Result<Output> {
        let output = tokio::time::timeout(timeout, self.command().args(args).output())
            .await
            .map_err(|_| {
                DriverError::Timeout(format!(
                    "adb {} timed out after {:?}",
                    args.join(" "),
                    timeout
                ))
            })??;
        Ok(output)
    }

    /// Run a shell command that is expected to succeed and return its output
    async fn shell_checked(&self, command: &str) -> Result<String> {
        let result = self
            .shell(command, TIMING_CONFIG.device.command())
            .await?;
        if result.exit_code != 0 {
            return Err(DriverError::Protocol(format!(
                "{}: exit {}, {}",
                command, result.exit_code, result.output
            )));
        }
        Ok(result.output)
    }

    async fn rotation(&self) -> Option<u32> {
        match self.shell_checked("dumpsys input").await {
            Ok(output) => parse_surface_orientation(&output),
            Err(err) => {
                debug!("unable to read display rotation: {}", err);
                None
            }
        }
    }
}

#[async_trait]
impl DeviceConnection for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    async fn screenshot(&self) -> Result<DynamicImage> {
        let output = self
            .run(
                &["exec-out", "screencap", "-p"],
                TIMING_CONFIG.device.screenshot(),
            )
            .await?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(DriverError::Transport(format!(
                "screencap failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!("screencap returned {} bytes", output.stdout.len());
        Ok(image::load_from_memory(&output.stdout)?)
    }

    async fn create_connection(&self, port: u16) -> Result<BoxedStream> {
        let stream = self.host.create_connection(&self.serial, port).await?;
        Ok(Box::new(stream))
    }

    async fn shell(&self, command: &str, timeout: Duration) -> Result<ShellOutput> {
        let output = self.run(&["shell", command], timeout).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_adb_failure(output.status.success(), &stdout, &stderr) {
            return Err(DriverError::Transport(stderr.trim().to_string()));
        }

        Ok(ShellOutput {
            exit_code: output.status.code().unwrap_or(-1),
            output: format!("{}{}", stdout, stderr).trim_end().to_string(),
        })
    }

    async fn dump_hierarchy(&self) -> Result<String> {
        let command = format!("uiautomator dump {} && cat {}", DUMP_PATH, DUMP_PATH);
        let result = self.shell(&command, TIMING_CONFIG.device.shell()).await?;
        extract_markup(&result.output)
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol(format!("uiautomator dump: {}", result.output)))
    }

    async fn window_size(&self) -> Result<WindowSize> {
        let output = self.shell_checked("wm size").await?;
        let (width, height) = parse_wm_size(&output)
            .ok_or_else(|| DriverError::Protocol(format!("unexpected wm size output: {}", output)))?;

        match self.rotation().await {
            Some(1) | Some(3) => WindowSize::new(height, width),
            _ => WindowSize::new(width, height),
        }
    }

    async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.shell_checked(&format!("input tap {} {}", x, y)).await?;
        Ok(())
    }

    async fn keyevent(&self, key: &str) -> Result<()> {
        self.shell_checked(&format!("input keyevent {}", key)).await?;
        Ok(())
    }

    async fn install(&self, apk_path: &str) -> Result<()> {
        let output = self.run(&["install", "-r", apk_path], INSTALL_TIMEOUT).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() || !stdout.contains("Success") {
            return Err(DriverError::Protocol(format!(
                "install {} failed: {}{}",
                apk_path,
                stdout.trim(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn is_package_installed(&self, package: &str) -> Result<bool> {
        let result = self
            .shell(&format!("pm path {}", package), TIMING_CONFIG.device.command())
            .await?;
        Ok(result.exit_code == 0 && result.output.contains("package:"))
    }

    async fn app_start(&self, package: &str) -> Result<()> {
        self.shell_checked(&format!(
            "monkey -p {} -c android.intent.category.LAUNCHER 1",
            package
        ))
        .await?;
        Ok(())
    }

    async fn app_stop(&self, package: &str) -> Result<()> {
        self.shell_checked(&format!("am force-stop {}", package))
            .await?;
        Ok(())
    }

    async fn app_current(&self) -> Result<CurrentApp> {
        let output = self.shell_checked("dumpsys window").await?;
        let (package, activity) = parse_focused_app(&output)
            .ok_or_else(|| DriverError::Protocol("no focused app found".to_string()))?;

        let pid = self
            .shell(&format!("pidof {}", package), TIMING_CONFIG.device.command())
            .await
            .ok()
            .and_then(|r| r.output.split_whitespace().next()?.parse().ok());

        Ok(CurrentApp {
            package,
            activity,
            pid,
        })
    }
}

/// Messages the adb client prints when it never reached the device
const ADB_FAILURE_PREFIXES: &[&str] = &[
    "adb: ",
    "error: device",
    "error: no devices",
    "error: more than one device",
    "error: closed",
    "error: protocol fault",
    "error: cannot connect to daemon",
];

/// adb itself (not the remote command) reported the failure
fn is_adb_failure(success: bool, stdout: &str, stderr: &str) -> bool {
    if success || !stdout.trim().is_empty() {
        return false;
    }
    let stderr = stderr.trim_start();
    ADB_FAILURE_PREFIXES
        .iter()
        .any(|prefix| stderr.starts_with(prefix))
}

fn extract_markup(output: &str) -> Option<&str> {
    let start = output
        .find("<?xml")
        .or_else(|| output.find("<hierarchy"))?;
    Some(&output[start..])
}

/// Override size wins over physical size
fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let mut physical = None;
    for caps in WM_SIZE.captures_iter(output) {
        let size = (caps[2].parse().ok()?, caps[3].parse().ok()?);
        if &caps[1] == "Override" {
            return Some(size);
        }
        physical = Some(size);
    }
    physical
}

fn parse_surface_orientation(output: &str) -> Option<u32> {
    SURFACE_ORIENTATION
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
}

fn parse_focused_app(output: &str) -> Option<(String, String)> {
    FOCUSED_WINDOW
        .captures(output)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}
