//! Timing configuration for device operations

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

/// Positive timeout in seconds from `name`; values `Duration` cannot hold fall back to `default`
fn env_secs(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &f64| *v > 0.0 && Duration::try_from_secs_f64(*v).is_ok())
        .unwrap_or(default)
}

/// Saturating seconds to `Duration`: NaN and negatives give zero, overflow gives `Duration::MAX`
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Timeouts for requests sent to automation backends over forwarded sockets
#[derive(Debug, Clone)]
pub struct RpcTimingConfig {
    pub uiautomator2_timeout: f64,
    pub appium_timeout: f64,
    pub debug_transport_timeout: f64,
}

impl Default for RpcTimingConfig {
    fn default() -> Self {
        Self {
            uiautomator2_timeout: env_secs("APP_INSPECTOR_U2_TIMEOUT", 5.0),
            appium_timeout: env_secs("APP_INSPECTOR_APPIUM_TIMEOUT", 10.0),
            debug_transport_timeout: env_secs("APP_INSPECTOR_UDT_TIMEOUT", 10.0),
        }
    }
}

impl RpcTimingConfig {
    pub fn uiautomator2(&self) -> Duration {
        secs(self.uiautomator2_timeout)
    }

    pub fn appium(&self) -> Duration {
        secs(self.appium_timeout)
    }

    pub fn debug_transport(&self) -> Duration {
        secs(self.debug_transport_timeout)
    }
}

/// Timeouts for commands executed through the adb tool
#[derive(Debug, Clone)]
pub struct DeviceTimingConfig {
    pub shell_timeout: f64,
    pub command_timeout: f64,
    pub screenshot_timeout: f64,
}

impl Default for DeviceTimingConfig {
    fn default() -> Self {
        Self {
            shell_timeout: env_secs("APP_INSPECTOR_SHELL_TIMEOUT", 20.0),
            command_timeout: env_secs("APP_INSPECTOR_COMMAND_TIMEOUT", 10.0),
            screenshot_timeout: env_secs("APP_INSPECTOR_SCREENSHOT_TIMEOUT", 10.0),
        }
    }
}

impl DeviceTimingConfig {
    pub fn shell(&self) -> Duration {
        secs(self.shell_timeout)
    }

    pub fn command(&self) -> Duration {
        secs(self.command_timeout)
    }

    pub fn screenshot(&self) -> Duration {
        secs(self.screenshot_timeout)
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub rpc: RpcTimingConfig,
    pub device: DeviceTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}
