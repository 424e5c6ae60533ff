//! ADB location and well-known ports of the automation backends

use lazy_static::lazy_static;
use std::env;

fn env_port(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Device-local ports the automation backends listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPorts {
    /// Embedded uiautomator2 JSON-RPC server
    pub uiautomator2: u16,
    /// Appium-compatible UiAutomator2 server
    pub appium: u16,
    /// Custom debug-transport service
    pub debug_transport: u16,
}

impl Default for BackendPorts {
    fn default() -> Self {
        Self {
            uiautomator2: env_port("APP_INSPECTOR_U2_PORT", 9008),
            appium: env_port("APP_INSPECTOR_APPIUM_PORT", 6790),
            debug_transport: env_port("APP_INSPECTOR_UDT_PORT", 20408),
        }
    }
}

/// Where to find the adb tool and the adb server
#[derive(Debug, Clone)]
pub struct AdbConfig {
    pub adb_path: String,
    pub server_host: String,
    pub server_port: u16,
    pub ports: BackendPorts,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            adb_path: env::var("ADB").unwrap_or_else(|_| "adb".to_string()),
            server_host: env::var("ANDROID_ADB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env_port("ANDROID_ADB_SERVER_PORT", 5037),
            ports: BackendPorts::default(),
        }
    }
}

impl AdbConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

lazy_static! {
    /// Global adb configuration instance
    pub static ref ADB_CONFIG: AdbConfig = AdbConfig::default();
}
