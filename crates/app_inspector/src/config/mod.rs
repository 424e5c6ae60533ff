//! Configuration module for app_inspector
//!
//! This module contains:
//! - `timing`: Timeouts for device commands and backend RPC calls
//! - `adb`: ADB tool/server location and well-known backend ports

mod adb;
mod timing;

pub use adb::{AdbConfig, BackendPorts, ADB_CONFIG};
pub use timing::{DeviceTimingConfig, RpcTimingConfig, TimingConfig, TIMING_CONFIG};
