//! ADB (Android Debug Bridge) backed device connection
//!
//! This module provides:
//! - `connection`: device enumeration through the adb tool
//! - `transport`: adb server smart-socket protocol for forwarded connections
//! - `device`: [`crate::device::DeviceConnection`] implementation for one serial

mod connection;
mod device;
mod transport;

pub use connection::{list_devices, AdbConnection, DeviceInfo};
pub use device::AdbDevice;
pub use transport::AdbHost;
