//! app_inspector: Android UI hierarchy and screenshot acquisition
//!
//! This library provides device inspection capabilities:
//! - ADB (Android Debug Bridge) device enumeration, shell and forwarded sockets
//! - HTTP/JSON-RPC over forwarded sockets to on-device automation services
//! - Hierarchy dumps with automatic fallback across several backends
//! - Parsing of hierarchy markup into a normalized node tree
//! - A per-serial driver registry shared by concurrent callers
//!
//! # Example
//!
//! ```no_run
//! use app_inspector::get_registry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let driver = get_registry().get_driver("emulator-5554");
//!
//!     match driver.dump_hierarchy().await {
//!         Ok(hierarchy) => println!("{} nodes", hierarchy.root.count()),
//!         Err(e) => eprintln!("dump failed: {}", e),
//!     }
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Device access
pub mod adb;
pub mod device;
pub mod rpc;

// Core functionality
pub mod driver;
pub mod hierarchy;
pub mod model;
pub mod registry;

#[cfg(test)]
mod testing;

// Re-export commonly used types and functions
pub use error::{DriverError, Result};

// Config re-exports
pub use config::{
    AdbConfig, BackendPorts, DeviceTimingConfig, RpcTimingConfig, TimingConfig, ADB_CONFIG,
    TIMING_CONFIG,
};

// Device re-exports
pub use adb::{list_devices, AdbConnection, AdbDevice, AdbHost, DeviceInfo};
pub use device::{BoxedStream, DeviceConnection, ShellOutput};
pub use rpc::{fetch_through_socket, Method};

// Model re-exports
pub use model::{Bounds, CurrentApp, Hierarchy, Node, ShellResponse, WindowSize};

// Hierarchy re-exports
pub use hierarchy::{normalize_bounds, parse_xml, Strategy, StrategyChain};

// Driver re-exports
pub use driver::{AndroidDriver, DebugTransport, DeviceDriver, DeviceKind};
pub use registry::{get_registry, DriverRegistry};
