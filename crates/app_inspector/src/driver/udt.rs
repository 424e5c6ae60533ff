//! Client for the custom debug-transport service running on the device

use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;

use super::backends::parse_value_markup;
use crate::device::DeviceConnection;
use crate::error::{DriverError, Result};
use crate::rpc::{fetch_through_socket, Method};

/// Every failure of this service is reported as [`DriverError::DebugTransport`]
fn udt_error(err: DriverError) -> DriverError {
    match err {
        DriverError::DebugTransport(_) => err,
        other => DriverError::DebugTransport(other.to_string()),
    }
}

#[derive(Clone)]
pub struct DebugTransport {
    device: Arc<dyn DeviceConnection>,
    port: u16,
    timeout: Duration,
}

impl DebugTransport {
    pub fn new(device: Arc<dyn DeviceConnection>, port: u16, timeout: Duration) -> Self {
        Self {
            device,
            port,
            timeout,
        }
    }

    pub async fn dump_hierarchy(&self) -> Result<String> {
        let content = self.get("/dump/hierarchy").await?;
        parse_value_markup("udt", &content).map_err(udt_error)
    }

    pub async fn screenshot(&self) -> Result<DynamicImage> {
        let content = self.get("/screenshot").await?;
        image::load_from_memory(&content)
            .map_err(|e| DriverError::DebugTransport(format!("screenshot: {}", e)))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let mut conn = self
            .device
            .create_connection(self.port)
            .await
            .map_err(udt_error)?;
        fetch_through_socket(&mut conn, path, Method::GET, None, self.timeout)
            .await
            .map_err(udt_error)
    }
}
