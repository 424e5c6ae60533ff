//! Hierarchy fetchers for automation servers reached over forwarded sockets

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::device::DeviceConnection;
use crate::error::{DriverError, Result};
use crate::rpc::{fetch_through_socket, Method};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ValueResponse {
    value: Value,
}

fn malformed(source: &str, err: impl std::fmt::Display) -> DriverError {
    DriverError::MalformedPayload(format!("{}: {}", source, err))
}

/// `dumpWindowHierarchy` on the embedded uiautomator2 server
pub(crate) async fn uiautomator2_hierarchy(
    device: Arc<dyn DeviceConnection>,
    port: u16,
    timeout: Duration,
) -> Result<String> {
    let compressed = false;
    let request = JsonRpcRequest {
        jsonrpc: "2.0",
        method: "dumpWindowHierarchy",
        params: Value::Array(vec![Value::Bool(compressed)]),
        id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
    };
    let payload = serde_json::to_value(&request)?;

    let mut conn = device.create_connection(port).await?;
    let content =
        fetch_through_socket(&mut conn, "/jsonrpc/0", Method::POST, Some(&payload), timeout)
            .await?;
    parse_jsonrpc_result(&content)
}

fn parse_jsonrpc_result(content: &[u8]) -> Result<String> {
    let response: JsonRpcResponse =
        serde_json::from_slice(content).map_err(|e| malformed("uiautomator2", e))?;

    if let Some(error) = response.error {
        return Err(DriverError::Protocol(format!("uiautomator2: {}", error)));
    }
    match response.result {
        Some(Value::String(markup)) => Ok(markup),
        Some(other) => Err(malformed("uiautomator2", format!("non-string result {}", other))),
        None => Err(malformed("uiautomator2", "response has neither result nor error")),
    }
}

/// Page source from the Appium-compatible server
pub(crate) async fn appium_hierarchy(
    device: Arc<dyn DeviceConnection>,
    port: u16,
    timeout: Duration,
) -> Result<String> {
    let mut conn = device.create_connection(port).await?;
    let content = fetch_through_socket(
        &mut conn,
        "/wd/hub/session/0/source",
        Method::GET,
        None,
        timeout,
    )
    .await?;
    parse_value_markup("appium", &content)
}

/// Extract the markup string from a `{"value": ...}` envelope
pub(crate) fn parse_value_markup(source: &str, content: &[u8]) -> Result<String> {
    let response: ValueResponse =
        serde_json::from_slice(content).map_err(|e| malformed(source, e))?;
    match response.value {
        Value::String(markup) => Ok(markup),
        Value::Object(map) if map.contains_key("error") => {
            Err(DriverError::Protocol(format!("{}: {}", source, Value::Object(map))))
        }
        other => Err(malformed(source, format!("non-string value {}", other))),
    }
}
