//! adb server smart-socket protocol
//!
//! Requests are a 4 hex digit length followed by the payload; the server
//! answers `OKAY`, or `FAIL` plus a length-prefixed message. After
//! `host:transport:<serial>` and `tcp:<port>` succeed, the socket is a raw
//! pipe to that port on the device.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

use crate::config::{AdbConfig, TIMING_CONFIG};
use crate::error::{DriverError, Result};

/// Address of an adb server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbHost {
    addr: String,
}

impl AdbHost {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn from_config(config: &AdbConfig) -> Self {
        Self::new(config.server_addr())
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Open a stream to `port` on the device `serial`
    pub async fn create_connection(&self, serial: &str, port: u16) -> Result<TcpStream> {
        let timeout = TIMING_CONFIG.device.command();
        tokio::time::timeout(timeout, self.open_forward(serial, port))
            .await
            .map_err(|_| {
                DriverError::Timeout(format!(
                    "forward to {}:{} timed out after {:?}",
                    serial, port, timeout
                ))
            })?
    }

    async fn open_forward(&self, serial: &str, port: u16) -> Result<TcpStream> {
        let mut stream = TcpStream::connect(&self.addr).await.map_err(|e| {
            DriverError::Transport(format!("connect adb server {}: {}", self.addr, e))
        })?;

        request(&mut stream, &format!("host:transport:{}", serial)).await?;
        request(&mut stream, &format!("tcp:{}", port)).await?;
        Ok(stream)
    }
}

fn encode_message(payload: &str) -> Result<Vec<u8>> {
    let len = u16::try_from(payload.len())
        .map_err(|_| DriverError::Transport(format!("adb request too long: {}", payload.len())))?;
    let mut message = format!("{:04X}", len).into_bytes();
    message.extend_from_slice(payload.as_bytes());
    Ok(message)
}

async fn request<S>(stream: &mut S, payload: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    trace!("adb >> {:?}", payload);
    stream.write_all(&encode_message(payload)?).await?;
    read_status(stream).await
}

async fn read_status<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + Unpin,
{
    let mut status = [0u8; 4];
    stream.read_exact(&mut status).await?;

    match &status {
        b"OKAY" => Ok(()),
        b"FAIL" => {
            let mut len = [0u8; 4];
            stream.read_exact(&mut len).await?;
            let len = std::str::from_utf8(&len)
                .ok()
                .and_then(|s| usize::from_str_radix(s, 16).ok())
                .ok_or_else(|| DriverError::Transport("adb FAIL without length".to_string()))?;

            let mut message = vec![0u8; len];
            stream.read_exact(&mut message).await?;
            Err(DriverError::Transport(format!(
                "adb error: {}",
                String::from_utf8_lossy(&message)
            )))
        }
        other => Err(DriverError::Transport(format!(
            "unexpected adb status {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}
