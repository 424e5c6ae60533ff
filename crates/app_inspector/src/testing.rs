//! In-memory device used by the driver and registry tests

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use image::{DynamicImage, Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use crate::device::{BoxedStream, DeviceConnection, ShellOutput};
use crate::error::{DriverError, Result};
use crate::model::{CurrentApp, WindowSize};

pub(crate) type Handler = Arc<dyn Fn(Method, String, Bytes) -> Response<Full<Bytes>> + Send + Sync>;

pub(crate) fn ok_body(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::new(Full::new(body.into()))
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

/// Forwarded stream that counts its own release
struct TrackedStream {
    inner: DuplexStream,
    closed: Arc<AtomicUsize>,
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

pub(crate) struct FakeDevice {
    pub serial: String,
    pub size: WindowSize,
    pub backends: HashMap<u16, Handler>,
    /// Ports that accept connections but never answer
    pub silent_ports: Vec<u16>,
    pub native_dump: Option<String>,
    pub screencap_works: bool,
    pub installed: Vec<String>,
    pub io_calls: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub keyevents: Mutex<Vec<String>>,
    parked: Mutex<Vec<DuplexStream>>,
}

impl FakeDevice {
    pub fn new(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            size: WindowSize {
                width: 1000,
                height: 2000,
            },
            backends: HashMap::new(),
            silent_ports: Vec::new(),
            native_dump: None,
            screencap_works: true,
            installed: Vec::new(),
            io_calls: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            keyevents: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
        }
    }

    pub fn with_backend<F>(mut self, port: u16, handler: F) -> Self
    where
        F: Fn(Method, String, Bytes) -> Response<Full<Bytes>> + Send + Sync + 'static,
    {
        self.backends.insert(port, Arc::new(handler));
        self
    }

    pub fn io_calls(&self) -> usize {
        self.io_calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.io_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn track(&self, inner: DuplexStream) -> BoxedStream {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(TrackedStream {
            inner,
            closed: self.closed.clone(),
        })
    }
}

#[async_trait]
impl DeviceConnection for FakeDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    async fn screenshot(&self) -> Result<DynamicImage> {
        self.touch();
        if !self.screencap_works {
            return Err(DriverError::Transport("screencap: device offline".to_string()));
        }
        Ok(image::load_from_memory(&png_bytes(4, 8))?)
    }

    async fn create_connection(&self, port: u16) -> Result<BoxedStream> {
        self.touch();
        if self.silent_ports.contains(&port) {
            let (client, server) = tokio::io::duplex(64 * 1024);
            self.parked.lock().push(server);
            return Ok(self.track(client));
        }

        let handler = self
            .backends
            .get(&port)
            .cloned()
            .ok_or_else(|| DriverError::Transport(format!("tcp:{} connection refused", port)))?;

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let handler = handler.clone();
                async move {
                    let (parts, body) = req.into_parts();
                    let bytes = body.collect().await?.to_bytes();
                    Ok::<_, hyper::Error>(handler(
                        parts.method,
                        parts.uri.path().to_string(),
                        bytes,
                    ))
                }
            });
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(server), service)
                .await;
        });
        Ok(self.track(client))
    }

    async fn shell(&self, command: &str, _timeout: Duration) -> Result<ShellOutput> {
        self.touch();
        let (exit_code, output) = match command {
            "echo ok" => (0, "ok".to_string()),
            "false" => (1, "boom".to_string()),
            "offline" => return Err(DriverError::Transport("device offline".to_string())),
            cmd if cmd.starts_with("pm path ") => {
                let package = &cmd["pm path ".len()..];
                if self.installed.iter().any(|p| p == package) {
                    (0, format!("package:/data/app/{}/base.apk", package))
                } else {
                    (1, String::new())
                }
            }
            _ => (127, format!("/system/bin/sh: {}: not found", command)),
        };
        Ok(ShellOutput { exit_code, output })
    }

    async fn dump_hierarchy(&self) -> Result<String> {
        self.touch();
        self.native_dump
            .clone()
            .ok_or_else(|| DriverError::Protocol("ERROR: could not get idle state.".to_string()))
    }

    async fn window_size(&self) -> Result<WindowSize> {
        self.touch();
        Ok(self.size)
    }

    async fn tap(&self, _x: i32, _y: i32) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn keyevent(&self, key: &str) -> Result<()> {
        self.touch();
        self.keyevents.lock().push(key.to_string());
        Ok(())
    }

    async fn install(&self, _apk_path: &str) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn is_package_installed(&self, package: &str) -> Result<bool> {
        self.touch();
        Ok(self.installed.iter().any(|p| p == package))
    }

    async fn app_start(&self, _package: &str) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn app_stop(&self, _package: &str) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn app_current(&self) -> Result<CurrentApp> {
        self.touch();
        Ok(CurrentApp {
            package: "com.android.settings".to_string(),
            activity: ".Settings".to_string(),
            pid: Some(4242),
        })
    }
}
