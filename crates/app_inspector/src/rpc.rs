//! One-shot HTTP exchange over an already forwarded device socket
//!
//! The caller owns the stream: it is borrowed for the duration of one
//! request/response and released by the caller on every exit path (dropping a
//! [`crate::device::BoxedStream`] closes the forwarded connection).

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST};
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::{DriverError, Result};

pub use hyper::Method;

fn transport(err: impl std::fmt::Display) -> DriverError {
    DriverError::Transport(err.to_string())
}

/// Send one request to `path` and return the raw response body.
///
/// Fails with `Timeout` when no complete response arrives within `timeout`,
/// `Transport` when the connection breaks and `Protocol` on a non-2xx status.
pub async fn fetch_through_socket<S>(
    stream: &mut S,
    path: &str,
    method: Method,
    json: Option<&serde_json::Value>,
    timeout: Duration,
) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + ?Sized,
{
    let label = format!("{} {}", method, path);
    debug!("socket rpc: {}", label);

    tokio::time::timeout(timeout, exchange(stream, path, method, json))
        .await
        .map_err(|_| DriverError::Timeout(format!("{} timed out after {:?}", label, timeout)))?
}

async fn exchange<S>(
    stream: &mut S,
    path: &str,
    method: Method,
    json: Option<&serde_json::Value>,
) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + ?Sized,
{
    let mut builder = Request::builder()
        .method(method.clone())
        .uri(path)
        .header(HOST, "localhost")
        .header(CONNECTION, "close");

    let body = match json {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Bytes::from(serde_json::to_vec(value)?)
        }
        None => Bytes::new(),
    };
    let request = builder.body(Full::new(body)).map_err(transport)?;

    let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(transport)?;

    let response = async {
        let response = sender.send_request(request).await.map_err(transport)?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(transport)?
            .to_bytes();
        Ok::<_, DriverError>((status, body))
    };

    // The connection has to be driven in the same task as the request.
    let mut conn = std::pin::pin!(conn);
    let mut response = std::pin::pin!(response);
    let (status, body) = tokio::select! {
        result = &mut response => result?,
        conn_result = &mut conn => {
            conn_result.map_err(transport)?;
            response.await?
        }
    };

    if !status.is_success() {
        return Err(DriverError::Protocol(format!(
            "request {} {}, status: {}, body: {}",
            method,
            path,
            status,
            String::from_utf8_lossy(&body)
        )));
    }

    Ok(body.to_vec())
}
