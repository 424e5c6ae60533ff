//! REST façade over the driver registry

use app_inspector::{DeviceInfo, DriverError, DriverRegistry, Hierarchy, ShellResponse};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{error, info};

#[derive(Clone)]
pub struct ServeState {
    registry: &'static DriverRegistry,
}

impl ServeState {
    pub fn new(registry: &'static DriverRegistry) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShellRequest {
    pub command: String,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    version: &'static str,
    description: &'static str,
    platform: &'static str,
    code_language: &'static str,
}

/// Driver failure mapped to an HTTP status
pub struct ApiError(DriverError);

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            DriverError::UnsupportedDisplay(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(err = %self.0, "request failed");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.0.to_string(),
        )
            .into_response()
    }
}

pub fn router(state: ServeState) -> Router {
    Router::new()
        .route("/info", get(info_handler))
        .route("/list/android", get(list_handler))
        .route("/android/:serial/shell", post(shell_handler))
        .route("/android/:serial/screenshot/:id", get(screenshot_handler))
        .route("/android/:serial/hierarchy", get(hierarchy_handler))
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: ServeState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn info_handler() -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        description: "Android UI hierarchy and screenshot inspector",
        platform: std::env::consts::OS,
        code_language: "Rust",
    })
}

async fn list_handler(State(state): State<ServeState>) -> Result<Json<Vec<DeviceInfo>>, ApiError> {
    Ok(Json(state.registry.list_devices().await?))
}

async fn shell_handler(
    State(state): State<ServeState>,
    Path(serial): Path<String>,
    Json(request): Json<ShellRequest>,
) -> Json<ShellResponse> {
    let driver = state.registry.get_driver(&serial);
    Json(driver.shell(&request.command).await)
}

async fn screenshot_handler(
    State(state): State<ServeState>,
    Path((serial, id)): Path<(String, u32)>,
) -> Result<Response, ApiError> {
    let driver = state.registry.get_driver(&serial);
    let img = driver.screenshot(id).await?;

    let mut buffer = Vec::new();
    img.to_rgb8()
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .map_err(DriverError::from)?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], buffer).into_response())
}

async fn hierarchy_handler(
    State(state): State<ServeState>,
    Path(serial): Path<String>,
) -> Result<Json<Hierarchy>, ApiError> {
    let driver = state.registry.get_driver(&serial);
    Ok(Json(driver.dump_hierarchy().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_inspector::{
        AndroidDriver, BoxedStream, CurrentApp, DeviceConnection, DeviceDriver, DeviceKind,
        Result, ShellOutput, WindowSize,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use image::{DynamicImage, RgbImage};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Device with a working screencap and shell and no reachable backends
    struct StubDevice {
        serial: String,
    }

    fn offline() -> DriverError {
        DriverError::Transport("connection refused".to_string())
    }

    #[async_trait]
    impl DeviceConnection for StubDevice {
        fn serial(&self) -> &str {
            &self.serial
        }

        async fn screenshot(&self) -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgb8(RgbImage::new(4, 8)))
        }

        async fn create_connection(&self, _port: u16) -> Result<BoxedStream> {
            Err(offline())
        }

        async fn shell(&self, command: &str, _timeout: Duration) -> Result<ShellOutput> {
            Ok(ShellOutput {
                exit_code: 0,
                output: format!("ran {}", command),
            })
        }

        async fn dump_hierarchy(&self) -> Result<String> {
            Err(offline())
        }

        async fn window_size(&self) -> Result<WindowSize> {
            WindowSize::new(1080, 2400)
        }

        async fn tap(&self, _x: i32, _y: i32) -> Result<()> {
            Ok(())
        }

        async fn keyevent(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn install(&self, _apk_path: &str) -> Result<()> {
            Err(offline())
        }

        async fn is_package_installed(&self, _package: &str) -> Result<bool> {
            Ok(false)
        }

        async fn app_start(&self, _package: &str) -> Result<()> {
            Ok(())
        }

        async fn app_stop(&self, _package: &str) -> Result<()> {
            Ok(())
        }

        async fn app_current(&self) -> Result<CurrentApp> {
            Err(offline())
        }
    }

    fn app() -> Router {
        let registry = DriverRegistry::with_factory(DeviceKind::Android, |serial| {
            DeviceDriver::Android(AndroidDriver::new(Arc::new(StubDevice {
                serial: serial.to_string(),
            })))
        });
        router(ServeState::new(Box::leak(Box::new(registry))))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_info() {
        let response = app()
            .oneshot(Request::get("/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["code_language"], "Rust");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_screenshot_is_jpeg() {
        let response = app()
            .oneshot(
                Request::get("/android/emulator-5554/screenshot/0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

        let bytes = body_bytes(response).await;
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_unsupported_display_is_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/android/emulator-5554/screenshot/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shell_folds_into_response() {
        let response = app()
            .oneshot(
                Request::post("/android/emulator-5554/shell")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"command":"getprop ro.product.model"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["output"], "ran getprop ro.product.model");
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    async fn test_hierarchy_failure_is_server_error() {
        let response = app()
            .oneshot(
                Request::get("/android/emulator-5554/hierarchy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
