/// Error types for driver operations
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid window size: {width}x{height}")]
    InvalidWindowSize { width: u32, height: u32 },

    #[error("Unsupported display: {0} (only display 0 is supported)")]
    UnsupportedDisplay(u32),

    #[error("Failed to dump hierarchy: {0}")]
    AllStrategiesFailed(String),

    #[error("Debug transport error: {0}")]
    DebugTransport(String),

    #[error("App not installed: {0}")]
    AppNotInstalled(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverError {
    /// Whether a hierarchy strategy failing with this error should hand over to the next one.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DriverError::Transport(_)
                | DriverError::Protocol(_)
                | DriverError::Timeout(_)
                | DriverError::DebugTransport(_)
        )
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::TimedOut {
            DriverError::Timeout(err.to_string())
        } else {
            DriverError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
