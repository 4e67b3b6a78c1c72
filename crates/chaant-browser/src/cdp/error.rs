//! CDP error types.

use thiserror::Error;

use chaant_protocols::SurfaceError;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for SurfaceError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::NavigationFailed(msg) => SurfaceError::Navigation(msg),
            CdpError::JavaScript(msg) => SurfaceError::Script(msg),
            CdpError::Timeout(msg) => SurfaceError::Timeout(msg),
            CdpError::SessionClosed => SurfaceError::Closed,
            CdpError::InvalidResponse(msg) => SurfaceError::InvalidData(msg),
            CdpError::Serialization(e) => SurfaceError::InvalidData(e.to_string()),
            other => SurfaceError::Transport(other.to_string()),
        }
    }
}
