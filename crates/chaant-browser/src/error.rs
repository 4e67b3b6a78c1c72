//! Browser launch and catalog errors.

use thiserror::Error;

use chaant_protocols::SurfaceError;

use crate::cdp::CdpError;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Chrome not found. Install Google Chrome or set browser.chrome_path.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Page setup failed: {0}")]
    PageSetup(String),

    #[error("Bot catalog unavailable: {0}")]
    Catalog(String),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) | CdpError::ChromeNotAvailable(msg) => {
                BrowserError::ConnectionFailed(msg)
            }
            other => BrowserError::PageSetup(other.to_string()),
        }
    }
}

impl From<SurfaceError> for BrowserError {
    fn from(e: SurfaceError) -> Self {
        BrowserError::PageSetup(e.to_string())
    }
}
