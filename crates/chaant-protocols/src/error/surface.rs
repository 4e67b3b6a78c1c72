//! Browser surface (transport) errors.

use thiserror::Error;

/// Failure of a page-level operation.
///
/// Every variant is transport class: an agent that sees one of these can no
/// longer trust its view of the page.
#[derive(Debug, Clone, Error)]
pub enum SurfaceError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unexpected page data: {0}")]
    InvalidData(String),

    #[error("Page closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}
