//! Page automation primitives.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SurfaceError;

/// Stable identity of a browser page, used for ownership claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an element found on the page.
///
/// Handles are addressed by the selector that found them and their position
/// among its matches, so they survive DOM node id churn but go stale when
/// the match list changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// Viewport coordinates in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A drag: pointer down at `down`, pointer up at `up`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSequence {
    pub down: Point,
    pub up: Point,
}

#[async_trait]
pub trait BrowserSurface: Send + Sync {
    fn page_id(&self) -> PageId;

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError>;

    async fn current_url(&self) -> Result<String, SurfaceError>;

    async fn find_one(&self, selector: &str) -> Result<Option<ElementHandle>, SurfaceError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, SurfaceError>;

    /// Wait until `selector` matches, failing with `Timeout` after `timeout`.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), SurfaceError>;

    async fn element_text(&self, element: &ElementHandle) -> Result<String, SurfaceError>;

    /// Evaluate a script expression and return its JSON value.
    ///
    /// Promises are awaited; a thrown exception is a `Script` error.
    async fn evaluate(&self, script: &str) -> Result<Value, SurfaceError>;

    /// Poll `script` until it yields a truthy value.
    async fn wait_for_function(
        &self,
        script: &str,
        timeout: Duration,
    ) -> Result<Value, SurfaceError>;

    async fn dispatch_pointer(&self, sequence: PointerSequence) -> Result<(), SurfaceError>;

    /// Reload and wait for the new document to load.
    async fn reload(&self) -> Result<(), SurfaceError>;

    async fn close(&self) -> Result<(), SurfaceError>;
}
