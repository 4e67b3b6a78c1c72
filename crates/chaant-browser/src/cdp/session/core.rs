//! Core session struct and CDP command dispatch.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::cdp::client::Transport;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpEvent;

/// A session attached to a single page/target.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    pub(super) transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Events pushed for this page. Fails once the session is closed.
    pub fn events(&self) -> Result<broadcast::Receiver<CdpEvent>, CdpError> {
        self.transport
            .subscribe(&self.session_id)
            .ok_or(CdpError::SessionClosed)
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Close the tab and stop routing its events.
    pub async fn close(&self) -> Result<(), CdpError> {
        let result = self
            .transport
            .call(
                "Target.closeTarget",
                Some(json!({"targetId": self.target_id})),
                None,
            )
            .await;
        self.transport.close_route(&self.session_id);
        result.map(|_| ())
    }
}
