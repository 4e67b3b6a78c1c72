//! Navigation operations for CDP page session.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

impl PageSession {
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }

        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            let state = self.evaluate("document.readyState").await?;
            if matches!(state.as_str(), Some("complete") | Some("interactive")) {
                return Ok(());
            }
            if start.elapsed() > LOAD_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(LOAD_POLL).await;
        }
    }

    pub async fn reload(&self) -> Result<(), CdpError> {
        self.call("Page.reload", None).await?;
        // Let the old document go before polling readyState.
        tokio::time::sleep(LOAD_POLL).await;
        self.wait_for_load().await
    }

    pub async fn url(&self) -> Result<String, CdpError> {
        let url = self.evaluate("location.href").await?;
        Ok(url.as_str().unwrap_or_default().to_string())
    }
}
