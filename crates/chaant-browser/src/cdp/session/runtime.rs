//! JavaScript execution for CDP page session.

use serde_json::{json, Value};

use crate::cdp::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate an expression, awaiting promises, and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Expose `window.<name>(payload)` to page scripts; calls arrive as
    /// `Runtime.bindingCalled` events.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({"name": name})))
            .await?;
        Ok(())
    }

    /// Run `source` in every document loaded from now on.
    pub async fn add_init_script(&self, source: &str) -> Result<(), CdpError> {
        self.call(
            "Page.addScriptToEvaluateOnNewDocument",
            Some(json!({"source": source})),
        )
        .await?;
        Ok(())
    }
}
