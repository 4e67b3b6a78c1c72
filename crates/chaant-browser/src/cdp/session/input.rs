//! Mouse input for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{MouseButton, MouseEventType};

use super::core::PageSession;

impl PageSession {
    async fn mouse(
        &self,
        kind: MouseEventType,
        x: f64,
        y: f64,
        button: MouseButton,
    ) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": kind,
                "x": x,
                "y": y,
                "button": button,
                "clickCount": 1,
            })),
        )
        .await?;
        Ok(())
    }

    /// Press at one point, move and release at another.
    pub async fn drag(&self, from: (f64, f64), to: (f64, f64)) -> Result<(), CdpError> {
        self.mouse(MouseEventType::MouseMoved, from.0, from.1, MouseButton::None)
            .await?;
        self.mouse(MouseEventType::MousePressed, from.0, from.1, MouseButton::Left)
            .await?;
        self.mouse(MouseEventType::MouseMoved, to.0, to.1, MouseButton::Left)
            .await?;
        self.mouse(MouseEventType::MouseReleased, to.0, to.1, MouseButton::Left)
            .await?;
        debug!("Dragged ({}, {}) -> ({}, {})", from.0, from.1, to.0, to.1);
        Ok(())
    }
}
