//! Game setup flows on the site.

use tracing::{debug, info, warn};

use chaant_protocols::{AgentError, BotProfile, Color, ElementHandle, SurfaceError, TimeControl};

use super::AgentInner;
use crate::site;

impl AgentInner {
    pub(super) async fn start_computer_game(
        &self,
        bot: &BotProfile,
        as_black: bool,
    ) -> Result<Color, AgentError> {
        let ui = self.config.ui_timeout();
        self.page.navigate(site::COMPUTER_URL).await?;
        self.close_startup_modals().await?;

        self.page.wait_for(site::BOT_SELECTION, ui).await?;
        self.page.evaluate(site::SCROLL_BOT_LIST).await?;

        debug!("Selecting bot {} in {}", bot.name, bot.selector_group);
        let tile = self.page.wait_for(&site::bot_tile(bot), ui).await?;
        self.page.click(&tile).await?;
        let choose = self.page.wait_for(site::CHOOSE_BUTTON, ui).await?;
        self.page.click(&choose).await?;
        let radio = self.page.wait_for(&site::color_radio(as_black), ui).await?;
        self.page.click(&radio).await?;
        self.page
            .wait_for_function(site::SELECTION_MENU_CLOSED, ui)
            .await?;

        let play_label = self.translated("Play", "Play").await?;
        let play = self.page.wait_for(&site::play_button(&play_label), ui).await?;
        self.page.click(&play).await?;

        self.ensure_playing().await?;
        self.detect_color().await
    }

    pub(super) async fn start_online_game(
        &self,
        time_control: TimeControl,
    ) -> Result<Color, AgentError> {
        let ui = self.config.ui_timeout();
        self.page.navigate(site::ONLINE_URL).await?;
        self.page.wait_for_function(site::TRANSLATIONS_READY, ui).await?;

        let play_label = self.translated("Play", "Play").await?;
        let min_unit = self.translated("min", "min").await?;

        // The preset menu opens from the button showing the current preset.
        self.click_button_matching(&site::ends_with_label(&min_unit))
            .await?;
        self.click_button_matching(&site::exact_label(&time_control.label(&min_unit)))
            .await?;
        self.click_button_matching(&site::ends_with_label(&play_label))
            .await?;

        if self.is_guest().await? {
            match self.page.wait_for(site::GUEST_BUTTON, ui).await {
                Ok(button) => {
                    if let Err(e) = self.page.click(&button).await {
                        warn!("Guest button click failed, ignoring: {}", e);
                    }
                }
                Err(e) => warn!("Guest button not found, ignoring: {}", e),
            }
        }

        self.ensure_playing().await?;
        self.detect_color().await
    }

    /// Click every startup close button, last first, then wait for the modal
    /// layer to empty.
    async fn close_startup_modals(&self) -> Result<(), SurfaceError> {
        let buttons = self.page.find_all(site::CLOSE_BUTTONS).await?;
        for button in buttons.iter().rev() {
            if let Err(e) = self.page.click(button).await {
                debug!("Close button {} not clickable: {}", button.index, e);
            }
        }
        self.page
            .wait_for_function(site::MODALS_CLOSED, self.config.ui_timeout())
            .await?;
        Ok(())
    }

    async fn click_button_matching(&self, pattern: &str) -> Result<(), SurfaceError> {
        let index = self.page.evaluate(&site::button_index(pattern)).await?;
        let index = index
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| SurfaceError::ElementNotFound(format!("button /{}/", pattern)))?;
        self.page
            .click(&ElementHandle::new(site::BUTTONS, index))
            .await
    }

    async fn translated(&self, key: &str, fallback: &str) -> Result<String, SurfaceError> {
        let value = self.page.evaluate(&site::translation(key, fallback)).await?;
        Ok(value
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string())
    }

    async fn is_guest(&self) -> Result<bool, SurfaceError> {
        if self.page.find_one(site::NAV_TOP).await?.is_none() {
            return Ok(false);
        }
        Ok(self.page.find_one(site::LOGIN_LINK).await?.is_some())
    }

    /// The resign or abort control must show up and the board must report a
    /// running game for the logged-in side.
    async fn ensure_playing(&self) -> Result<(), AgentError> {
        let ui = self.config.ui_timeout();
        self.page.wait_for(site::SIDEBAR, ui).await?;
        let resign = self.translated("Resign", "Resign").await?;
        let abort = self.translated("Abort", "Abort").await?;
        self.page
            .wait_for(&site::resign_or_abort(&resign, &abort), ui)
            .await?;

        let active = self.page.evaluate(site::GAME_ACTIVE).await?;
        if active.as_bool() != Some(true) {
            return Err(AgentError::IdleIllegalPlay);
        }
        Ok(())
    }

    async fn detect_color(&self) -> Result<Color, AgentError> {
        let color = self
            .page
            .playing_color()
            .await?
            .ok_or(AgentError::IdleIllegalPlay)?;
        info!("Page {} plays {}", self.page_id, color);
        Ok(color)
    }
}
