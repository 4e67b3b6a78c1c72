//! Catalog of the site's free computer opponents.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use chaant_config::CatalogConfig;
use chaant_protocols::BotProfile;

use crate::error::BrowserError;

#[derive(Debug, Deserialize)]
struct BotEntry {
    username: String,
    #[serde(default)]
    rating: u32,
    #[serde(default)]
    classification: String,
    #[serde(default)]
    is_premium: bool,
}

/// Turn the site's bot personality listing into playable profiles.
///
/// Premium bots are skipped; an empty listing is an error.
pub fn parse_bots(body: &str) -> Result<Vec<BotProfile>, BrowserError> {
    let entries: Vec<BotEntry> =
        serde_json::from_str(body).map_err(|e| BrowserError::Catalog(e.to_string()))?;
    if entries.is_empty() {
        return Err(BrowserError::Catalog("lists of bots are unavailable".to_string()));
    }
    Ok(entries
        .into_iter()
        .filter(|bot| !bot.is_premium)
        .map(|bot| BotProfile::new(bot.username, bot.rating, bot.classification))
        .collect())
}

/// Fetches the bot listing once and serves it from memory afterwards.
pub struct BotCatalog {
    config: CatalogConfig,
    http: reqwest::Client,
    bots: OnceCell<Vec<BotProfile>>,
}

impl BotCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            bots: OnceCell::new(),
        }
    }

    /// Catalog with preloaded entries; nothing is fetched.
    pub fn with_bots(config: CatalogConfig, bots: Vec<BotProfile>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            bots: OnceCell::new_with(Some(bots)),
        }
    }

    pub async fn bots(&self) -> Result<&[BotProfile], BrowserError> {
        let bots = self.bots.get_or_try_init(|| self.fetch()).await?;
        Ok(bots)
    }

    /// Case-insensitive lookup by bot name.
    pub async fn find(&self, name: &str) -> Result<Option<BotProfile>, BrowserError> {
        Ok(self
            .bots()
            .await?
            .iter()
            .find(|bot| bot.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn fetch(&self) -> Result<Vec<BotProfile>, BrowserError> {
        debug!("Fetching bot catalog from {}", self.config.url);
        let body = self
            .http
            .get(&self.config.url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| BrowserError::Catalog(e.to_string()))?
            .text()
            .await
            .map_err(|e| BrowserError::Catalog(e.to_string()))?;
        let bots = parse_bots(&body)?;
        info!("Loaded {} bots", bots.len());
        Ok(bots)
    }
}
