//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub collective: CollectiveConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Control plane server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8123
}

/// Chrome launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Explicit Chrome binary; searched in well-known locations when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,

    /// Profile directory, keeps the site login between runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<String>,

    #[serde(default = "default_true")]
    pub start_maximized: bool,

    /// Seconds to wait for a launched Chrome to accept connections.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            chrome_path: None,
            profile_dir: None,
            start_maximized: true,
            launch_timeout_secs: default_launch_timeout(),
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_true() -> bool {
    true
}

fn default_launch_timeout() -> u64 {
    6
}

/// Agent turn and move timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard ceiling for a turn wait or a move confirmation.
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_secs: u64,

    /// Interval at which waits re-read state directly from the page.
    #[serde(default = "default_settle_interval")]
    pub settle_interval_ms: u64,

    /// Window for the page to accept a dragged move.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_ms: u64,

    /// Added to the confirm window when promoting.
    #[serde(default = "default_promotion_extra")]
    pub promotion_extra_ms: u64,

    /// Page reloads attempted when a move is not confirmed.
    #[serde(default = "default_reload_retries")]
    pub reload_retries: u32,

    /// Timeout for site UI elements during game setup.
    #[serde(default = "default_ui_timeout")]
    pub ui_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout(),
            settle_interval_ms: default_settle_interval(),
            confirm_timeout_ms: default_confirm_timeout(),
            promotion_extra_ms: default_promotion_extra(),
            reload_retries: default_reload_retries(),
            ui_timeout_ms: default_ui_timeout(),
        }
    }
}

impl AgentConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    /// Confirmation window for a move, longer when a promotion piece is picked.
    pub fn confirm_timeout(&self, promoting: bool) -> Duration {
        let extra = if promoting {
            self.promotion_extra_ms
        } else {
            0
        };
        Duration::from_millis(self.confirm_timeout_ms + extra)
    }

    pub fn ui_timeout(&self) -> Duration {
        Duration::from_millis(self.ui_timeout_ms)
    }
}

fn default_turn_timeout() -> u64 {
    240
}

fn default_settle_interval() -> u64 {
    5000
}

fn default_confirm_timeout() -> u64 {
    5000
}

fn default_promotion_extra() -> u64 {
    1000
}

fn default_reload_retries() -> u32 {
    1
}

fn default_ui_timeout() -> u64 {
    10200
}

/// Collective (voted) move configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiveConfig {
    /// Lower bound of the per-cycle commit delay.
    #[serde(default = "default_min_window")]
    pub min_window_ms: u64,

    /// Upper bound of the per-cycle commit delay.
    #[serde(default = "default_max_window")]
    pub max_window_ms: u64,

    /// Accepted votes that trigger an immediate commit.
    #[serde(default = "default_max_votes")]
    pub max_votes: u32,
}

impl Default for CollectiveConfig {
    fn default() -> Self {
        Self {
            min_window_ms: default_min_window(),
            max_window_ms: default_max_window(),
            max_votes: default_max_votes(),
        }
    }
}

impl CollectiveConfig {
    pub fn min_window(&self) -> Duration {
        Duration::from_millis(self.min_window_ms)
    }

    pub fn max_window(&self) -> Duration {
        Duration::from_millis(self.max_window_ms)
    }
}

fn default_min_window() -> u64 {
    3000
}

fn default_max_window() -> u64 {
    8000
}

fn default_max_votes() -> u32 {
    10
}

/// Bot catalog source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://www.chess.com/callback/bot-personalities".to_string()
}

fn default_catalog_timeout() -> u64 {
    15
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
