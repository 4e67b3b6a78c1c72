//! Chrome discovery, launch and connection.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

use chaant_config::{BrowserConfig, ConfigLoader};

use crate::cdp::CdpClient;
use crate::error::BrowserError;
use crate::page::CdpChessPage;

const LAUNCH_POLL: Duration = Duration::from_millis(200);

/// Starts (or reuses) a Chrome instance with remote debugging enabled.
pub struct BrowserLauncher {
    config: BrowserConfig,
}

impl BrowserLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.config.debug_port)
    }

    fn profile_dir(&self) -> PathBuf {
        match &self.config.profile_dir {
            Some(dir) => ConfigLoader::expand_path(dir),
            None => ConfigLoader::chaant_dir().join("browser-profile"),
        }
    }

    /// Chrome binary: the configured path, else the first well-known location.
    pub fn find_chrome(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.chrome_path {
            let p = ConfigLoader::expand_path(path);
            return p.exists().then_some(p);
        }

        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ]
        } else if cfg!(target_os = "windows") {
            &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ]
        } else {
            &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ]
        };
        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// Command-line flags for a launched Chrome.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.config.debug_port),
            format!("--user-data-dir={}", self.profile_dir().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
        ];
        if self.config.start_maximized {
            args.push("--start-maximized".to_string());
        }
        if self.config.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    async fn is_running(&self) -> bool {
        reqwest::get(format!("{}/json/version", self.endpoint()))
            .await
            .is_ok()
    }

    fn spawn_chrome(&self) -> Result<Child, BrowserError> {
        let chrome = self.find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.profile_dir();
        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!("Launching Chrome with profile at: {}", profile_dir.display());
        let child = Command::new(&chrome)
            .args(self.launch_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to Chrome on the debug port, launching it if nothing answers.
    pub async fn launch(&self) -> Result<Browser, BrowserError> {
        let mut process = None;
        if self.is_running().await {
            info!("Chrome already running on port {}", self.config.debug_port);
        } else {
            info!(
                "Chrome not running on port {}, launching...",
                self.config.debug_port
            );
            process = Some(self.spawn_chrome()?);

            let deadline = Instant::now() + Duration::from_secs(self.config.launch_timeout_secs);
            loop {
                tokio::time::sleep(LAUNCH_POLL).await;
                if self.is_running().await {
                    break;
                }
                if Instant::now() >= deadline {
                    return Err(BrowserError::LaunchFailed(
                        "Chrome failed to start within timeout".to_string(),
                    ));
                }
            }
        }

        let client = CdpClient::connect(&self.endpoint()).await?;
        info!("Connected to Chrome at {}", self.endpoint());
        Ok(Browser {
            client: Arc::new(client),
            process: Mutex::new(process),
        })
    }
}

/// A connected Chrome. Pages opened from it stay usable while it lives.
pub struct Browser {
    client: Arc<CdpClient>,
    process: Mutex<Option<Child>>,
}

impl Browser {
    /// Open a fresh tab ready to drive a chess game.
    pub async fn open_chess_page(&self) -> Result<CdpChessPage, BrowserError> {
        let session = self.client.new_page(Some("about:blank")).await?;
        Ok(CdpChessPage::new(session).await?)
    }

    pub fn client(&self) -> &Arc<CdpClient> {
        &self.client
    }

    /// Kill Chrome if this process launched it.
    pub async fn shutdown(&self) {
        if let Some(mut child) = self.process.lock().await.take() {
            info!("Shutting down Chrome...");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop Chrome: {}", e);
            }
        }
    }
}
