//! chaant - browser-driven chess agent
//!
//! Main entry point for the chaant CLI and control plane server.

mod cli;
mod console;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use chaant_agent::{ChesscomAgent, PageRegistry};
use chaant_api::{AgentHub, ApiServer};
use chaant_browser::{BotCatalog, BrowserLauncher};
use chaant_config::{Config, ConfigLoader, ConfigValidator};
use chaant_protocols::ChessAgent;

use crate::cli::{Cli, Commands};
use crate::console::Console;

/// Initialize tracing with console and daily rolling file output.
///
/// Console output goes to stderr at `console_level` unless `RUST_LOG` says
/// otherwise; the file under `~/.chaant/logs` always records `info`.
fn init_tracing(console_level: &str) -> anyhow::Result<()> {
    let log_dir = ConfigLoader::chaant_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("chaant")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(EnvFilter::new("info")),
        )
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| ConfigLoader::chaant_dir().join("config.toml"));
    let mut config = ConfigLoader::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    if cli.headless {
        config.browser.headless = true;
    }

    let validation = ConfigValidator::validate(&config);
    if cli.strict_config {
        validation.into_strict_result()?;
    } else {
        for warning in validation.into_result()? {
            warn!("Config {}: {}", warning.path, warning.message);
        }
    }
    info!("Configuration loaded from {}", display_path(&path));
    Ok(config)
}

fn display_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (defaults)", path.display())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let console_level = match cli.command {
        Some(Commands::Play) | Some(Commands::Bots { .. }) => "warn",
        _ => "info",
    };
    init_tracing(console_level)?;

    let mut config = load_config(&cli)?;

    match cli.command {
        None => run_server(config).await,
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Some(Commands::Play) => run_console(config).await,
        Some(Commands::Bots { json }) => list_bots(config, json).await,
    }
}

/// Run the control plane until Ctrl-C.
async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Starting chaant v{}", env!("CARGO_PKG_VERSION"));

    let browser = Arc::new(BrowserLauncher::new(config.browser.clone()).launch().await?);
    let catalog = Arc::new(BotCatalog::new(config.catalog.clone()));
    let hub = Arc::new(AgentHub::new(config.clone(), browser.clone(), catalog));
    let server = ApiServer::new(config.server.clone(), hub);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    };
    server.run(shutdown).await.map_err(|e| anyhow!(e))?;

    browser.shutdown().await;
    info!("Server stopped");
    Ok(())
}

/// Play from the console against a bot or online.
async fn run_console(config: Config) -> anyhow::Result<()> {
    let catalog = BotCatalog::new(config.catalog.clone());
    let bots = catalog
        .bots()
        .await
        .context("fetching the bot list")?
        .to_vec();

    let browser = BrowserLauncher::new(config.browser.clone()).launch().await?;
    let page = browser.open_chess_page().await?;
    let registry = PageRegistry::new();
    let agent = Arc::new(ChesscomAgent::attach(
        Arc::new(page),
        &registry,
        config.agent.clone(),
    )?);

    let result = Console::new(agent.clone(), bots).run().await;

    if let Err(e) = agent.dispose().await {
        warn!("Failed to close the game page: {}", e);
    }
    browser.shutdown().await;
    result
}

async fn list_bots(config: Config, json: bool) -> anyhow::Result<()> {
    let catalog = BotCatalog::new(config.catalog.clone());
    let bots = catalog.bots().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(bots)?);
        return Ok(());
    }

    println!("{:<4} {:<24} {:>6}  {}", "#", "NAME", "RATING", "GROUP");
    for (idx, bot) in bots.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:>6}  {}",
            idx + 1,
            bot.name,
            bot.elo,
            bot.selector_group
        );
    }
    Ok(())
}
