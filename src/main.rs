use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod clock;
mod commands;
mod config;
mod controllers;
mod error;
mod keys;
mod models;
mod pages;
mod storage;
mod types;

use clock::{SharedClock, SystemClock};
use crate::config::{Config, StorageKind};
pub(crate) use error::{ApiError, ApiResult};
use pages::Pages;
use storage::{AnyStorage, MemoryStorage};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file. Defaults to `config.toml` in the platform
    /// config directory, if it exists.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
}

/// Everything a request handler needs.
#[derive(Clone, FromRef)]
pub struct App {
    pub config: Config,
    pub storage: AnyStorage,
    pub clock: SharedClock,
    pub pages: Pages,
}

impl App {
    pub fn new(config: Config, clock: SharedClock) -> anyhow::Result<Self> {
        let storage = match config.storage.kind {
            StorageKind::Memory => MemoryStorage::new().into(),
        };

        Ok(App {
            config,
            storage,
            clock,
            pages: Pages::load().context("failed to load page templates")?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;

    if config.test_mode {
        warn!("test mode is enabled, the x-test-now-ms header will be honoured");
    }

    let app = App::new(config, Arc::new(SystemClock))?;

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
    }
}
