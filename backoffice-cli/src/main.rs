//! backoffice: command-line front end for the back-office collections.

mod cli;
mod commands;
mod config;
mod error;
mod paths;
mod render;
mod session;

use std::fs;
use std::fs::File;
use std::process::ExitCode;

use backoffice_lib::error::Error as LibError;
use clap::Parser;
use simplelog::Config as LogConfig;
use simplelog::WriteLogger;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::commands::App;
use crate::config::Config;
use crate::error::CliError;
use crate::error::Result;
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    init_logging(&config)?;

    let session_path = paths::session_file().ok_or(CliError::NoHomeDir("the session file"))?;
    let cancel = CancellationToken::new();
    let app = App::new(config, SessionStore::new(session_path), cancel.clone())?;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted");
            interrupt.cancel();
        }
    });

    tokio::select! {
        result = app.run(cli.command) => result,
        _ = cancel.cancelled() => Err(CliError::Backoffice(LibError::Cancelled)),
    }
}

/// Logs to `latest.log` in the cache dir, archiving the previous run.
fn init_logging(config: &Config) -> Result<()> {
    let level = config.level_filter()?;
    let Some(path) = paths::log_file() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| CliError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    paths::rotate_logs();

    let file = File::create(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    if let Err(e) = WriteLogger::init(level, LogConfig::default(), file) {
        eprintln!("warning: logging disabled: {}", e);
    }
    Ok(())
}
