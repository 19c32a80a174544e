//! # Asset App
//!
//! Interactive client for the asset-management program.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG` wins over `--log-level`)
//! 2. Load configuration (file, then `ASSET_*` environment, then flags)
//! 3. Register identities and load the asset catalog
//! 4. Read commands from stdin until `exit` or end of input

use std::path::PathBuf;

use anyhow::{Context, Result};
use app_runtime::{execute, AppConfig, AppRuntime, Command, Outcome, HELP};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Interactive client for the asset-management program
#[derive(Parser, Debug)]
#[command(name = "asset-app")]
#[command(about = "Deploy the asset-management program and transfer asset ownership")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ASSET_CONFIG")]
    config: Option<PathBuf>,

    /// Acting role (overrides the configured user)
    #[arg(short, long)]
    user: Option<String>,

    /// Start with confidential transactions enabled
    #[arg(long)]
    confidential: bool,

    /// Use the in-memory ledger instead of a peer
    #[arg(long)]
    offline: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env()?;

    if let Some(user) = &args.user {
        config.user = user.clone();
    }
    if args.confidential {
        config.security.confidentiality = true;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args).context("failed to load configuration")?;
    let runtime =
        AppRuntime::bootstrap(&config, args.offline).context("failed to start client")?;
    info!(user = %config.user, offline = args.offline, "Client ready");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{HELP}\n").as_bytes()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!(input = %line.trim(), "{e}");
                continue;
            }
        };

        match execute(&runtime, command).await {
            Ok(Outcome::Output(text)) => stdout.write_all(format!("{text}\n").as_bytes()).await?,
            Ok(Outcome::Exit) => break,
            Err(e) => error!("{:#}", anyhow::Error::new(e)),
        }
    }

    info!("Shutdown complete");
    Ok(())
}
