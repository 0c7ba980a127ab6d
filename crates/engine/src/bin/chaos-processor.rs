//! chaos-processor — background chaos engine.
//!
//! Resolves database and platform credentials once at startup, then ticks
//! forever: every bound application that is due gets claimed, rolled and,
//! if the dice agree and the app is healthy, loses one instance.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use havoc_core::config::{load_dotenv, Config};
use havoc_engine::ChaosScheduler;
use havoc_platform::CloudFoundryClient;
use havoc_store::PgStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Periodically terminate instances of registered applications.
#[derive(Parser, Debug)]
#[command(name = "chaos-processor", version, about)]
struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "HAVOC_PROFILE", default_value = "")]
    profile: String,

    /// Seconds between ticks (overrides TICK_INTERVAL_SECS).
    #[arg(long)]
    tick_interval: Option<u64>,

    /// Timeout in seconds for each platform call (overrides UNIT_TIMEOUT_SECS).
    #[arg(long)]
    unit_timeout: Option<u64>,

    /// Run a single tick and exit.
    #[arg(long)]
    once: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::for_profile(&cli.profile);
    if let Some(secs) = cli.tick_interval {
        config.engine.tick_interval_secs = secs;
    }
    if let Some(secs) = cli.unit_timeout {
        config.engine.unit_timeout_secs = secs;
    }
    config.log_summary();

    if !config.database.is_configured() {
        anyhow::bail!(
            "no database credentials: bind the chaos-galago-db service or set PG_USERNAME"
        );
    }

    let store = Arc::new(PgStore::connect(&config.database).await?);
    let platform = Arc::new(CloudFoundryClient::new(&config.platform)?);
    let mut scheduler = ChaosScheduler::new(store, platform, &config.engine);

    if cli.once {
        let report = scheduler.run_tick().await?;
        info!(%report, "single tick finished");
        return Ok(());
    }

    let interval: Duration = config.engine.tick_interval();
    scheduler.run_forever(interval).await;
    Ok(())
}
