//! chaos-broker: provisioning API for chaos registrations.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use havoc_broker::catalog::Catalog;
use havoc_broker::{build_router, BrokerState};
use havoc_core::config::{load_dotenv, Config};
use havoc_store::PgStore;

/// Serve the marketplace broker endpoints and the settings dashboard.
#[derive(Parser, Debug)]
#[command(name = "chaos-broker", version, about)]
struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "HAVOC_PROFILE", default_value = "")]
    profile: String,

    /// Bind address (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT).
    #[arg(long)]
    port: Option<u16>,
}

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
    if let Some(host) = cli.host {
        config.broker.host = host;
    }
    if let Some(port) = cli.port {
        config.broker.port = port;
    }
    config.log_summary();

    if !config.database.is_configured() {
        anyhow::bail!(
            "no database credentials: bind the chaos-galago-db service or set PG_USERNAME"
        );
    }

    let catalog = Catalog::load(config.broker.catalog_path.as_deref())?;
    let store = Arc::new(PgStore::connect(&config.database).await?);
    let addr = format!("{}:{}", config.broker.host, config.broker.port);

    let state = Arc::new(BrokerState {
        store,
        config: config.broker,
        catalog,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "chaos-broker listening");
    axum::serve(listener, app).await?;
    Ok(())
}
