use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use homecare_core::config::HomecareConfig;
use tracing::info;

mod app;
mod auth;
mod error;
mod http;
mod service;

/// HTTP gateway for the homecare scheduler.
#[derive(Debug, Parser)]
#[command(name = "homecare-gateway", version)]
struct Args {
    /// Path to a TOML config file (falls back to HOMECARE_CONFIG).
    #[arg(long)]
    config: Option<String>,

    /// Override `gateway.port` from the config.
    #[arg(long)]
    port: Option<u16>,
}

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homecare_gateway=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();

    // config: --config > HOMECARE_CONFIG > ~/.homecare/homecare.toml
    let config_path = args
        .config
        .or_else(|| std::env::var("HOMECARE_CONFIG").ok());
    let mut config = HomecareConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        HomecareConfig::default()
    });
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    let db_path = config.database.path.clone();
    info!(path = %db_path, "opening SQLite database");

    // records and accounts share one file but hold separate connections
    let records = homecare_records::RecordStore::open(&db_path)?;
    let users = homecare_users::UserDirectory::new(rusqlite::Connection::open(&db_path)?)?;
    let seeded = users.seed(&config.auth.seed_users)?;
    info!(seeded, "database ready");

    let service = service::HomecareService::new(records, users, &config);
    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(&config, service));
    let router = app::build_router(state.clone());

    // sweep expired sessions in the background
    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper.sessions.purge_expired();
        }
    });

    info!("Homecare gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}
