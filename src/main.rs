//! Application entry point for the `hydrosync` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the station tables if they do not exist
//! - Building the per-vendor sync runners and starting their schedules
//! - Binding the Axum HTTP server for health, status and manual triggers
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `SYNC_INTERVAL_SECS` (optional) – cycle interval (default: 300)
//! - `SYNC_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `SYNC_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config` for the full list.
use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Result;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use hydrosync::routes::{self, AppState};
use hydrosync::vendors::{AptechClient, HigertechClient};
use hydrosync::{
    config, schema, spawn_schedule, AptechSync, HigertechSync, PgStationStore, SensorKind, Stores,
    SyncRunner, Vendor, VendorRegistry,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let http = reqwest::Client::builder()
        .timeout(cfg.http_timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let stores = Stores {
        water_level: Arc::new(PgStationStore::new(pool.clone(), SensorKind::WaterLevel)),
        rainfall: Arc::new(PgStationStore::new(pool.clone(), SensorKind::Rainfall)),
    };

    let aptech = AptechSync::new(
        AptechClient::new(
            http.clone(),
            cfg.aptech_api_url.clone(),
            cfg.aptech_user.clone(),
            cfg.aptech_pass.clone(),
        ),
        VendorRegistry::builtin(Vendor::Aptech)?,
    );
    let higertech = HigertechSync::new(
        HigertechClient::new(http, cfg.higertech_api_base.clone()),
        VendorRegistry::builtin(Vendor::Higertech)?,
    );

    let runners = vec![
        Arc::new(SyncRunner::new(Box::new(aptech), stores.clone())),
        Arc::new(SyncRunner::new(Box::new(higertech), stores)),
    ];

    for runner in &runners {
        tracing::info!(
            "Scheduling {} sync every {}s",
            runner.vendor(),
            cfg.sync_interval_secs
        );
        spawn_schedule(Arc::clone(runner), cfg.sync_interval());
    }

    let app = routes::router(AppState::new(runners));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `SYNC_LOG_LEVEL` picks the level
/// for this crate while sqlx, hyper and reqwest are held at warn/info, so
/// per-device sync lines are not buried under query and connection
/// chatter. `SYNC_SPAN_EVENTS=full` logs open and close of each
/// `sync_cycle` span.
fn init_tracing() {
    // ---
    let span_events = match env::var("SYNC_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("SYNC_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn,hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
