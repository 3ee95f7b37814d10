//! Pairly API server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// Read notifications older than this are swept from the log.
const NOTIFICATION_RETENTION_DAYS: i32 = 30;

/// How often the retention sweep runs.
const RETENTION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "pairly_api_server", about = "Pairly API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/pairly"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pairly_api=debug,pairly_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(bind_addr = %args.bind_addr, "starting pairly_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    pairly_api::migrate(&pool).await?;

    let mut config = pairly_api::config::ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;

    let state = pairly_api::AppState::new(pool.clone(), config.clone());

    // Ephemeral stores evict expired entries in the background.
    let _ = state.handoff.spawn_cleanup_task();
    let _ = state.sessions.spawn_cleanup_task();

    // Periodic retention sweep over the notification log.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match pairly_core::notify::queries::purge_read_older_than(
                &pool,
                NOTIFICATION_RETENTION_DAYS,
            )
            .await
            {
                Ok(0) => {}
                Ok(removed) => info!(removed, "swept read notifications"),
                Err(e) => warn!(error = %e, "notification retention sweep failed"),
            }
        }
    });

    let app = pairly_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
