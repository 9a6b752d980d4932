mod error;
mod params;
mod routes;
mod state;

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use hotspot_analytics::Engine;
use hotspot_cache::Cache;
use hotspot_scheduler::Scheduler;
use hotspot_store::Store;

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "hotspot-server")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: String,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    database_max_connections: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hotspot=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(cli.database_max_connections)
        .connect(&cli.database_url)
        .await?;

    let store = Store::new(pool);
    store.run_migrations().await?;

    let cache = Arc::new(Cache::new());
    let engine = Arc::new(Engine::new(store.clone(), Arc::clone(&cache)));
    let scheduler = Arc::new(Scheduler::new(store.clone(), Arc::clone(&cache)));

    let state = AppState {
        store,
        engine,
        scheduler,
    };

    let app = routes::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&cli.listen_addr).await?;
    tracing::info!(addr = %cli.listen_addr, "hotspot-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
