//! Passage API server binary.
//!
//! Loads configuration, connects to PostgreSQL, runs migrations and serves
//! the HTTP API. `promote <email>` grants the admin role instead of serving.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use passage_api::config::ApiConfig;
use passage_core::auth::provider::GoogleProvider;
use passage_core::auth::queries::PgUserStore;
use passage_core::auth::store::UserStore;
use passage_core::models::auth::Role;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "passage_server", about = "Passage API server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// PostgreSQL connection URL. Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Grant the admin role to an existing user.
    Promote {
        /// Email of the user to promote.
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passage_api=debug,passage_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Missing secrets stop the process before anything is served.
    let mut config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            return Err(e.into());
        }
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }

    info!(max_connections = args.max_connections, "configuring connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    passage_api::migrate(&pool).await?;

    let store = Arc::new(PgUserStore::new(pool));

    match args.command.unwrap_or(Command::Serve) {
        Command::Promote { email } => {
            if store.set_role(&email, Role::Admin).await? {
                info!(%email, "user promoted to admin");
                Ok(())
            } else {
                error!(%email, "no such user");
                Err(format!("no user with email {email}").into())
            }
        }
        Command::Serve => serve(config, store).await,
    }
}

async fn serve(config: ApiConfig, store: Arc<PgUserStore>) -> Result<(), Box<dyn std::error::Error>> {
    let provider = Arc::new(GoogleProvider::new(config.provider.clone())?);
    let state = passage_api::AppState::new(config.clone(), store, provider)?;
    let app = passage_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!("failed to listen for shutdown signal: {e}"),
            }
        })
        .await?;

    Ok(())
}
