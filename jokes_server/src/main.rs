//! Jokes site login server.
//!
//! Serves the login/register form action with PostgreSQL-backed users and
//! sessions, or with in-memory stores for local runs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use chrono::Duration;
use jokes::{
    action::LoginAction,
    auth::AuthManager,
    db::{
        Database, MemorySessionRepository, MemoryUserRepository, PgSessionRepository,
        PgUserRepository, SessionRepository, UserRepository,
    },
    session::{SessionConfig, SessionManager},
};
use jokes_server::{
    api,
    config::{Overrides, ServerConfig},
    logging, metrics,
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the jokes login server

USAGE:
  jokes_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --in-memory              Keep users and sessions in memory
  -h, --help               Print help information

ENVIRONMENT:
  SESSION_SECRET           Cookie signing secret (required, 32+ characters)
  PASSWORD_PEPPER          Password hashing pepper (required, 16+ characters)
  SESSION_COOKIE_SECURE    Mark the session cookie Secure [default: false]
  SESSION_MAX_AGE_DAYS     Session lifetime in days, at most 3650 [default: 30]
  SESSION_PURGE_INTERVAL_SECS  Expired session sweep period [default: 3600]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (users, sessions, database) = if config.in_memory {
        info!("Using in-memory user and session stores");
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
        let sessions: Arc<dyn SessionRepository> = Arc::new(MemorySessionRepository::new());
        (users, sessions, None)
    } else {
        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .context("Failed to connect to database")?;
        info!("Database connected successfully");
        let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.pool().clone()));
        let sessions: Arc<dyn SessionRepository> =
            Arc::new(PgSessionRepository::new(db.pool().clone()));
        (users, sessions, Some(db))
    };

    let max_age = Duration::try_days(config.session.max_age_days)
        .context("SESSION_MAX_AGE_DAYS is out of range")?;
    let session_config = SessionConfig {
        secure: config.session.cookie_secure,
        max_age,
        ..SessionConfig::new(config.security.session_secret.clone())
    };
    let session_manager = Arc::new(SessionManager::new(sessions, session_config)?);
    let purge = tokio::spawn(session_manager.clone().run_purge(
        std::time::Duration::from_secs(config.session.purge_interval_secs),
    ));
    let auth_manager = Arc::new(AuthManager::new(
        users.clone(),
        config.security.password_pepper.clone(),
    ));

    let state = api::AppState {
        login_action: Arc::new(LoginAction::new(
            auth_manager,
            users.clone(),
            session_manager.clone(),
        )),
        sessions: session_manager,
        users,
        database: database.clone(),
    };

    let app = api::create_router(state);

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    purge.abort();
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
