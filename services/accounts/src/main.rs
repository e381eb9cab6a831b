use std::sync::Arc;

use accounts::{
    AppState,
    config::ServerConfig,
    password::CredentialHasher,
    repositories::{PgUserTable, Timeouts, UserRepository, postgres},
    routes,
    session::{SessionCodec, SessionConfig},
};
use anyhow::Result;
use common::database;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting accounts service");

    let server_config = ServerConfig::from_env()?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    postgres::migrate(&pool).await?;
    info!("Database migrations applied");

    let session_config = SessionConfig::from_env()?;
    let session_codec = SessionCodec::new(&session_config.keys, session_config.max_age())?;

    let hasher = CredentialHasher::new(server_config.hash_memory_kib, server_config.hash_iterations)?;
    let user_repository = UserRepository::new(
        Arc::new(PgUserTable::new(pool)),
        hasher,
        Timeouts {
            query: db_config.query_timeout(),
            hash: server_config.hash_timeout(),
        },
    );

    let app_state = AppState {
        user_repository,
        session_codec,
        cookie_secure: session_config.cookie_secure,
    };

    info!("Accounts service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(server_config.bind_addr).await?;
    info!("Accounts service listening on {}", server_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
