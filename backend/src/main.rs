//! Wine lots storefront - backend server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use winelots_backend::{
    config::{Config, StoreBackend},
    create_app,
    external::{LogMailer, Mailer, SmtpMailer},
    repository::{InMemoryStore, PgStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "winelots_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Wine Lots Server");
    tracing::info!("Environment: {}", config.environment);

    let mailer: Arc<dyn Mailer> = match config.mail.smtp_host.as_deref() {
        Some(host) => {
            tracing::info!(smtp_host = host, "Sending mail through SMTP relay");
            Arc::new(SmtpMailer::new(&config.mail, host)?)
        }
        None => {
            tracing::warn!("No SMTP host configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            let store = Arc::new(PgStore::new(db_pool));
            AppState::new(store.clone(), store, mailer, config.clone())
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            AppState::in_memory(InMemoryStore::new(), mailer, config.clone())
        }
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
