//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        BroadcastInvalidator, CodeMailer, DbAdapter, FsObjectStorage, InMemoryStore, LogMailer,
        PgIdentityAdapter, SmtpMailer,
    },
    config::{Config, StoreBackend},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use studio_core::ports::{DatabaseService, IdentityService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    let otp_ttl = Duration::minutes(config.otp_ttl_minutes);
    let session_ttl = Duration::days(config.session_ttl_days);

    // --- 2. Build the Store Adapters ---
    let (db, identity): (Arc<dyn DatabaseService>, Arc<dyn IdentityService>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| ApiError::Internal("DATABASE_URL is required".to_string()))?;
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");

                let mailer: Arc<dyn CodeMailer> = match &config.smtp {
                    Some(smtp) => Arc::new(
                        SmtpMailer::new(smtp, config.otp_ttl_minutes)
                            .map_err(|e| ApiError::Internal(e.to_string()))?,
                    ),
                    None => {
                        info!("SMTP_HOST not set; sign-in codes will be logged");
                        Arc::new(LogMailer)
                    }
                };
                let identity: Arc<dyn IdentityService> = Arc::new(PgIdentityAdapter::new(
                    db_pool,
                    mailer,
                    otp_ttl,
                    session_ttl,
                ));
                let db: Arc<dyn DatabaseService> = db_adapter;
                (db, identity)
            }
            StoreBackend::Memory => {
                info!("Using the in-memory store; data is lost on restart");
                let store = Arc::new(InMemoryStore::new(
                    otp_ttl,
                    session_ttl,
                    &config.public_storage_url,
                ));
                let db: Arc<dyn DatabaseService> = store.clone();
                let identity: Arc<dyn IdentityService> = store;
                (db, identity)
            }
        };

    // --- 3. Object Storage & Cache Invalidation ---
    let storage = Arc::new(
        FsObjectStorage::new(config.storage_root.clone(), config.public_storage_url.clone())
            .await?,
    );
    let cache = Arc::new(BroadcastInvalidator::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(db, identity, storage, cache, config.clone()));

    let limiter = app_state.auth_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.purge_stale(600.0).await;
        }
    });

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
