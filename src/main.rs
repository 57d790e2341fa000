use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paysync::adapters::clerk::ClerkAdapter;
use paysync::adapters::http::{router, AppState};
use paysync::adapters::postgres::{
    PostgresInvoiceRepository, PostgresPaymentMethodRepository, PostgresUserRepository,
};
use paysync::adapters::whop::WhopAdapter;
use paysync::config::AppConfig;
use paysync::domain::webhook::WhopWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        "Starting paysync"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let state = AppState {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        payment_methods: Arc::new(PostgresPaymentMethodRepository::new(pool.clone())),
        invoices: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
        payment_provider: Arc::new(WhopAdapter::new(&config.payment)),
        identity_provider: Arc::new(ClerkAdapter::new(&config.auth)),
        webhook_verifier: WhopWebhookVerifier::new(
            config.payment.whop_webhook_secret.expose_secret().clone(),
        ),
    };

    let app = router(state);
    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
