// storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use storefront::config::{AppConfig, LogFormat, PaymentProviderKind, StorageBackend};
use storefront::db::{CatalogStore, MemoryStore, OrderStore, PgStore, SettingsStore};
use storefront::errors::AppError;
use storefront::services::{catalog, MockPaymentProcessor, PaymentProcessor, StripeClient};
use storefront::state::AppState;
use storefront::web::configure_app_routes;

fn init_tracing(format: LogFormat) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

type Stores = (Arc<dyn CatalogStore>, Arc<dyn OrderStore>, Arc<dyn SettingsStore>);

async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
  match config.storage_backend {
    StorageBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
      let store = Arc::new(PgStore::connect(database_url).await?);
      if config.run_migrations {
        store.migrate().await?;
      }
      let catalog: Arc<dyn CatalogStore> = store.clone();
      let orders: Arc<dyn OrderStore> = store.clone();
      let settings: Arc<dyn SettingsStore> = store;
      Ok((catalog, orders, settings))
    }
    StorageBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      let store = Arc::new(MemoryStore::new());
      let catalog: Arc<dyn CatalogStore> = store.clone();
      let orders: Arc<dyn OrderStore> = store.clone();
      let settings: Arc<dyn SettingsStore> = store;
      Ok((catalog, orders, settings))
    }
  }
}

fn build_payment_processor(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentProcessor>> {
  match config.payment_provider {
    PaymentProviderKind::Stripe => {
      let secret_key = config
        .stripe_secret_key
        .clone()
        .ok_or_else(|| AppError::Config("STRIPE_SECRET_KEY is required for the stripe provider".to_string()))?;
      let client: Arc<dyn PaymentProcessor> = Arc::new(StripeClient::new(config.stripe_api_base.clone(), secret_key)?);
      Ok(client)
    }
    PaymentProviderKind::Mock => {
      tracing::warn!("Using the mock payment processor; no real sessions are created.");
      let mock: Arc<dyn PaymentProcessor> = Arc::new(MockPaymentProcessor::new(config.app_base_url.clone()));
      Ok(mock)
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // The log format is read ahead of the full config so config loading is logged too.
  init_tracing(LogFormat::from_env());

  tracing::info!("Starting storefront server...");

  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);

  let (catalog_store, order_store, settings_store) = build_stores(&app_config)
    .await
    .context("Failed to initialise storage")?;
  let payments = build_payment_processor(&app_config).context("Failed to initialise payment processor")?;
  tracing::info!(processor = payments.name(), "Payment processor ready.");

  let app_state = AppState::new(app_config.clone(), catalog_store, order_store, settings_store, payments);

  if app_config.seed_db {
    let synced = catalog::sync_catalog(app_state.catalog.as_ref())
      .await
      .context("Failed to seed the product catalog")?;
    tracing::info!(count = synced.len(), "Product catalog seeded.");
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await?;

  Ok(())
}
