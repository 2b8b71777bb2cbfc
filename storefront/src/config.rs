// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where products, orders and settings are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
  Postgres,
  /// Process-local maps. Data is lost on restart.
  Memory,
}

impl FromStr for StorageBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StorageBackend::Postgres),
      "memory" | "mem" => Ok(StorageBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORAGE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProviderKind {
  Stripe,
  Mock,
}

impl FromStr for PaymentProviderKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "stripe" => Ok(PaymentProviderKind::Stripe),
      "mock" => Ok(PaymentProviderKind::Mock),
      other => Err(AppError::Config(format!("Invalid PAYMENT_PROVIDER '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

impl LogFormat {
  /// `LOG_FORMAT=json` selects JSON lines; anything else is plain text.
  /// Readable before the rest of the configuration so start-up is logged in the chosen format.
  pub fn from_env() -> Self {
    dotenv().ok();
    Self::parse_lenient(&env::var("LOG_FORMAT").unwrap_or_default())
  }

  fn parse_lenient(raw: &str) -> Self {
    if raw.trim().eq_ignore_ascii_case("json") {
      LogFormat::Json
    } else {
      LogFormat::Text
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Required when `storage_backend` is `Postgres`.
  pub database_url: Option<String>,
  /// Base for the hosted-checkout success and cancel redirects.
  pub app_base_url: String,
  pub storage_backend: StorageBackend,
  pub run_migrations: bool,
  pub seed_db: bool,

  pub payment_provider: PaymentProviderKind,
  pub stripe_secret_key: Option<String>,
  pub stripe_api_base: String,
  pub stripe_webhook_secret: String,
  pub webhook_tolerance: Duration,

  /// Applied to every checkout saga step. `None` disables step timeouts.
  pub checkout_step_timeout: Option<Duration>,
  pub log_format: LogFormat,
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("app_base_url", &self.app_base_url)
      .field("storage_backend", &self.storage_backend)
      .field("run_migrations", &self.run_migrations)
      .field("seed_db", &self.seed_db)
      .field("payment_provider", &self.payment_provider)
      .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"))
      .field("stripe_api_base", &self.stripe_api_base)
      .field("stripe_webhook_secret", &"[REDACTED]")
      .field("webhook_tolerance", &self.webhook_tolerance)
      .field("checkout_step_timeout", &self.checkout_step_timeout)
      .field("log_format", &self.log_format)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_bool = |var_name: &str, default: bool| -> Result<bool> {
      match env::var(var_name) {
        Ok(raw) => raw
          .trim()
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };
    let get_u64 = |var_name: &str, default: u64| -> Result<u64> {
      match env::var(var_name) {
        Ok(raw) => raw
          .trim()
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let storage_backend: StorageBackend = get_env("STORAGE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .parse()?;
    let database_url = match storage_backend {
      StorageBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StorageBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations = get_bool("RUN_MIGRATIONS", true)?;
    let seed_db = get_bool("SEED_DB", false)?;

    let payment_provider: PaymentProviderKind = get_env("PAYMENT_PROVIDER")
      .unwrap_or_else(|_| "stripe".to_string())
      .parse()?;
    let (stripe_secret_key, stripe_webhook_secret) = match payment_provider {
      PaymentProviderKind::Stripe => (Some(get_env("STRIPE_SECRET_KEY")?), get_env("STRIPE_WEBHOOK_SECRET")?),
      PaymentProviderKind::Mock => (
        get_env("STRIPE_SECRET_KEY").ok(),
        get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| "whsec_mock_local".to_string()),
      ),
    };
    let stripe_api_base = get_env("STRIPE_API_BASE")
      .unwrap_or_else(|_| "https://api.stripe.com".to_string())
      .trim_end_matches('/')
      .to_string();
    let webhook_tolerance = Duration::from_secs(get_u64("WEBHOOK_TOLERANCE_SECS", 300)?);

    let checkout_step_timeout = match get_u64("CHECKOUT_STEP_TIMEOUT_MS", 10_000)? {
      0 => None,
      ms => Some(Duration::from_millis(ms)),
    };

    let log_format = LogFormat::parse_lenient(&get_env("LOG_FORMAT").unwrap_or_default());

    let config = Self {
      server_host,
      server_port,
      database_url,
      app_base_url: app_base_url.trim_end_matches('/').to_string(),
      storage_backend,
      run_migrations,
      seed_db,
      payment_provider,
      stripe_secret_key,
      stripe_api_base,
      stripe_webhook_secret,
      webhook_tolerance,
      checkout_step_timeout,
      log_format,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }
}
