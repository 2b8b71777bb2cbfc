// storefront/src/sagas/mod.rs

//! Saga definitions and their context data types.

pub mod checkout_saga;
pub mod contexts;
pub mod transitions;
pub mod webhook_saga;

use crate::errors::AppError;
use crate::state::AppState;
use sagaflow::SagaRegistry;
use tracing::info;

/// Registers every saga the service runs. Called once at start-up.
pub fn register_all_sagas(registry: &SagaRegistry<AppError>, app_state: &AppState) {
  checkout_saga::register_checkout_saga(registry, app_state);
  webhook_saga::register_webhook_saga(registry, app_state);
  info!(sagas = ?registry.registered_types(), "All sagas registered.");
}
