// storefront/src/state.rs
use crate::config::AppConfig;
use crate::db::{CatalogStore, OrderStore, SettingsStore};
use crate::errors::AppError;
use crate::services::PaymentProcessor;
use sagaflow::SagaRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<dyn CatalogStore>,
  pub orders: Arc<dyn OrderStore>,
  pub settings: Arc<dyn SettingsStore>,
  pub payments: Arc<dyn PaymentProcessor>,
  pub sagas: Arc<SagaRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the collaborators together and registers every saga.
  pub fn new(
    config: Arc<AppConfig>,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingsStore>,
    payments: Arc<dyn PaymentProcessor>,
  ) -> Self {
    let app_state = Self {
      catalog,
      orders,
      settings,
      payments,
      sagas: Arc::new(SagaRegistry::<AppError>::new()),
      config,
    };
    crate::sagas::register_all_sagas(&app_state.sagas, &app_state);
    app_state
  }
}
