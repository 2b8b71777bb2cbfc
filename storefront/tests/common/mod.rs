// storefront/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use storefront::config::{AppConfig, LogFormat, PaymentProviderKind, StorageBackend};
use storefront::db::{CatalogStore, MemoryStore, OrderStore, SettingsStore};
use storefront::errors::{AppError, Result};
use storefront::models::{NewLineItem, NewOrder, Order, OrderLineItem, OrderStatus, Product};
use storefront::services::{signature, MockPaymentProcessor, PaymentProcessor};
use storefront::state::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const BASE_URL: &str = "http://shop.test";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn test_config(step_timeout: Option<Duration>) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: None,
    app_base_url: BASE_URL.to_string(),
    storage_backend: StorageBackend::Memory,
    run_migrations: false,
    seed_db: false,
    payment_provider: PaymentProviderKind::Mock,
    stripe_secret_key: None,
    stripe_api_base: "http://stripe.invalid".to_string(),
    stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
    webhook_tolerance: Duration::from_secs(300),
    checkout_step_timeout: step_timeout,
    log_format: LogFormat::Text,
  }
}

/// Order store wrapper that can be told to fail or stall individual writes.
pub struct FlakyOrderStore {
  inner: Arc<MemoryStore>,
  fail_line_items: AtomicBool,
  line_item_delay_ms: AtomicU64,
  /// Stall after the order row is committed, before replying.
  order_reply_delay_ms: AtomicU64,
  attach_delay_ms: AtomicU64,
}

impl FlakyOrderStore {
  pub fn new(inner: Arc<MemoryStore>) -> Self {
    Self {
      inner,
      fail_line_items: AtomicBool::new(false),
      line_item_delay_ms: AtomicU64::new(0),
      order_reply_delay_ms: AtomicU64::new(0),
      attach_delay_ms: AtomicU64::new(0),
    }
  }

  pub fn fail_line_items(&self, fail: bool) {
    self.fail_line_items.store(fail, Ordering::SeqCst);
  }

  pub fn delay_line_items(&self, delay: Duration) {
    self.line_item_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  pub fn delay_order_reply(&self, delay: Duration) {
    self.order_reply_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  pub fn delay_attach_session(&self, delay: Duration) {
    self.attach_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }
}

async fn stall(delay_ms: &AtomicU64) {
  let ms = delay_ms.load(Ordering::SeqCst);
  if ms > 0 {
    tokio::time::sleep(Duration::from_millis(ms)).await;
  }
}

#[async_trait]
impl OrderStore for FlakyOrderStore {
  async fn insert_order(&self, new_order: &NewOrder) -> Result<Order> {
    let order = self.inner.insert_order(new_order).await?;
    stall(&self.order_reply_delay_ms).await;
    Ok(order)
  }

  async fn insert_line_items(&self, order_id: Uuid, items: &[NewLineItem]) -> Result<Vec<OrderLineItem>> {
    stall(&self.line_item_delay_ms).await;
    if self.fail_line_items.load(Ordering::SeqCst) {
      return Err(AppError::Persistence("injected line item failure".to_string()));
    }
    self.inner.insert_line_items(order_id, items).await
  }

  async fn delete_line_items(&self, order_id: Uuid) -> Result<u64> {
    self.inner.delete_line_items(order_id).await
  }

  async fn delete_order(&self, order_id: Uuid) -> Result<bool> {
    self.inner.delete_order(order_id).await
  }

  async fn attach_session(&self, order_id: Uuid, session_id: &str, payment_intent_id: Option<&str>) -> Result<bool> {
    stall(&self.attach_delay_ms).await;
    self.inner.attach_session(order_id, session_id, payment_intent_id).await
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    self.inner.get_order(order_id).await
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    self.inner.list_orders().await
  }

  async fn line_items_for(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>> {
    self.inner.line_items_for(order_id).await
  }

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
    self.inner.find_by_payment_intent(payment_intent_id).await
  }

  async fn transition_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    payment_intent_id: Option<&str>,
  ) -> Result<bool> {
    self.inner.transition_status(order_id, expected, next, payment_intent_id).await
  }

  async fn product_has_line_items(&self, product_id: &str) -> Result<bool> {
    self.inner.product_has_line_items(product_id).await
  }
}

pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub orders: Arc<FlakyOrderStore>,
  pub payments: Arc<MockPaymentProcessor>,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with(MockPaymentProcessor::new(BASE_URL), Some(Duration::from_secs(5)))
  }

  pub fn with(payments: MockPaymentProcessor, step_timeout: Option<Duration>) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let orders = Arc::new(FlakyOrderStore::new(store.clone()));
    let payments = Arc::new(payments);

    let catalog: Arc<dyn CatalogStore> = store.clone();
    let order_store: Arc<dyn OrderStore> = orders.clone();
    let settings: Arc<dyn SettingsStore> = store.clone();
    let processor: Arc<dyn PaymentProcessor> = payments.clone();
    let state = AppState::new(Arc::new(test_config(step_timeout)), catalog, order_store, settings, processor);

    Self {
      state,
      store,
      orders,
      payments,
    }
  }

  pub async fn seed_product(&self, id: &str, price: i64, currency: &str) -> Product {
    let now = Utc::now();
    let product = Product {
      id: id.to_string(),
      name: format!("Item {}", id),
      description: Some(format!("Description of {}", id)),
      price,
      currency: currency.to_string(),
      image_url: None,
      category: Some("gear".to_string()),
      in_stock: true,
      stripe_price_id: None,
      created_at: now,
      updated_at: now,
    };
    self
      .store
      .insert_product(&product)
      .await
      .expect("seeding a product into the memory store")
  }

  pub async fn all_orders(&self) -> Vec<Order> {
    self.store.list_orders().await.expect("listing orders")
  }

  /// A pending order with the given payment intent, bypassing checkout.
  pub async fn pending_order(&self, payment_intent_id: Option<&str>) -> Order {
    self
      .store
      .insert_order(&NewOrder {
        id: Uuid::new_v4(),
        customer_email: "buyer@example.com".to_string(),
        customer_name: "Buyer".to_string(),
        total_amount: 1999,
        currency: "USD".to_string(),
        stripe_payment_intent_id: payment_intent_id.map(str::to_string),
      })
      .await
      .expect("inserting a pending order")
  }
}

pub fn checkout_body(items: &[(&str, i64)]) -> serde_json::Value {
  json!({
    "items": items
      .iter()
      .map(|(id, qty)| json!({ "productId": id, "quantity": qty }))
      .collect::<Vec<_>>(),
    "customerEmail": "buyer@example.com",
    "customerName": "Buyer",
  })
}

pub fn session_event(event_type: &str, order_id: &str, payment_intent: Option<&str>) -> Vec<u8> {
  json!({
    "id": format!("evt_{}", Uuid::new_v4().simple()),
    "type": event_type,
    "data": {
      "object": {
        "id": "cs_test_1",
        "payment_intent": payment_intent,
        "metadata": { "orderId": order_id }
      }
    }
  })
  .to_string()
  .into_bytes()
}

pub fn payment_failed_event(payment_intent_id: &str) -> Vec<u8> {
  json!({
    "id": format!("evt_{}", Uuid::new_v4().simple()),
    "type": "payment_intent.payment_failed",
    "data": { "object": { "id": payment_intent_id } }
  })
  .to_string()
  .into_bytes()
}

pub fn sign_now(payload: &[u8]) -> String {
  signature::sign(payload, WEBHOOK_SECRET, Utc::now().timestamp()).expect("signing a test payload")
}
