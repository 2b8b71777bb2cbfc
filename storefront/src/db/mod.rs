// storefront/src/db/mod.rs

//! Persistence seams. Handlers and sagas only see these traits; `postgres`
//! backs them with sqlx and `memory` with process-local maps.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{NewLineItem, NewOrder, Order, OrderLineItem, OrderStatus, Product, ProductFilter};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// In-stock products, newest first, optionally restricted to one category.
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;

  async fn get_product(&self, id: &str) -> Result<Option<Product>>;

  async fn insert_product(&self, product: &Product) -> Result<Product>;

  /// Overwrites the mutable columns of an existing product. `None` if it doesn't exist.
  async fn update_product(&self, product: &Product) -> Result<Option<Product>>;

  /// Inserts or refreshes a product by id, keeping its original `created_at`.
  async fn upsert_product(&self, product: &Product) -> Result<Product>;

  /// `false` if there was nothing to delete.
  async fn delete_product(&self, id: &str) -> Result<bool>;

  /// Sum of the prices of all in-stock products.
  async fn in_stock_total_value(&self) -> Result<i64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts a `pending` order.
  async fn insert_order(&self, new_order: &NewOrder) -> Result<Order>;

  /// Inserts all line items of an order, or none of them.
  async fn insert_line_items(&self, order_id: Uuid, items: &[NewLineItem]) -> Result<Vec<OrderLineItem>>;

  async fn delete_line_items(&self, order_id: Uuid) -> Result<u64>;

  async fn delete_order(&self, order_id: Uuid) -> Result<bool>;

  /// Records the processor session on the order, and its payment intent when known.
  async fn attach_session(&self, order_id: Uuid, session_id: &str, payment_intent_id: Option<&str>) -> Result<bool>;

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>>;

  /// Newest first.
  async fn list_orders(&self) -> Result<Vec<Order>>;

  async fn line_items_for(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>>;

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>>;

  /// Compare-and-set status update: applies `next` only while the order is
  /// still in `expected`. Returns whether a row changed. A given
  /// `payment_intent_id` is recorded together with the new status.
  async fn transition_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    payment_intent_id: Option<&str>,
  ) -> Result<bool>;

  async fn product_has_line_items(&self, product_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
  async fn load_settings(&self) -> Result<HashMap<String, String>>;

  async fn upsert_setting(&self, name: &str, value: &str) -> Result<()>;
}
