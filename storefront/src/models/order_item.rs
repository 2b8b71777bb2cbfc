// storefront/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One product line of an order. Written once with the order and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderLineItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: i32,
  /// Product price copied at order time.
  pub unit_price: i64,
  pub line_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
  pub product_id: String,
  pub quantity: i32,
  pub unit_price: i64,
}

impl NewLineItem {
  pub fn line_total(&self) -> i64 {
    self.unit_price * i64::from(self.quantity)
  }
}
