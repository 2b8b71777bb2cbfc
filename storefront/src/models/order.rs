// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use uuid::Uuid;

use super::order_item::OrderLineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Failed,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool {
    !matches!(self, OrderStatus::Pending)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Failed => "failed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub customer_email: String,
  pub customer_name: String,
  /// Sum of the line totals at creation time, in minor units.
  pub total_amount: i64,
  pub currency: String,
  pub status: OrderStatus,
  pub stripe_session_id: Option<String>,
  pub stripe_payment_intent_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Values needed to insert an order. New orders always start `pending`.
///
/// The id is chosen by the caller so a write whose reply was lost can still be undone.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub id: Uuid,
  pub customer_email: String,
  pub customer_name: String,
  pub total_amount: i64,
  pub currency: String,
  pub stripe_payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLineItem>,
}
