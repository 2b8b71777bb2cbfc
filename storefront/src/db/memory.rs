// storefront/src/db/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CatalogStore, OrderStore, SettingsStore};
use crate::errors::{AppError, Result};
use crate::models::{NewLineItem, NewOrder, Order, OrderLineItem, OrderStatus, Product, ProductFilter};

/// In-process store for local runs and tests. Vectors keep insertion order,
/// so "newest first" is a reverse scan.
#[derive(Default)]
pub struct MemoryStore {
  products: RwLock<Vec<Product>>,
  orders: RwLock<Vec<Order>>,
  line_items: RwLock<Vec<OrderLineItem>>,
  settings: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every product, in stock or not. Test helper.
  pub async fn all_products(&self) -> Vec<Product> {
    self.products.read().await.clone()
  }

  /// Every line item across all orders.
  pub async fn all_line_items(&self) -> Vec<OrderLineItem> {
    self.line_items.read().await.clone()
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let products = self.products.read().await;
    let mut listed: Vec<Product> = products
      .iter()
      .rev()
      .filter(|p| p.in_stock)
      .filter(|p| match filter.category.as_deref() {
        Some(category) => p.category.as_deref() == Some(category),
        None => true,
      })
      .cloned()
      .collect();
    // Stable: equal timestamps keep newest-inserted first.
    listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(listed)
  }

  async fn get_product(&self, id: &str) -> Result<Option<Product>> {
    Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
  }

  async fn insert_product(&self, product: &Product) -> Result<Product> {
    let mut products = self.products.write().await;
    if products.iter().any(|p| p.id == product.id) {
      return Err(AppError::Persistence(format!("Product '{}' already exists", product.id)));
    }
    products.push(product.clone());
    Ok(product.clone())
  }

  async fn update_product(&self, product: &Product) -> Result<Option<Product>> {
    let mut products = self.products.write().await;
    match products.iter_mut().find(|p| p.id == product.id) {
      Some(existing) => {
        let created_at = existing.created_at;
        *existing = Product {
          created_at,
          ..product.clone()
        };
        Ok(Some(existing.clone()))
      }
      None => Ok(None),
    }
  }

  async fn upsert_product(&self, product: &Product) -> Result<Product> {
    if let Some(updated) = self.update_product(product).await? {
      return Ok(updated);
    }
    self.insert_product(product).await
  }

  async fn delete_product(&self, id: &str) -> Result<bool> {
    let mut products = self.products.write().await;
    let before = products.len();
    products.retain(|p| p.id != id);
    Ok(products.len() != before)
  }

  async fn in_stock_total_value(&self) -> Result<i64> {
    Ok(self.products.read().await.iter().filter(|p| p.in_stock).map(|p| p.price).sum())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert_order(&self, new_order: &NewOrder) -> Result<Order> {
    let now = Utc::now();
    let mut orders = self.orders.write().await;
    if orders.iter().any(|o| o.id == new_order.id) {
      return Err(AppError::Persistence(format!("Order {} already exists", new_order.id)));
    }
    let order = Order {
      id: new_order.id,
      customer_email: new_order.customer_email.clone(),
      customer_name: new_order.customer_name.clone(),
      total_amount: new_order.total_amount,
      currency: new_order.currency.clone(),
      status: OrderStatus::Pending,
      stripe_session_id: None,
      stripe_payment_intent_id: new_order.stripe_payment_intent_id.clone(),
      created_at: now,
      updated_at: now,
    };
    orders.push(order.clone());
    Ok(order)
  }

  async fn insert_line_items(&self, order_id: Uuid, items: &[NewLineItem]) -> Result<Vec<OrderLineItem>> {
    if !self.orders.read().await.iter().any(|o| o.id == order_id) {
      return Err(AppError::Persistence(format!("Order {} does not exist", order_id)));
    }
    let rows: Vec<OrderLineItem> = items
      .iter()
      .map(|item| OrderLineItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: item.product_id.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        line_total: item.line_total(),
      })
      .collect();
    self.line_items.write().await.extend(rows.iter().cloned());
    Ok(rows)
  }

  async fn delete_line_items(&self, order_id: Uuid) -> Result<u64> {
    let mut items = self.line_items.write().await;
    let before = items.len();
    items.retain(|i| i.order_id != order_id);
    Ok((before - items.len()) as u64)
  }

  async fn delete_order(&self, order_id: Uuid) -> Result<bool> {
    let mut orders = self.orders.write().await;
    let before = orders.len();
    orders.retain(|o| o.id != order_id);
    let removed = orders.len() != before;
    drop(orders);
    if removed {
      // Mirrors ON DELETE CASCADE.
      self.line_items.write().await.retain(|i| i.order_id != order_id);
    }
    Ok(removed)
  }

  async fn attach_session(&self, order_id: Uuid, session_id: &str, payment_intent_id: Option<&str>) -> Result<bool> {
    let mut orders = self.orders.write().await;
    match orders.iter_mut().find(|o| o.id == order_id) {
      Some(order) => {
        order.stripe_session_id = Some(session_id.to_string());
        if let Some(pi) = payment_intent_id {
          order.stripe_payment_intent_id = Some(pi.to_string());
        }
        order.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.orders.read().await.iter().find(|o| o.id == order_id).cloned())
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self.orders.read().await.iter().rev().cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn line_items_for(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>> {
    Ok(
      self
        .line_items
        .read()
        .await
        .iter()
        .filter(|i| i.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
    Ok(
      self
        .orders
        .read()
        .await
        .iter()
        .rev()
        .find(|o| o.stripe_payment_intent_id.as_deref() == Some(payment_intent_id))
        .cloned(),
    )
  }

  async fn transition_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    payment_intent_id: Option<&str>,
  ) -> Result<bool> {
    let mut orders = self.orders.write().await;
    match orders.iter_mut().find(|o| o.id == order_id && o.status == expected) {
      Some(order) => {
        order.status = next;
        if let Some(pi) = payment_intent_id {
          order.stripe_payment_intent_id = Some(pi.to_string());
        }
        order.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn product_has_line_items(&self, product_id: &str) -> Result<bool> {
    Ok(self.line_items.read().await.iter().any(|i| i.product_id == product_id))
  }
}

#[async_trait]
impl SettingsStore for MemoryStore {
  async fn load_settings(&self) -> Result<HashMap<String, String>> {
    Ok(self.settings.read().await.clone())
  }

  async fn upsert_setting(&self, name: &str, value: &str) -> Result<()> {
    self.settings.write().await.insert(name.to_string(), value.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_order(total: i64) -> NewOrder {
    NewOrder {
      id: Uuid::new_v4(),
      customer_email: "a@b.c".into(),
      customer_name: "A".into(),
      total_amount: total,
      currency: "USD".into(),
      stripe_payment_intent_id: None,
    }
  }

  #[tokio::test]
  async fn transition_is_compare_and_set() {
    let store = MemoryStore::new();
    let order = store.insert_order(&new_order(100)).await.unwrap();

    assert!(store
      .transition_status(order.id, OrderStatus::Pending, OrderStatus::Paid, Some("pi_1"))
      .await
      .unwrap());
    assert!(!store
      .transition_status(order.id, OrderStatus::Pending, OrderStatus::Paid, Some("pi_1"))
      .await
      .unwrap());

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);
    assert_eq!(stored.stripe_payment_intent_id.as_deref(), Some("pi_1"));
  }

  #[tokio::test]
  async fn deleting_order_cascades_to_line_items() {
    let store = MemoryStore::new();
    let order = store.insert_order(&new_order(20)).await.unwrap();
    let items = vec![NewLineItem {
      product_id: "p1".into(),
      quantity: 2,
      unit_price: 10,
    }];
    store.insert_line_items(order.id, &items).await.unwrap();
    assert!(store.product_has_line_items("p1").await.unwrap());

    assert!(store.delete_order(order.id).await.unwrap());
    assert!(store.all_line_items().await.is_empty());
    assert!(!store.delete_order(order.id).await.unwrap());
  }
}
