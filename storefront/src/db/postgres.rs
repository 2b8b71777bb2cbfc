// storefront/src/db/postgres.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{CatalogStore, OrderStore, SettingsStore};
use crate::errors::{AppError, Result};
use crate::models::{NewLineItem, NewOrder, Order, OrderLineItem, OrderStatus, Product, ProductFilter};

const PRODUCT_COLUMNS: &str =
  "id, name, description, price, currency, image_url, category, in_stock, stripe_price_id, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, customer_email, customer_name, total_amount, currency, status, \
   stripe_session_id, stripe_payment_intent_id, created_at, updated_at";
const LINE_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, line_total";

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPool::connect(database_url).await.map_err(|e| {
      error!("Failed to connect to the database: {}", e);
      AppError::Sqlx(e)
    })?;
    info!("Successfully connected to the database.");
    Ok(Self::new(pool))
  }

  /// Applies the embedded migrations under `migrations/`.
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Persistence(format!("Migration failed: {}", e)))?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  #[instrument(name = "pg::list_products", skip(self))]
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let products = match filter.category.as_deref() {
      Some(category) => {
        sqlx::query_as::<_, Product>(&format!(
          "SELECT {} FROM products WHERE in_stock = TRUE AND category = $1 ORDER BY created_at DESC",
          PRODUCT_COLUMNS
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?
      }
      None => {
        sqlx::query_as::<_, Product>(&format!(
          "SELECT {} FROM products WHERE in_stock = TRUE ORDER BY created_at DESC",
          PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?
      }
    };
    Ok(products)
  }

  async fn get_product(&self, id: &str) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  #[instrument(name = "pg::insert_product", skip(self, product), fields(product_id = %product.id))]
  async fn insert_product(&self, product: &Product) -> Result<Product> {
    let inserted = sqlx::query_as::<_, Product>(&format!(
      "INSERT INTO products (id, name, description, price, currency, image_url, category, in_stock, stripe_price_id, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.currency)
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.in_stock)
    .bind(&product.stripe_price_id)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(&self.pool)
    .await?;
    Ok(inserted)
  }

  #[instrument(name = "pg::update_product", skip(self, product), fields(product_id = %product.id))]
  async fn update_product(&self, product: &Product) -> Result<Option<Product>> {
    let updated = sqlx::query_as::<_, Product>(&format!(
      "UPDATE products SET name = $2, description = $3, price = $4, currency = $5, image_url = $6, \
       category = $7, in_stock = $8, stripe_price_id = $9, updated_at = $10 WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.currency)
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.in_stock)
    .bind(&product.stripe_price_id)
    .bind(product.updated_at)
    .fetch_optional(&self.pool)
    .await?;
    Ok(updated)
  }

  async fn upsert_product(&self, product: &Product) -> Result<Product> {
    let upserted = sqlx::query_as::<_, Product>(&format!(
      "INSERT INTO products (id, name, description, price, currency, image_url, category, in_stock, stripe_price_id, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
       ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description, \
       price = EXCLUDED.price, currency = EXCLUDED.currency, image_url = EXCLUDED.image_url, \
       category = EXCLUDED.category, in_stock = EXCLUDED.in_stock, stripe_price_id = EXCLUDED.stripe_price_id, \
       updated_at = EXCLUDED.updated_at RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.currency)
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.in_stock)
    .bind(&product.stripe_price_id)
    .bind(product.updated_at)
    .fetch_one(&self.pool)
    .await?;
    Ok(upserted)
  }

  async fn delete_product(&self, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn in_stock_total_value(&self) -> Result<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(price), 0)::BIGINT FROM products WHERE in_stock = TRUE")
      .fetch_one(&self.pool)
      .await?;
    Ok(total)
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "pg::insert_order", skip(self, new_order), fields(total = new_order.total_amount))]
  async fn insert_order(&self, new_order: &NewOrder) -> Result<Order> {
    let now = Utc::now();
    let order = sqlx::query_as::<_, Order>(&format!(
      "INSERT INTO orders (id, customer_email, customer_name, total_amount, currency, status, stripe_payment_intent_id, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(new_order.id)
    .bind(&new_order.customer_email)
    .bind(&new_order.customer_name)
    .bind(new_order.total_amount)
    .bind(&new_order.currency)
    .bind(OrderStatus::Pending)
    .bind(&new_order.stripe_payment_intent_id)
    .bind(now)
    .fetch_one(&self.pool)
    .await?;
    Ok(order)
  }

  #[instrument(name = "pg::insert_line_items", skip(self, items), fields(count = items.len()))]
  async fn insert_line_items(&self, order_id: Uuid, items: &[NewLineItem]) -> Result<Vec<OrderLineItem>> {
    let mut tx = self.pool.begin().await?;
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
      let row = sqlx::query_as::<_, OrderLineItem>(&format!(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, line_total) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        LINE_ITEM_COLUMNS
      ))
      .bind(Uuid::new_v4())
      .bind(order_id)
      .bind(&item.product_id)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(item.line_total())
      .fetch_one(&mut *tx)
      .await?;
      inserted.push(row);
    }
    tx.commit().await?;
    Ok(inserted)
  }

  async fn delete_line_items(&self, order_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn delete_order(&self, order_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn attach_session(&self, order_id: Uuid, session_id: &str, payment_intent_id: Option<&str>) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE orders SET stripe_session_id = $2, \
       stripe_payment_intent_id = COALESCE($3, stripe_payment_intent_id), updated_at = NOW() WHERE id = $1",
    )
      .bind(order_id)
      .bind(session_id)
      .bind(payment_intent_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLUMNS))
      .fetch_all(&self.pool)
      .await?;
    Ok(orders)
  }

  async fn line_items_for(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>> {
    let items = sqlx::query_as::<_, OrderLineItem>(&format!(
      "SELECT {} FROM order_items WHERE order_id = $1",
      LINE_ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(items)
  }

  async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "SELECT {} FROM orders WHERE stripe_payment_intent_id = $1 ORDER BY created_at DESC LIMIT 1",
      ORDER_COLUMNS
    ))
    .bind(payment_intent_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  #[instrument(name = "pg::transition_status", skip(self))]
  async fn transition_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    payment_intent_id: Option<&str>,
  ) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE orders SET status = $3, stripe_payment_intent_id = COALESCE($4, stripe_payment_intent_id), \
       updated_at = NOW() WHERE id = $1 AND status = $2",
    )
    .bind(order_id)
    .bind(expected)
    .bind(next)
    .bind(payment_intent_id)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn product_has_line_items(&self, product_id: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)")
      .bind(product_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(exists)
  }
}

#[async_trait]
impl SettingsStore for PgStore {
  async fn load_settings(&self) -> Result<HashMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT setting_name, setting_value FROM inventory_settings")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().collect())
  }

  async fn upsert_setting(&self, name: &str, value: &str) -> Result<()> {
    sqlx::query(
      "INSERT INTO inventory_settings (setting_name, setting_value, updated_at) VALUES ($1, $2, NOW()) \
       ON CONFLICT (setting_name) DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()",
    )
    .bind(name)
    .bind(value)
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}
