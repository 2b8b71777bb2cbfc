// storefront/src/services/catalog.rs

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{CatalogStore, OrderStore};
use crate::errors::{AppError, Result};
use crate::models::{NewProduct, Product, ProductFilter, ProductPatch};

pub const DELTA_FORCE_CATEGORY: &str = "delta-force";

struct SeedProduct {
  id: &'static str,
  name: &'static str,
  description: &'static str,
  price: i64,
  stripe_price_id: &'static str,
}

/// The built-in game-item catalog, keyed by processor product id. Prices in CNY fen.
const DELTA_FORCE_ITEMS: [SeedProduct; 3] = [
  SeedProduct {
    id: "prod_TULAiUmidJIcyQ",
    name: "战术护甲包",
    description: "三级防弹护甲，提供65%伤害减免，适合高强度战斗场景",
    price: 2999,
    stripe_price_id: "price_1SXMU0HCQbuRdfgNpixEUaHB",
  },
  SeedProduct {
    id: "prod_TULAu1jVLj7MjS",
    name: "精英武器箱",
    description: "包含AK47-火龙、M4A1-雷神、AWP-巨龙传说等稀有皮肤，开启概率获得传说级武器",
    price: 5999,
    stripe_price_id: "price_1SXMU3HCQbuRdfgNJjsssMLK",
  },
  SeedProduct {
    id: "prod_TULA0gj9QfhxHq",
    name: "医疗物资包",
    description: "包含5个医疗包、3个肾上腺素和2个防毒面具，快速恢复战斗状态",
    price: 1999,
    stripe_price_id: "price_1SXMU6HCQbuRdfgNcof7oSef",
  },
];

pub async fn list_products(catalog: &dyn CatalogStore, filter: &ProductFilter) -> Result<Vec<Product>> {
  catalog.list_products(filter).await
}

pub async fn get_product(catalog: &dyn CatalogStore, id: &str) -> Result<Product> {
  catalog
    .get_product(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

#[instrument(skip(catalog, new_product), fields(name = %new_product.name, price = new_product.price))]
pub async fn create_product(catalog: &dyn CatalogStore, new_product: NewProduct) -> Result<Product> {
  let product = new_product.into_product(Uuid::new_v4().to_string(), Utc::now())?;
  let created = catalog.insert_product(&product).await?;
  info!(product_id = %created.id, "Product created with manually set price.");
  Ok(created)
}

#[instrument(skip(catalog, patch))]
pub async fn update_product(catalog: &dyn CatalogStore, id: &str, patch: &ProductPatch) -> Result<Product> {
  let mut product = get_product(catalog, id).await?;
  patch.apply_to(&mut product, Utc::now())?;
  catalog
    .update_product(&product)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

/// Products referenced by any order line are kept for the order history.
#[instrument(skip(catalog, orders))]
pub async fn delete_product(catalog: &dyn CatalogStore, orders: &dyn OrderStore, id: &str) -> Result<()> {
  get_product(catalog, id).await?;
  if orders.product_has_line_items(id).await? {
    warn!("Refusing to delete product referenced by existing orders.");
    return Err(AppError::Validation("Cannot delete product with existing orders".to_string()));
  }
  if !catalog.delete_product(id).await? {
    return Err(AppError::NotFound(format!("Product {} not found", id)));
  }
  info!("Product deleted.");
  Ok(())
}

/// Upserts the built-in game-item catalog. Safe to run repeatedly.
#[instrument(skip(catalog))]
pub async fn sync_catalog(catalog: &dyn CatalogStore) -> Result<Vec<Product>> {
  let now = Utc::now();
  let mut synced = Vec::with_capacity(DELTA_FORCE_ITEMS.len());
  for item in &DELTA_FORCE_ITEMS {
    let product = Product {
      id: item.id.to_string(),
      name: item.name.to_string(),
      description: Some(item.description.to_string()),
      price: item.price,
      currency: "CNY".to_string(),
      image_url: None,
      category: Some(DELTA_FORCE_CATEGORY.to_string()),
      in_stock: true,
      stripe_price_id: Some(item.stripe_price_id.to_string()),
      created_at: now,
      updated_at: now,
    };
    let stored = catalog.upsert_product(&product).await?;
    info!(product_id = %stored.id, price = stored.price, currency = %stored.currency, "Catalog item synced.");
    synced.push(stored);
  }
  Ok(synced)
}
