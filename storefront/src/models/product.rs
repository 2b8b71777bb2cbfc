// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::{AppError, Result};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A catalog entry. `price` is in minor currency units.
///
/// Ids are opaque strings: processor product ids and UUID text are both used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub price: i64,
  pub currency: String,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub in_stock: bool,
  pub stripe_price_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Body of a product creation request. Prices are only ever set by hand, so
/// derived or processor-managed fields are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: i64,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub in_stock: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<i64>,
  pub currency: Option<String>,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub in_stock: Option<bool>,
  pub stripe_price_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  pub category: Option<String>,
}

fn validate_price(price: i64) -> Result<()> {
  if price < 0 {
    return Err(AppError::Validation(format!(
      "Price must be a non-negative integer (in minor units), got {}",
      price
    )));
  }
  Ok(())
}

fn normalize_currency(raw: &str) -> Result<String> {
  let code = raw.trim();
  if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(AppError::Validation(format!("Invalid currency code '{}'", raw)));
  }
  Ok(code.to_ascii_uppercase())
}

impl NewProduct {
  /// Validates the request and builds the stored record.
  pub fn into_product(self, id: String, now: DateTime<Utc>) -> Result<Product> {
    let name = self.name.trim().to_string();
    if name.is_empty() {
      return Err(AppError::Validation("Product name must not be empty".to_string()));
    }
    validate_price(self.price)?;
    let currency = match self.currency.as_deref() {
      Some(raw) => normalize_currency(raw)?,
      None => DEFAULT_CURRENCY.to_string(),
    };

    Ok(Product {
      id,
      name,
      description: self.description,
      price: self.price,
      currency,
      image_url: self.image_url,
      category: self.category,
      in_stock: self.in_stock.unwrap_or(true),
      stripe_price_id: None,
      created_at: now,
      updated_at: now,
    })
  }
}

impl ProductPatch {
  /// Applies the patch to `product` in place. Validation happens before any field changes.
  pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) -> Result<()> {
    let name = match self.name.as_deref().map(str::trim) {
      Some("") => return Err(AppError::Validation("Product name must not be empty".to_string())),
      other => other.map(str::to_string),
    };
    if let Some(price) = self.price {
      validate_price(price)?;
    }
    let currency = self.currency.as_deref().map(normalize_currency).transpose()?;

    if let Some(name) = name {
      product.name = name;
    }
    if let Some(description) = &self.description {
      product.description = Some(description.clone());
    }
    if let Some(price) = self.price {
      tracing::info!(product_id = %product.id, old_price = product.price, new_price = price, "Manual price update");
      product.price = price;
    }
    if let Some(currency) = currency {
      product.currency = currency;
    }
    if let Some(image_url) = &self.image_url {
      product.image_url = Some(image_url.clone());
    }
    if let Some(category) = &self.category {
      product.category = Some(category.clone());
    }
    if let Some(in_stock) = self.in_stock {
      product.in_stock = in_stock;
    }
    if let Some(price_id) = &self.stripe_price_id {
      product.stripe_price_id = Some(price_id.clone());
    }
    product.updated_at = now;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse_new(body: &str) -> std::result::Result<NewProduct, serde_json::Error> {
    serde_json::from_str(body)
  }

  #[test]
  fn new_product_defaults_currency_and_stock() {
    let np = parse_new(r#"{"name":" Medkit ","price":1999}"#).unwrap();
    let p = np.into_product("p1".into(), Utc::now()).unwrap();
    assert_eq!(p.name, "Medkit");
    assert_eq!(p.currency, "USD");
    assert!(p.in_stock);
    assert_eq!(p.stripe_price_id, None);
  }

  #[test]
  fn new_product_rejects_unknown_fields_and_missing_price() {
    assert!(parse_new(r#"{"name":"x","price":1,"total_value":5}"#).is_err());
    assert!(parse_new(r#"{"name":"x"}"#).is_err());
    assert!(parse_new(r#"{"name":"x","price":19.99}"#).is_err());
  }

  #[test]
  fn new_product_rejects_negative_price_and_blank_name() {
    let neg = parse_new(r#"{"name":"x","price":-1}"#).unwrap();
    assert!(matches!(neg.into_product("p".into(), Utc::now()), Err(AppError::Validation(_))));
    let blank = parse_new(r#"{"name":"  ","price":1}"#).unwrap();
    assert!(matches!(blank.into_product("p".into(), Utc::now()), Err(AppError::Validation(_))));
  }

  #[test]
  fn patch_is_all_or_nothing() {
    let np = parse_new(r#"{"name":"Armor","price":2999,"currency":"cny"}"#).unwrap();
    let mut product = np.into_product("p".into(), Utc::now()).unwrap();
    assert_eq!(product.currency, "CNY");

    let bad: ProductPatch = serde_json::from_str(r#"{"name":"Armor II","price":-5}"#).unwrap();
    assert!(bad.apply_to(&mut product, Utc::now()).is_err());
    assert_eq!(product.name, "Armor");

    let good: ProductPatch = serde_json::from_str(r#"{"price":3999,"stripe_price_id":"price_123"}"#).unwrap();
    good.apply_to(&mut product, Utc::now()).unwrap();
    assert_eq!(product.price, 3999);
    assert_eq!(product.stripe_price_id.as_deref(), Some("price_123"));
  }
}
