// storefront/src/models/checkout.rs

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
  pub product_id: String,
  pub quantity: i64,
}

/// Body of `POST /checkout` and `POST /checkout-demo`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  #[serde(default)]
  pub items: Vec<CheckoutItem>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub customer_name: Option<String>,
}

/// A request that passed validation. Quantities fit the line-item column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
  pub items: Vec<(String, i32)>,
  pub customer_email: String,
  pub customer_name: String,
}

impl CheckoutRequest {
  pub fn validate(&self) -> Result<ValidCheckout> {
    if self.items.is_empty() {
      return Err(AppError::Validation("Invalid items data: at least one item is required".to_string()));
    }
    let customer_email = self.customer_email.as_deref().map(str::trim).unwrap_or_default();
    let customer_name = self.customer_name.as_deref().map(str::trim).unwrap_or_default();
    if customer_email.is_empty() || customer_name.is_empty() {
      return Err(AppError::Validation("Customer email and name are required".to_string()));
    }
    if !customer_email.contains('@') {
      return Err(AppError::Validation(format!("Invalid customer email '{}'", customer_email)));
    }

    let mut items = Vec::with_capacity(self.items.len());
    for item in &self.items {
      let product_id = item.product_id.trim();
      if product_id.is_empty() {
        return Err(AppError::Validation("Every item needs a productId".to_string()));
      }
      let quantity = i32::try_from(item.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| {
          AppError::Validation(format!(
            "Quantity for product {} must be a positive integer, got {}",
            product_id, item.quantity
          ))
        })?;
      items.push((product_id.to_string(), quantity));
    }

    Ok(ValidCheckout {
      items,
      customer_email: customer_email.to_string(),
      customer_name: customer_name.to_string(),
    })
  }
}
