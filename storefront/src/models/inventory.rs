// storefront/src/models/inventory.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{AppError, Result};

pub const TOTAL_INVENTORY_VALUE: &str = "total_inventory_value";
pub const USE_MANUAL_TOTAL_VALUE: &str = "use_manual_total_value";

/// The admin console's inventory display settings, stored as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySettings {
  pub total_inventory_value: String,
  pub use_manual_total_value: String,
}

impl Default for InventorySettings {
  fn default() -> Self {
    Self {
      total_inventory_value: "0".to_string(),
      use_manual_total_value: "false".to_string(),
    }
  }
}

impl InventorySettings {
  /// Overlays stored rows on the defaults. Unknown names are ignored.
  pub fn from_rows(rows: HashMap<String, String>) -> Self {
    let mut settings = Self::default();
    for (name, value) in rows {
      match name.as_str() {
        TOTAL_INVENTORY_VALUE => settings.total_inventory_value = value,
        USE_MANUAL_TOTAL_VALUE => settings.use_manual_total_value = value,
        _ => {}
      }
    }
    settings
  }

  pub fn uses_manual_value(&self) -> bool {
    self.use_manual_total_value == "true"
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
  pub settings: InventorySettings,
  pub calculated_total_value: i64,
  pub display_total_value: i64,
}

impl InventorySummary {
  /// `calculated_total_value` is the sum of in-stock product prices. The
  /// displayed value is the manual one only when the toggle is on.
  pub fn new(settings: InventorySettings, calculated_total_value: i64) -> Self {
    let display_total_value = if settings.uses_manual_value() {
      settings.total_inventory_value.trim().parse::<i64>().unwrap_or(0)
    } else {
      calculated_total_value
    };
    Self {
      settings,
      calculated_total_value,
      display_total_value,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingUpdate {
  pub setting_name: String,
  pub setting_value: String,
}

impl SettingUpdate {
  pub fn validate(&self) -> Result<()> {
    match self.setting_name.as_str() {
      TOTAL_INVENTORY_VALUE => match self.setting_value.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Ok(()),
        _ => Err(AppError::Validation(format!(
          "{} must be a non-negative integer, got '{}'",
          TOTAL_INVENTORY_VALUE, self.setting_value
        ))),
      },
      USE_MANUAL_TOTAL_VALUE => match self.setting_value.as_str() {
        "true" | "false" => Ok(()),
        other => Err(AppError::Validation(format!(
          "{} must be 'true' or 'false', got '{}'",
          USE_MANUAL_TOTAL_VALUE, other
        ))),
      },
      other => Err(AppError::Validation(format!("Unknown setting '{}'", other))),
    }
  }
}
