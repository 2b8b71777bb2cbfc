// storefront/src/services/inventory.rs

use tracing::info;

use crate::db::{CatalogStore, SettingsStore};
use crate::errors::Result;
use crate::models::{InventorySettings, InventorySummary, SettingUpdate};

pub async fn inventory_summary(settings: &dyn SettingsStore, catalog: &dyn CatalogStore) -> Result<InventorySummary> {
  let stored = InventorySettings::from_rows(settings.load_settings().await?);
  let calculated = catalog.in_stock_total_value().await?;
  Ok(InventorySummary::new(stored, calculated))
}

pub async fn update_setting(settings: &dyn SettingsStore, update: &SettingUpdate) -> Result<()> {
  update.validate()?;
  let value = update.setting_value.trim();
  settings.upsert_setting(&update.setting_name, value).await?;
  info!(setting = %update.setting_name, value = %value, "Inventory setting updated.");
  Ok(())
}
