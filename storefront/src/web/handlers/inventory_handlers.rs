// storefront/src/web/handlers/inventory_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::SettingUpdate;
use crate::services::inventory;
use crate::state::AppState;

#[instrument(name = "handler::get_inventory_settings", skip(app_state))]
pub async fn get_inventory_settings_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let summary = inventory::inventory_summary(app_state.settings.as_ref(), app_state.catalog.as_ref()).await?;
  Ok(HttpResponse::Ok().json(summary))
}

#[instrument(name = "handler::update_inventory_setting", skip(app_state, body), fields(setting = %body.setting_name))]
pub async fn update_inventory_setting_handler(
  app_state: web::Data<AppState>,
  body: web::Json<SettingUpdate>,
) -> Result<HttpResponse, AppError> {
  inventory::update_setting(app_state.settings.as_ref(), &body).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
