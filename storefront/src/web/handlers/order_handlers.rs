// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use futures_util::future::try_join_all;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderWithItems;
use crate::state::AppState;

/// Admin listing, newest first, each order with its line items.
#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders_store = app_state.orders.clone();
  let orders = orders_store.list_orders().await?;
  let with_items = try_join_all(orders.into_iter().map(|order| {
    let store = orders_store.clone();
    async move {
      let items = store.line_items_for(order.id).await?;
      Ok::<_, AppError>(OrderWithItems { order, items })
    }
  }))
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": with_items })))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %*path))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let raw_id = path.into_inner();
  let order_id = Uuid::parse_str(&raw_id).map_err(|_| AppError::NotFound(format!("Order {} not found", raw_id)))?;
  let order = app_state
    .orders
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  let items = app_state.orders.line_items_for(order_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": OrderWithItems { order, items } })))
}
