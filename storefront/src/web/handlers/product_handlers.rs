// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::{NewProduct, ProductFilter, ProductPatch};
use crate::services::catalog;
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(app_state, query_params), fields(category = ?query_params.category))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let products = catalog::list_products(app_state.catalog.as_ref(), &query_params).await?;
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::create_product", skip(app_state, body))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::create_product(app_state.catalog.as_ref(), body.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %*path))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = catalog::get_product(app_state.catalog.as_ref(), &product_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::update_product", skip(app_state, path, body), fields(product_id = %*path))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  body: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let product = catalog::update_product(app_state.catalog.as_ref(), &product_id, &body).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::delete_product", skip(app_state, path), fields(product_id = %*path))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  catalog::delete_product(app_state.catalog.as_ref(), app_state.orders.as_ref(), &product_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Product deleted successfully" })))
}

#[instrument(name = "handler::sync_products", skip(app_state))]
pub async fn sync_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let synced = catalog::sync_catalog(app_state.catalog.as_ref()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Synced {} catalog products", synced.len()),
    "products": synced,
  })))
}
