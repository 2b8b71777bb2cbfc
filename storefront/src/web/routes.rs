// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::{checkout_handlers, inventory_handlers, order_handlers, product_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed or unexpected JSON bodies become `{error}` 400s like every other validation failure.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          // Registered before /{product_id} so "sync" is never taken for an id.
          .route("/sync", web::post().to(product_handlers::sync_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler))
      .route("/checkout-demo", web::post().to(checkout_handlers::demo_checkout_handler))
      .route("/webhook", web::post().to(webhook_handlers::payment_webhook_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::resource("/inventory-settings")
          .route(web::get().to(inventory_handlers::get_inventory_settings_handler))
          .route(web::post().to(inventory_handlers::update_inventory_setting_handler)),
      ),
  );
}
