// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use sagaflow::{ContextData, SagaOutcome};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::CheckoutRequest;
use crate::sagas::contexts::CheckoutCtxData;
use crate::state::AppState;

async fn run_checkout(app_state: &AppState, request: CheckoutRequest, demo: bool) -> Result<CheckoutCtxData, AppError> {
  let saga_ctx = ContextData::new(CheckoutCtxData::new(app_state.clone(), request, demo));

  match app_state.sagas.run(saga_ctx.clone()).await {
    Ok(SagaOutcome::Completed) => Ok(saga_ctx.snapshot()),
    Ok(SagaOutcome::Stopped) => {
      warn!("Checkout saga was stopped by a handler.");
      Err(AppError::Internal("Checkout was halted before completion.".to_string()))
    }
    Err(app_err) => {
      warn!(error = %app_err, "Checkout saga failed; writes were compensated.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::start_checkout", skip(app_state, body), fields(items = body.items.len()))]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let done = run_checkout(app_state.get_ref(), body.into_inner(), false).await?;

  let order = done
    .order
    .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
  let session = done
    .session
    .ok_or_else(|| AppError::Internal("Checkout completed without a payment session.".to_string()))?;
  info!(order_id = %order.id, session_id = %session.id, "Checkout session ready.");

  Ok(HttpResponse::Ok().json(json!({
    "sessionId": session.id,
    "orderId": order.id,
    "url": session.url,
  })))
}

/// Persists the order exactly like a real checkout but skips the processor.
#[instrument(name = "handler::demo_checkout", skip(app_state, body), fields(items = body.items.len()))]
pub async fn demo_checkout_handler(
  app_state: web::Data<AppState>,
  body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let done = run_checkout(app_state.get_ref(), body.into_inner(), true).await?;

  let order = done
    .order
    .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
  info!(
    order_id = %order.id,
    customer = %order.customer_name,
    total = order.total_amount,
    "Demo order created."
  );

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "orderId": order.id,
    "totalAmount": order.total_amount,
    "currency": order.currency,
    "message": "Order created (demo mode)",
  })))
}
