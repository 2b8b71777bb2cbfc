// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use sagaflow::{ContextData, SagaOutcome};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::sagas::contexts::WebhookCtxData;
use crate::services::signature::SIGNATURE_HEADER;
use crate::state::AppState;

/// Answers 200 for every authenticated event, matched or not, so the
/// processor doesn't retry benign deliveries. Bad signatures get a 400.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h_val| h_val.to_str().ok())
    .map(String::from);

  let saga_ctx = ContextData::new(WebhookCtxData::new(
    app_state.get_ref().clone(),
    body,
    signature_header,
    Utc::now().timestamp(),
  ));

  match app_state.sagas.run(saga_ctx.clone()).await {
    Ok(SagaOutcome::Completed) | Ok(SagaOutcome::Stopped) => {
      let outcome = saga_ctx.read().outcome.clone();
      info!(outcome = ?outcome, "Webhook acknowledged.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
    Err(app_err) => {
      if !matches!(app_err, AppError::Signature(_)) {
        warn!(error = %app_err, "Webhook processing failed.");
      }
      Err(app_err)
    }
  }
}
