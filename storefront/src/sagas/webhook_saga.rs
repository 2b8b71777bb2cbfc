// storefront/src/sagas/webhook_saga.rs

//! Webhook reconciliation: authenticate the raw body, parse it, then move
//! the order through the transition table. Nothing here writes before the
//! signature has been verified, so the saga has no compensations.

use sagaflow::{ContextData, Saga, SagaControl, SagaRegistry};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::OrderStore;
use crate::errors::AppError;
use crate::models::Order;
use crate::sagas::contexts::WebhookCtxData;
use crate::sagas::transitions::{decide, ReconcileOutcome, StatusSignal, TransitionDecision};
use crate::services::signature;
use crate::services::webhook_event::{parse_event, WebhookEvent};
use crate::state::AppState;

pub const VERIFY_SIGNATURE: &str = "verify_signature";
pub const PARSE_EVENT: &str = "parse_event";
pub const RECONCILE_ORDER: &str = "reconcile_order";

/// Compare-and-set attempts before giving up on a contended order.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

pub fn build_webhook_saga(_app_state: &AppState) -> Saga<WebhookCtxData, AppError> {
  let mut s = Saga::<WebhookCtxData, AppError>::new(&[
    (VERIFY_SIGNATURE, false, None),
    (PARSE_EVENT, false, None),
    (RECONCILE_ORDER, false, None),
  ]);

  s.on_root(VERIFY_SIGNATURE, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let result = {
        let guard = ctx_data.read();
        let config = &guard.app_state.config;
        signature::verify(
          &guard.raw_body,
          guard.signature_header.as_deref(),
          &config.stripe_webhook_secret,
          config.webhook_tolerance,
          guard.received_at,
        )
      };
      if let Err(e) = result {
        // Only the reason; the unauthenticated body is never logged.
        warn!(reason = %e, "Webhook signature verification failed.");
        return Err(e);
      }
      ctx_data.write().verified = true;
      Ok::<_, AppError>(SagaControl::Continue)
    })
  });

  s.on_root(PARSE_EVENT, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let parsed = {
        let guard = ctx_data.read();
        if !guard.verified {
          return Err(AppError::Signature("event parsed before verification".to_string()));
        }
        parse_event(&guard.raw_body)?
      };
      info!(event_id = %parsed.id, event_type = %parsed.event_type, "Webhook event received.");
      ctx_data.write().event = Some(parsed);
      Ok::<_, AppError>(SagaControl::Continue)
    })
  });

  s.on_root(RECONCILE_ORDER, |ctx_data| Box::pin(reconcile_order(ctx_data)));

  s
}

async fn reconcile_order(ctx_data: ContextData<WebhookCtxData>) -> Result<SagaControl, AppError> {
  let (orders, event) = {
    let guard = ctx_data.read();
    let event = guard
      .event
      .as_ref()
      .map(|p| p.event.clone())
      .ok_or_else(|| AppError::Internal("reconcile_order ran before parse_event".to_string()))?;
    (guard.app_state.orders.clone(), event)
  };

  let outcome = match event {
    WebhookEvent::SessionCompleted {
      order_ref,
      payment_intent_id,
      ..
    } => {
      let order = find_by_order_ref(orders.as_ref(), order_ref.as_deref()).await?;
      apply_signal(
        orders.as_ref(),
        order,
        StatusSignal::SessionCompleted,
        payment_intent_id.as_deref(),
      )
      .await?
    }
    WebhookEvent::SessionExpired { order_ref, .. } => {
      let order = find_by_order_ref(orders.as_ref(), order_ref.as_deref()).await?;
      apply_signal(orders.as_ref(), order, StatusSignal::SessionExpired, None).await?
    }
    WebhookEvent::PaymentFailed { payment_intent_id } => {
      let order = orders.find_by_payment_intent(&payment_intent_id).await?;
      apply_signal(orders.as_ref(), order, StatusSignal::PaymentFailed, None).await?
    }
    WebhookEvent::Other { event_type } => {
      info!(%event_type, "Unhandled event type acknowledged.");
      ReconcileOutcome::Ignored { event_type }
    }
  };

  info!(outcome = ?outcome, "Webhook reconciled.");
  ctx_data.write().outcome = Some(outcome);
  Ok(SagaControl::Continue)
}

async fn find_by_order_ref(orders: &dyn OrderStore, order_ref: Option<&str>) -> Result<Option<Order>, AppError> {
  let Some(raw) = order_ref else {
    return Ok(None);
  };
  match Uuid::parse_str(raw) {
    Ok(order_id) => orders.get_order(order_id).await,
    Err(_) => {
      warn!(order_ref = %raw, "Session metadata carries a malformed order id.");
      Ok(None)
    }
  }
}

/// Runs the transition table against the stored order, retrying the
/// compare-and-set if another delivery moved the order in between.
async fn apply_signal(
  orders: &dyn OrderStore,
  order: Option<Order>,
  signal: StatusSignal,
  payment_intent_id: Option<&str>,
) -> Result<ReconcileOutcome, AppError> {
  let Some(mut order) = order else {
    info!(?signal, "No matching order; acknowledging anyway.");
    return Ok(ReconcileOutcome::OrderNotFound { signal });
  };

  for _ in 0..MAX_TRANSITION_ATTEMPTS {
    match decide(order.status, signal) {
      TransitionDecision::AlreadyApplied => {
        info!(order_id = %order.id, status = %order.status, "Duplicate delivery; status already applied.");
        return Ok(ReconcileOutcome::Duplicate {
          order_id: order.id,
          status: order.status,
        });
      }
      TransitionDecision::Illegal { from, to } => {
        error!(order_id = %order.id, %from, %to, "Illegal order transition requested; not applied.");
        return Ok(ReconcileOutcome::Illegal {
          order_id: order.id,
          from,
          attempted: to,
        });
      }
      TransitionDecision::Apply(next) => {
        if orders
          .transition_status(order.id, order.status, next, payment_intent_id)
          .await?
        {
          info!(order_id = %order.id, from = %order.status, to = %next, "Order status updated.");
          return Ok(ReconcileOutcome::Applied {
            order_id: order.id,
            from: order.status,
            to: next,
          });
        }
        // Lost the race. Re-read and decide again.
        match orders.get_order(order.id).await? {
          Some(fresh) => order = fresh,
          None => return Ok(ReconcileOutcome::OrderNotFound { signal }),
        }
      }
    }
  }

  Err(AppError::Internal(format!(
    "Order {} kept changing while applying {:?}",
    order.id, signal
  )))
}

pub fn register_webhook_saga(registry: &SagaRegistry<AppError>, app_state: &AppState) {
  registry.register_saga(build_webhook_saga(app_state));
  info!("Webhook saga registered.");
}
