// storefront/src/sagas/checkout_saga.rs

//! Checkout as a saga: validate, resolve products, write the order and its
//! lines, then open a hosted payment session. Every write has a compensating
//! delete, so a failure at any later step leaves no pending order behind.

use chrono::Utc;
use futures_util::future::try_join_all;
use sagaflow::{ContextData, Saga, SagaControl, SagaRegistry, SkipCondition};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewLineItem, NewOrder, Product};
use crate::sagas::contexts::CheckoutCtxData;
use crate::services::{CheckoutSessionRequest, SessionLineItem};
use crate::state::AppState;

pub const VALIDATE_REQUEST: &str = "validate_checkout_request";
pub const RESOLVE_PRODUCTS: &str = "resolve_products";
pub const INSERT_ORDER: &str = "insert_order";
pub const INSERT_LINE_ITEMS: &str = "insert_line_items";
pub const CREATE_PAYMENT_SESSION: &str = "create_payment_session";
pub const ATTACH_SESSION: &str = "attach_session_to_order";

type StepResult = Result<SagaControl, AppError>;

pub fn build_checkout_saga(app_state: &AppState) -> Saga<CheckoutCtxData, AppError> {
  let skip_in_demo: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: ContextData<CheckoutCtxData>| ctx.read().demo);

  let mut s = Saga::<CheckoutCtxData, AppError>::new(&[
    (VALIDATE_REQUEST, false, None),
    (RESOLVE_PRODUCTS, false, None),
    (INSERT_ORDER, false, None),
    (INSERT_LINE_ITEMS, false, None),
    (CREATE_PAYMENT_SESSION, false, Some(skip_in_demo.clone())),
    (ATTACH_SESSION, false, Some(skip_in_demo)),
  ]);
  s.set_default_step_timeout(app_state.config.checkout_step_timeout);
  // A slow attach must not undo a checkout whose session already exists; the
  // handler bounds its own write instead.
  s.exempt_from_timeout(ATTACH_SESSION);

  s.on_root(VALIDATE_REQUEST, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let validated = ctx_data.read().request.validate()?;
      info!(
        items = validated.items.len(),
        customer = %validated.customer_email,
        "Checkout request validated."
      );
      ctx_data.write().validated = Some(validated);
      Ok::<_, AppError>(SagaControl::Continue)
    })
  });

  s.on_root(RESOLVE_PRODUCTS, |ctx_data| Box::pin(resolve_products(ctx_data)));

  s.on_root(INSERT_ORDER, |ctx_data| Box::pin(insert_order(ctx_data)));
  s.on_compensate(INSERT_ORDER, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (orders, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.orders.clone(), guard.order_id)
      };
      // Unset only when the step failed before choosing an id.
      let Some(order_id) = order_id else {
        return Ok::<(), AppError>(());
      };
      let removed = orders.delete_order(order_id).await?;
      info!(%order_id, removed, "Compensation: pending order deleted.");
      let mut guard = ctx_data.write();
      guard.order = None;
      guard.order_id = None;
      Ok(())
    })
  });

  s.on_root(INSERT_LINE_ITEMS, |ctx_data| Box::pin(insert_line_items(ctx_data)));
  s.on_compensate(INSERT_LINE_ITEMS, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (orders, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.orders.clone(), guard.order_id)
      };
      let Some(order_id) = order_id else {
        return Ok::<(), AppError>(());
      };
      let removed = orders.delete_line_items(order_id).await?;
      info!(%order_id, removed, "Compensation: order line items deleted.");
      ctx_data.write().inserted_items.clear();
      Ok(())
    })
  });

  s.on_root(CREATE_PAYMENT_SESSION, |ctx_data| Box::pin(create_payment_session(ctx_data)));

  // Best effort: webhooks find the order through session metadata, not this column.
  s.on_root(ATTACH_SESSION, |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (orders, order_id, session, limit) = {
        let guard = ctx_data.read();
        (
          guard.app_state.orders.clone(),
          guard.order.as_ref().map(|o| o.id),
          guard.session.clone(),
          guard.app_state.config.checkout_step_timeout,
        )
      };
      let (Some(order_id), Some(session)) = (order_id, session) else {
        return Err::<SagaControl, AppError>(AppError::Internal(
          "attach_session_to_order ran without an order or session".to_string(),
        ));
      };
      let write = orders.attach_session(order_id, &session.id, session.payment_intent_id.as_deref());
      let outcome = match limit {
        Some(limit) => match tokio::time::timeout(limit, write).await {
          Ok(result) => result,
          Err(_) => {
            warn!(%order_id, session_id = %session.id, ?limit, "Recording session id on order timed out; continuing.");
            return Ok(SagaControl::Continue);
          }
        },
        None => write.await,
      };
      match outcome {
        Ok(attached) => {
          ctx_data.write().session_attached = attached;
        }
        Err(e) => warn!(%order_id, session_id = %session.id, error = %e, "Could not record session id on order; continuing."),
      }
      Ok::<_, AppError>(SagaControl::Continue)
    })
  });

  s
}

/// Loads every distinct product once, concurrently. Any unresolved id fails
/// the whole request; totals use the prices read here.
async fn resolve_products(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (catalog, items) = {
    let guard = ctx_data.read();
    let validated = guard
      .validated
      .as_ref()
      .ok_or_else(|| AppError::Internal("resolve_products ran before validation".to_string()))?;
    (guard.app_state.catalog.clone(), validated.items.clone())
  };

  let mut distinct_ids: Vec<String> = items.iter().map(|(id, _)| id.clone()).collect();
  distinct_ids.sort();
  distinct_ids.dedup();

  let fetched = try_join_all(distinct_ids.iter().map(|id| {
    let catalog = catalog.clone();
    async move { catalog.get_product(id).await }
  }))
  .await?;

  let mut by_id: HashMap<String, Product> = HashMap::new();
  let mut unresolved = Vec::new();
  for (id, product) in distinct_ids.iter().zip(fetched) {
    match product {
      Some(p) => {
        by_id.insert(id.clone(), p);
      }
      None => unresolved.push(id.clone()),
    }
  }
  if !unresolved.is_empty() {
    warn!(?unresolved, "Checkout references unknown products.");
    return Err(AppError::NotFound(format!("Products not found: {}", unresolved.join(", "))));
  }

  let currency = {
    let mut currencies: Vec<&str> = by_id.values().map(|p| p.currency.as_str()).collect();
    currencies.sort_unstable();
    currencies.dedup();
    match currencies.as_slice() {
      [single] => single.to_string(),
      many => {
        return Err(AppError::Validation(format!(
          "All items must share one currency, found {}",
          many.join(", ")
        )))
      }
    }
  };

  let mut line_items = Vec::with_capacity(items.len());
  let mut resolved_products = Vec::with_capacity(items.len());
  let mut total: i64 = 0;
  for (product_id, quantity) in &items {
    let product = &by_id[product_id];
    let line = NewLineItem {
      product_id: product_id.clone(),
      quantity: *quantity,
      unit_price: product.price,
    };
    let line_total = product
      .price
      .checked_mul(i64::from(*quantity))
      .ok_or_else(|| AppError::Validation(format!("Line total overflows for product {}", product_id)))?;
    total = total
      .checked_add(line_total)
      .ok_or_else(|| AppError::Validation("Order total overflows".to_string()))?;
    line_items.push(line);
    resolved_products.push(product.clone());
  }

  info!(total, currency = %currency, lines = line_items.len(), "Products resolved and priced.");
  let mut guard = ctx_data.write();
  guard.resolved_products = resolved_products;
  guard.line_items = line_items;
  guard.currency = Some(currency);
  guard.total_amount = total;
  Ok(SagaControl::Continue)
}

async fn insert_order(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (orders, new_order) = {
    let guard = ctx_data.read();
    let validated = guard
      .validated
      .as_ref()
      .ok_or_else(|| AppError::Internal("insert_order ran before validation".to_string()))?;
    let currency = guard
      .currency
      .clone()
      .ok_or_else(|| AppError::Internal("insert_order ran before product resolution".to_string()))?;
    let new_order = NewOrder {
      id: Uuid::new_v4(),
      customer_email: validated.customer_email.clone(),
      customer_name: validated.customer_name.clone(),
      total_amount: guard.total_amount,
      currency,
      stripe_payment_intent_id: guard
        .demo
        .then(|| format!("demo_{}", Utc::now().timestamp_millis())),
    };
    (guard.app_state.orders.clone(), new_order)
  };

  // Recorded before the write so compensation can find a row whose insert
  // reply never arrived.
  ctx_data.write().order_id = Some(new_order.id);
  let order = orders.insert_order(&new_order).await?;
  info!(order_id = %order.id, total = order.total_amount, currency = %order.currency, "Pending order created.");
  ctx_data.write().order = Some(order);
  Ok(SagaControl::Continue)
}

async fn insert_line_items(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (orders, order_id, line_items) = {
    let guard = ctx_data.read();
    let order_id = guard
      .order
      .as_ref()
      .map(|o| o.id)
      .ok_or_else(|| AppError::Internal("insert_line_items ran without an order".to_string()))?;
    (guard.app_state.orders.clone(), order_id, guard.line_items.clone())
  };

  let inserted = orders.insert_line_items(order_id, &line_items).await?;
  info!(%order_id, count = inserted.len(), "Order line items created.");
  ctx_data.write().inserted_items = inserted;
  Ok(SagaControl::Continue)
}

/// Builds the session from the snapshot taken in `resolve_products`; the
/// catalog is not read again.
async fn create_payment_session(ctx_data: ContextData<CheckoutCtxData>) -> StepResult {
  let (payments, request) = {
    let guard = ctx_data.read();
    let order = guard
      .order
      .as_ref()
      .ok_or_else(|| AppError::Internal("create_payment_session ran without an order".to_string()))?;
    let customer_email = guard
      .validated
      .as_ref()
      .map(|v| v.customer_email.clone())
      .unwrap_or_else(|| order.customer_email.clone());
    let base = guard.app_state.config.app_base_url.clone();

    let line_items = guard
      .line_items
      .iter()
      .zip(guard.resolved_products.iter())
      .map(|(line, product)| SessionLineItem {
        name: product.name.clone(),
        description: product.description.clone(),
        unit_amount: line.unit_price,
        currency: order.currency.clone(),
        quantity: line.quantity,
      })
      .collect();

    let mut metadata = BTreeMap::new();
    metadata.insert("orderId".to_string(), order.id.to_string());

    let request = CheckoutSessionRequest {
      line_items,
      success_url: format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", base),
      cancel_url: format!("{}/shop", base),
      customer_email,
      metadata,
    };
    (guard.app_state.payments.clone(), request)
  };

  let session = payments.create_checkout_session(&request).await.map_err(|e| {
    warn!(processor = payments.name(), error = %e, "Payment session creation failed.");
    e
  })?;
  info!(session_id = %session.id, processor = payments.name(), "Payment session created.");
  ctx_data.write().session = Some(session);
  Ok(SagaControl::Continue)
}

pub fn register_checkout_saga(registry: &SagaRegistry<AppError>, app_state: &AppState) {
  registry.register_saga(build_checkout_saga(app_state));
  info!("Checkout saga registered.");
}
