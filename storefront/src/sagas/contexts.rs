// storefront/src/sagas/contexts.rs

//! Data carried through each saga. Handlers receive these wrapped in
//! `sagaflow::ContextData`.

use actix_web::web::Bytes;
use uuid::Uuid;

use crate::models::{CheckoutRequest, NewLineItem, Order, OrderLineItem, Product, ValidCheckout};
use crate::sagas::transitions::ReconcileOutcome;
use crate::services::webhook_event::ParsedEvent;
use crate::services::CheckoutSession;
use crate::state::AppState;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub request: CheckoutRequest,
  /// Demo checkouts persist the order but never talk to the processor.
  pub demo: bool,

  pub validated: Option<ValidCheckout>,
  /// Resolved products in request order, one per line.
  pub resolved_products: Vec<Product>,
  pub line_items: Vec<NewLineItem>,
  pub currency: Option<String>,
  pub total_amount: i64,

  /// Chosen before the order insert is attempted; compensation deletes by it.
  pub order_id: Option<Uuid>,
  pub order: Option<Order>,
  pub inserted_items: Vec<OrderLineItem>,
  pub session: Option<CheckoutSession>,
  pub session_attached: bool,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, request: CheckoutRequest, demo: bool) -> Self {
    Self {
      app_state,
      request,
      demo,
      validated: None,
      resolved_products: Vec::new(),
      line_items: Vec::new(),
      currency: None,
      total_amount: 0,
      order_id: None,
      order: None,
      inserted_items: Vec::new(),
      session: None,
      session_attached: false,
    }
  }
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  /// Untrusted until `verify_signature` has passed.
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  /// Unix seconds at receipt; the signature timestamp is checked against it.
  pub received_at: i64,

  pub verified: bool,
  pub event: Option<ParsedEvent>,
  pub outcome: Option<ReconcileOutcome>,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature_header: Option<String>, received_at: i64) -> Self {
    Self {
      app_state,
      raw_body,
      signature_header,
      received_at,
      verified: false,
      event: None,
      outcome: None,
    }
  }
}
