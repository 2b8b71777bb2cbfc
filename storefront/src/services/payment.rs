// storefront/src/services/payment.rs

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::errors::Result;

/// One line of a hosted checkout page, copied from the order's snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
  pub name: String,
  pub description: Option<String>,
  /// Minor units.
  pub unit_amount: i64,
  pub currency: String,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
  pub line_items: Vec<SessionLineItem>,
  pub success_url: String,
  pub cancel_url: String,
  pub customer_email: String,
  /// Opaque key/value pairs echoed back in webhook events.
  pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
  pub id: String,
  pub url: String,
  /// Present when the processor creates the payment intent together with the session.
  pub payment_intent_id: Option<String>,
}

/// A hosted payment processor able to open checkout sessions.
///
/// Implementations report rejections as `AppError::Processor` carrying the
/// processor's own message.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession>;

  fn name(&self) -> &'static str;
}
