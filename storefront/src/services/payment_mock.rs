// storefront/src/services/payment_mock.rs
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::payment::{CheckoutSession, CheckoutSessionRequest, PaymentProcessor};
use crate::errors::{AppError, Result};

/// Processor that never leaves the process. Used with `PAYMENT_PROVIDER=mock`
/// and in tests; it keeps every request it accepted.
pub struct MockPaymentProcessor {
  hosted_page_base: String,
  latency: Duration,
  fail_with: Option<String>,
  accepted: Mutex<Vec<CheckoutSessionRequest>>,
}

impl MockPaymentProcessor {
  pub fn new(hosted_page_base: impl Into<String>) -> Self {
    Self {
      hosted_page_base: hosted_page_base.into(),
      latency: Duration::from_millis(0),
      fail_with: None,
      accepted: Mutex::new(Vec::new()),
    }
  }

  /// Every session request is rejected with `message`.
  pub fn failing(mut self, message: impl Into<String>) -> Self {
    self.fail_with = Some(message.into());
    self
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub async fn accepted_requests(&self) -> Vec<CheckoutSessionRequest> {
    self.accepted.lock().await.clone()
  }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
  #[instrument(name = "mock::create_checkout_session", skip_all, fields(lines = request.line_items.len()))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await; // Simulate network latency
    }
    if let Some(message) = &self.fail_with {
      warn!("Mock processor rejecting session: {}", message);
      return Err(AppError::Processor(message.clone()));
    }
    if request.line_items.is_empty() {
      return Err(AppError::Processor("At least one line item is required".to_string()));
    }
    for item in &request.line_items {
      if item.unit_amount <= 0 {
        return Err(AppError::Processor(format!(
          "Amount must be greater than zero for line item '{}'",
          item.name
        )));
      }
      if item.currency.len() != 3 {
        return Err(AppError::Processor(format!("Invalid currency: {}", item.currency)));
      }
    }

    let id = format!("cs_mock_{}", Uuid::new_v4().simple());
    self.accepted.lock().await.push(request.clone());
    info!(session_id = %id, "Mock checkout session created.");
    Ok(CheckoutSession {
      url: format!("{}/mock-checkout/{}", self.hosted_page_base.trim_end_matches('/'), id),
      id,
      payment_intent_id: Some(format!("pi_mock_{}", Uuid::new_v4().simple())),
    })
  }

  fn name(&self) -> &'static str {
    "mock"
  }
}
