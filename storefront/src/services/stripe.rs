// storefront/src/services/stripe.rs

//! Minimal Stripe Checkout client: one form-encoded `POST /v1/checkout/sessions`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument};

use super::payment::{CheckoutSession, CheckoutSessionRequest, PaymentProcessor};
use crate::errors::{AppError, Result};

#[derive(Clone)]
pub struct StripeClient {
  http: Client,
  api_base: String,
  secret_key: String,
}

#[derive(Deserialize)]
struct SessionResponse {
  id: String,
  url: Option<String>,
  /// A bare id, an expanded object, or null until the customer pays.
  #[serde(default)]
  payment_intent: serde_json::Value,
}

impl SessionResponse {
  fn payment_intent_id(&self) -> Option<String> {
    match &self.payment_intent {
      serde_json::Value::String(id) => Some(id.clone()),
      serde_json::Value::Object(obj) => obj.get("id").and_then(|v| v.as_str()).map(str::to_string),
      _ => None,
    }
  }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
  message: Option<String>,
  #[serde(rename = "type")]
  kind: Option<String>,
}

impl StripeClient {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      http,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }
}

/// Flattens a session request into Stripe's bracketed form encoding.
pub(crate) fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
  let mut form: Vec<(String, String)> = vec![
    ("payment_method_types[0]".into(), "card".into()),
    ("mode".into(), "payment".into()),
    ("success_url".into(), request.success_url.clone()),
    ("cancel_url".into(), request.cancel_url.clone()),
    ("customer_email".into(), request.customer_email.clone()),
  ];
  for (key, value) in &request.metadata {
    form.push((format!("metadata[{}]", key), value.clone()));
  }
  for (i, item) in request.line_items.iter().enumerate() {
    let prefix = format!("line_items[{}]", i);
    form.push((format!("{}[price_data][currency]", prefix), item.currency.to_ascii_lowercase()));
    form.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
    if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
      form.push((
        format!("{}[price_data][product_data][description]", prefix),
        description.to_string(),
      ));
    }
    form.push((format!("{}[price_data][unit_amount]", prefix), item.unit_amount.to_string()));
    form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
  }
  form
}

#[async_trait]
impl PaymentProcessor for StripeClient {
  #[instrument(name = "stripe::create_checkout_session", skip_all, fields(lines = request.line_items.len()))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    let url = format!("{}/v1/checkout/sessions", self.api_base);
    let response = self
      .http
      .post(&url)
      .bearer_auth(&self.secret_key)
      .form(&session_form(request))
      .send()
      .await
      .map_err(|e| {
        error!("Stripe request failed: {}", e);
        AppError::Processor(format!("Stripe request failed: {}", e))
      })?;

    let status = response.status();
    if !status.is_success() {
      let raw = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<ErrorEnvelope>(&raw)
        .ok()
        .and_then(|env| env.error.message.or(env.error.kind))
        .unwrap_or_else(|| format!("HTTP {}", status));
      error!(%status, "Stripe rejected checkout session: {}", message);
      return Err(AppError::Processor(message));
    }

    let session: SessionResponse = response
      .json()
      .await
      .map_err(|e| AppError::Processor(format!("Unreadable Stripe response: {}", e)))?;
    let url = session
      .url
      .clone()
      .ok_or_else(|| AppError::Processor(format!("Stripe session {} has no redirect URL", session.id)))?;
    let payment_intent_id = session.payment_intent_id();
    info!(session_id = %session.id, payment_intent = ?payment_intent_id, "Stripe checkout session created.");
    Ok(CheckoutSession {
      id: session.id,
      url,
      payment_intent_id,
    })
  }

  fn name(&self) -> &'static str {
    "stripe"
  }
}
