// storefront/src/services/webhook_event.rs

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::errors::{AppError, Result};

pub const SESSION_COMPLETED: &str = "checkout.session.completed";
pub const SESSION_EXPIRED: &str = "checkout.session.expired";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Deserialize)]
struct RawEvent {
  id: String,
  #[serde(rename = "type")]
  event_type: String,
  data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
  object: JsonValue,
}

/// What a verified processor event asks the reconciler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
  SessionCompleted {
    session_id: Option<String>,
    order_ref: Option<String>,
    payment_intent_id: Option<String>,
  },
  SessionExpired {
    session_id: Option<String>,
    order_ref: Option<String>,
  },
  PaymentFailed {
    payment_intent_id: String,
  },
  Other {
    event_type: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
  pub id: String,
  pub event_type: String,
  pub event: WebhookEvent,
}

fn str_field(object: &JsonValue, key: &str) -> Option<String> {
  object.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn order_ref(object: &JsonValue) -> Option<String> {
  object
    .get("metadata")
    .and_then(|m| m.get("orderId"))
    .and_then(JsonValue::as_str)
    .map(str::to_string)
}

/// Parses an authenticated webhook body.
pub fn parse_event(body: &[u8]) -> Result<ParsedEvent> {
  let raw: RawEvent =
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Malformed webhook event: {}", e)))?;
  let object = &raw.data.object;

  let event = match raw.event_type.as_str() {
    SESSION_COMPLETED => WebhookEvent::SessionCompleted {
      session_id: str_field(object, "id"),
      order_ref: order_ref(object),
      // Either a bare id or an expanded PaymentIntent object.
      payment_intent_id: str_field(object, "payment_intent")
        .or_else(|| object.get("payment_intent").and_then(|pi| str_field(pi, "id"))),
    },
    SESSION_EXPIRED => WebhookEvent::SessionExpired {
      session_id: str_field(object, "id"),
      order_ref: order_ref(object),
    },
    PAYMENT_FAILED => match str_field(object, "id") {
      Some(payment_intent_id) => WebhookEvent::PaymentFailed { payment_intent_id },
      None => return Err(AppError::Validation("payment_failed event without a payment intent id".to_string())),
    },
    other => WebhookEvent::Other {
      event_type: other.to_string(),
    },
  };

  Ok(ParsedEvent {
    id: raw.id,
    event_type: raw.event_type,
    event,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn parses_completed_session() {
    let body = json!({
      "id": "evt_1",
      "type": "checkout.session.completed",
      "data": { "object": { "id": "cs_1", "payment_intent": "pi_1", "metadata": { "orderId": "ord" } } }
    })
    .to_string();
    let parsed = parse_event(body.as_bytes()).unwrap();
    assert_eq!(
      parsed.event,
      WebhookEvent::SessionCompleted {
        session_id: Some("cs_1".into()),
        order_ref: Some("ord".into()),
        payment_intent_id: Some("pi_1".into()),
      }
    );
  }

  #[test]
  fn unknown_types_are_other() {
    let body = json!({ "id": "evt_2", "type": "customer.created", "data": { "object": {} } }).to_string();
    let parsed = parse_event(body.as_bytes()).unwrap();
    assert!(matches!(parsed.event, WebhookEvent::Other { ref event_type } if event_type == "customer.created"));
  }

  #[test]
  fn malformed_body_is_validation_error() {
    assert!(matches!(parse_event(b"not json"), Err(AppError::Validation(_))));
  }
}
