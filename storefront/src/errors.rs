// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sagaflow::SagaError;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  /// Bad or missing input. Nothing was written.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// Webhook authenticity could not be established.
  #[error("Signature Error: {0}")]
  Signature(String),

  #[error("Persistence Error: {0}")]
  Persistence(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  /// The payment processor rejected or failed the request. Carries its message.
  #[error("Payment Processor Error: {0}")]
  Processor(String),

  #[error("Step '{step}' timed out after {after:?}")]
  Timeout { step: String, after: Duration },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Saga Workflow Error: {source}")]
  Workflow {
    #[source]
    source: SagaError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<SagaError> for AppError {
  fn from(err: SagaError) -> Self {
    match err {
      SagaError::StepTimedOut { step_name, timeout } => AppError::Timeout {
        step: step_name,
        after: timeout,
      },
      other => AppError::Workflow { source: other },
    }
  }
}

impl AppError {
  fn body(&self) -> serde_json::Value {
    match self {
      AppError::Validation(m) | AppError::NotFound(m) => json!({ "error": m }),
      AppError::Signature(_) => json!({ "error": "Invalid signature" }),
      AppError::Persistence(m) => json!({ "error": "Database operation failed", "details": m }),
      AppError::Sqlx(e) => json!({ "error": "Database operation failed", "details": e.to_string() }),
      AppError::Processor(m) => json!({ "error": "Payment processor error", "details": m }),
      AppError::Timeout { step, after } => json!({
        "error": "Operation timed out",
        "details": format!("step '{}' exceeded {} ms", step, after.as_millis())
      }),
      AppError::Config(m) => json!({ "error": "Configuration issue", "details": m }),
      AppError::Workflow { source } => json!({ "error": "Workflow processing error", "details": source.to_string() }),
      AppError::Internal(m) => json!({ "error": "An internal error occurred", "details": m }),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Signature(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Persistence(_)
      | AppError::Sqlx(_)
      | AppError::Processor(_)
      | AppError::Timeout { .. }
      | AppError::Config(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      // Never echo anything about an unauthenticated payload.
      AppError::Signature(_) => tracing::warn!("Rejecting request with invalid signature"),
      AppError::Validation(_) | AppError::NotFound(_) => tracing::info!(application_error = %self, "Responding with client error"),
      _ => tracing::error!(application_error = %self, "Responding with error"),
    }
    HttpResponse::build(self.status_code()).json(self.body())
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_mapping() {
    assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Signature("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Processor("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(AppError::Persistence("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn saga_timeout_becomes_timeout_error() {
    let err = AppError::from(SagaError::StepTimedOut {
      step_name: "create_payment_session".into(),
      timeout: Duration::from_millis(250),
    });
    assert!(matches!(err, AppError::Timeout { ref step, .. } if step == "create_payment_session"));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn processor_message_is_surfaced() {
    let body = AppError::Processor("Invalid currency: xyz".into()).body();
    assert_eq!(body["details"], "Invalid currency: xyz");
  }
}
