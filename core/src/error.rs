// sagaflow/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Step '{step_name}' exceeded its timeout of {timeout:?}")]
  StepTimedOut { step_name: String, timeout: Duration },

  #[error("Type mismatch during context downcast (expected {expected_type}, step: '{step_name}')")]
  TypeMismatch { step_name: String, expected_type: String },

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("No saga registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Internal saga engine error: {0}")]
  Internal(String),
}

impl SagaError {
  /// Name of the step the error is attached to, when there is one.
  pub fn step_name(&self) -> Option<&str> {
    match self {
      SagaError::StepNotFound { step_name }
      | SagaError::HandlerMissing { step_name }
      | SagaError::StepTimedOut { step_name, .. }
      | SagaError::TypeMismatch { step_name, .. } => Some(step_name),
      _ => None,
    }
  }
}

impl From<AnyhowError> for SagaError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a SagaError that was boxed into anyhow instead of nesting it.
    match err.downcast::<SagaError>() {
      Ok(saga_err) => saga_err,
      Err(other) => SagaError::HandlerError { source: other },
    }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;
