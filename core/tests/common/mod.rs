// tests/common/mod.rs
#![allow(dead_code)]

use sagaflow::{CompensationHandler, ContextData, SagaControl, SagaError};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub compensated: Vec<String>,
  /// Written by a forward step, read back by its compensation.
  pub reserved_id: Option<u32>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Saga engine error: {0}")]
  Saga(String), // SagaError is not PartialEq, keep its Debug form

  #[error("Test handler failed: {0}")]
  Handler(String),

  #[error("Test compensation failed: {0}")]
  Compensation(String),
}

impl From<SagaError> for TestError {
  fn from(se: SagaError) -> Self {
    TestError::Saga(format!("{:?}", se))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> sagaflow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let step_name_owned = step_name.to_string();
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name_owned.clone());
      tracing::debug!(target: "test_handlers", step = %step_name_owned, "executed, counter: {}", guard.counter);
      if guard.should_stop_at.as_deref() == Some(step_name_owned.as_str()) {
        return Ok(SagaControl::Stop);
      }
      Ok(SagaControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> sagaflow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    let step_name_owned = step_name.to_string();
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name_owned.clone());
      tracing::warn!(target: "test_handlers", step = %step_name_owned, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

/// Compensation that records `label` into `TestContext::compensated`.
pub fn create_recording_compensation(label: &'static str) -> CompensationHandler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().compensated.push(label.to_string());
      COMPENSATION_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      Ok(())
    })
  })
}

pub fn create_failing_compensation(label: &'static str) -> CompensationHandler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().compensated.push(format!("{}!failed", label));
      COMPENSATION_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      Err(TestError::Compensation(label.to_string()))
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub static COMPENSATION_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  COMPENSATION_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
