// tests/error_handling_tests.rs
mod common;
use common::*;
use sagaflow::{ContextData, Saga, SagaControl, SagaError};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn test_saga_run_catches_handler_missing() {
  setup_tracing();
  let saga = Saga::<TestContext, TestError>::new(&[("missing", false, None)]);
  let ctx = ContextData::new(TestContext::default());
  let result = saga.run(ctx).await;
  match result {
    Err(TestError::Saga(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Saga(HandlerMissing), got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_saga_with_saga_error_type() {
  setup_tracing();
  let mut saga = Saga::<TestContext, SagaError>::new(&[("task", false, None)]);
  saga.on_root("task", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().counter = 1;
      Ok::<SagaControl, SagaError>(SagaControl::Continue)
    })
  });

  let ctx = ContextData::new(TestContext::default());
  assert!(saga.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().counter, 1);

  let mut failing = Saga::<TestContext, SagaError>::new(&[("fail_task", false, None)]);
  failing.on_root("fail_task", |_ctx| {
    Box::pin(async move { Err::<SagaControl, SagaError>(SagaError::Internal("Intentional SagaError".to_string())) })
  });
  match failing.run(ContextData::new(TestContext::default())).await {
    Err(SagaError::Internal(s)) => assert_eq!(s, "Intentional SagaError"),
    other => panic!("Expected SagaError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_anyhow_errors_convert_to_handler_error() {
  setup_tracing();
  let mut saga = Saga::<TestContext, SagaError>::new(&[("io", false, None)]);
  saga.on_root("io", |_ctx: ContextData<TestContext>| {
    Box::pin(async move { Err::<SagaControl, anyhow::Error>(anyhow::anyhow!("disk on fire")) })
  });

  match saga.run(ContextData::new(TestContext::default())).await {
    Err(SagaError::HandlerError { source }) => assert_eq!(source.to_string(), "disk on fire"),
    other => panic!("Expected SagaError::HandlerError, got {:?}", other),
  }
}

#[test]
fn test_wrapped_saga_error_is_not_nested() {
  let wrapped = anyhow::Error::new(SagaError::StepTimedOut {
    step_name: "slow".to_string(),
    timeout: Duration::from_millis(5),
  });
  let converted = SagaError::from(wrapped);
  assert!(matches!(converted, SagaError::StepTimedOut { .. }));
  assert_eq!(converted.step_name(), Some("slow"));
}
