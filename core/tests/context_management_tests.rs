// tests/context_management_tests.rs
mod common;

use common::*;
use sagaflow::{ContextData, Saga, SagaControl, SagaError};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_context_data_is_shared_and_modified() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("step1_modify", false, None), ("step2_read_modify", false, None)]);

  saga.on_root("step1_modify", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter = 10;
      guard.message = "SetByStep1".to_string();
      Ok::<SagaControl, SagaError>(SagaControl::Continue)
    })
  });

  saga.on_root("step2_read_modify", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      assert_eq!(guard.counter, 10);
      assert_eq!(guard.message, "SetByStep1");
      guard.counter += 5;
      guard.message.push_str("_ThenStep2");
      Ok::<SagaControl, SagaError>(SagaControl::Continue)
    })
  });

  let initial_ctx = ContextData::new(TestContext::default());
  saga.run(initial_ctx.clone()).await.unwrap();

  let final_guard = initial_ctx.read();
  assert_eq!(final_guard.counter, 15);
  assert_eq!(final_guard.message, "SetByStep1_ThenStep2");
}

#[tokio::test]
#[serial]
async fn test_context_data_clone_shares_data() {
  setup_tracing();
  let original_ctx = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned_ctx = original_ctx.clone();
  assert_eq!(original_ctx.handle_count(), 2);

  {
    original_ctx.write().counter = 5;
  }
  assert_eq!(cloned_ctx.read().counter, 5);

  {
    cloned_ctx.write().counter = 10;
  }
  assert_eq!(original_ctx.read().counter, 10);

  drop(cloned_ctx);
  assert_eq!(original_ctx.handle_count(), 1);
}

#[test]
fn test_mapped_guards_and_snapshot() {
  let ctx = ContextData::new(TestContext::default());
  {
    let mut msg = ctx.map_write(|d| &mut d.message);
    msg.push_str("mapped");
  }
  assert_eq!(&*ctx.map_read(|d| &d.message), "mapped");

  let snap = ctx.snapshot();
  ctx.write().message.clear();
  assert_eq!(snap.message, "mapped");
  assert!(ctx.read().message.is_empty());
}

#[test]
fn test_try_write_fails_while_read_guard_held() {
  let ctx = ContextData::new(TestContext::default());
  let guard = ctx.read();
  assert!(ctx.try_write().is_none());
  assert!(ctx.try_read().is_some());
  drop(guard);
  assert!(ctx.try_write().is_some());
}
