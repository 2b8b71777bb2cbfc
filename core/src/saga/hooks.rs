// sagaflow/src/saga/hooks.rs

//! Registration of forward (`before`, `on`, `after`) and compensating
//! handlers. User handlers may fail with any error convertible into the
//! saga's `Err`.

use tracing::{event, Level};

use crate::core::context::{CompensationHandler, Handler};
use crate::core::context_data::ContextData;
use crate::core::control::SagaControl;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use std::future::Future;

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  fn wrap_forward<F, UserProvidedErr>(
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Handler<TData, Err>
  where
    F: Future<Output = Result<SagaControl, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    })
  }

  /// Registers a `before` handler for a step.
  pub fn before_root<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<SagaControl, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap_forward(handler_fn);
    self.before.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers an `on` handler for a step. This is where a step does its work.
  pub fn on_root<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<SagaControl, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap_forward(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers an `after` handler for a step.
  pub fn after_root<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<SagaControl, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap_forward(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers the compensating action for a step.
  ///
  /// The handler runs when this step or any later step fails. Several
  /// compensations on one step run in reverse registration order.
  pub fn on_compensate<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<(), UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: CompensationHandler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.compensate.entry(step_name.to_string()).or_default().push(handler);
    event!(Level::DEBUG, %step_name, "Compensation handler registered.");
  }
}
