// sagaflow/src/registry.rs

//! `SagaRegistry<E>`: a registry of sagas keyed by their context data type.
//! Sagas are `Saga<TData, HandlerError>`; the registry reports failures as the
//! application-level error type `E`.

use crate::core::context_data::ContextData;
use crate::core::control::SagaOutcome;
use crate::error::SagaError;
use crate::saga::definition::Saga;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Type-erased runner so sagas over different `TData` can share one map.
#[async_trait]
trait AnySagaRunner<ApplicationError>: Send + Sync
where
  ApplicationError: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold a `ContextData<TData>` for the wrapped saga's `TData`.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<SagaOutcome, ApplicationError>;

  fn saga_type_name(&self) -> &'static str;
}

struct SagaWrapper<TData, HandlerError, ApplicationError>
where
  TData: 'static + Send + Sync,
  HandlerError: std::error::Error + From<SagaError> + Send + Sync + 'static,
  ApplicationError: std::error::Error + From<HandlerError> + From<SagaError> + Send + Sync + 'static,
{
  saga: Arc<Saga<TData, HandlerError>>,
  _phantom_app_err: PhantomData<fn() -> ApplicationError>,
}

#[async_trait]
impl<TData, HandlerError, ApplicationError> AnySagaRunner<ApplicationError>
  for SagaWrapper<TData, HandlerError, ApplicationError>
where
  TData: 'static + Send + Sync,
  HandlerError: std::error::Error + From<SagaError> + Send + Sync + 'static,
  ApplicationError: std::error::Error + From<HandlerError> + From<SagaError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<SagaOutcome, ApplicationError> {
    let typed_ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed_ctx_data) => *boxed_ctx_data,
      Err(_) => {
        let expected_type_name = std::any::type_name::<ContextData<TData>>();
        event!(Level::ERROR, "Context object type mismatch. Expected {}.", expected_type_name);
        return Err(ApplicationError::from(SagaError::TypeMismatch {
          step_name: "registry_dispatch".to_string(),
          expected_type: expected_type_name.to_string(),
        }));
      }
    };

    self.saga.run(typed_ctx_data).await.map_err(ApplicationError::from)
  }

  fn saga_type_name(&self) -> &'static str {
    std::any::type_name::<TData>()
  }
}

/// Registry of sagas, one per context data type.
///
/// `ApplicationError` is what `run` returns; it must be constructible from
/// `SagaError` for registry-level failures such as an unregistered type.
pub struct SagaRegistry<ApplicationError = SagaError>
where
  ApplicationError: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn AnySagaRunner<ApplicationError>>>>,
}

impl<ApplicationError> Default for SagaRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<ApplicationError> SagaRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `saga` for its data type, replacing any saga registered earlier for the same type.
  pub fn register_saga<TData, HandlerError>(&self, saga: Saga<TData, HandlerError>)
  where
    TData: 'static + Send + Sync,
    HandlerError: std::error::Error + From<SagaError> + Send + Sync + 'static,
    ApplicationError: From<HandlerError>,
  {
    event!(
      Level::DEBUG,
      tdata_type = %std::any::type_name::<TData>(),
      steps = ?saga.step_names(),
      "Registering saga."
    );
    let wrapper = SagaWrapper::<TData, HandlerError, ApplicationError> {
      saga: Arc::new(saga),
      _phantom_app_err: PhantomData,
    };
    let previous = self.registry.write().insert(TypeId::of::<TData>(), Arc::new(wrapper));
    if previous.is_some() {
      event!(Level::WARN, tdata_type = %std::any::type_name::<TData>(), "Replaced previously registered saga.");
    }
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Context type names of all registered sagas.
  pub fn registered_types(&self) -> Vec<&'static str> {
    self.registry.read().values().map(|runner| runner.saga_type_name()).collect()
  }

  /// Runs the saga registered for `TData`.
  #[instrument(name = "SagaRegistry::run", skip_all, fields(tdata_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<SagaOutcome, ApplicationError>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.registry.read().get(&TypeId::of::<TData>()).cloned();
    let runner = runner.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No saga registered for TData type {}.", type_name);
      ApplicationError::from(SagaError::NotRegistered {
        type_name: type_name.to_string(),
      })
    })?;

    runner.run_erased(Box::new(ctx_data)).await
  }
}
