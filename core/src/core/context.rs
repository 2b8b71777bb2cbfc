// sagaflow/src/core/context.rs

//! Handler types stored by a `Saga<TData, Err>`.

use crate::core::context_data::ContextData;
use crate::core::control::SagaControl;
use std::future::Future;
use std::pin::Pin;

/// A forward handler for a saga step.
///
/// A handler takes a clone of the shared `ContextData<TData>` and returns a
/// future resolving to `Result<SagaControl, Err>`.
///
/// Handlers must:
/// 1. Acquire locks (`.read()` / `.write()`) only for as long as they copy data
///    in or out of the context.
/// 2. **Drop every lock guard BEFORE any `.await` suspension point.**
/// 3. Return `SagaControl::Continue` to proceed or `SagaControl::Stop` to halt.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<SagaControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// A compensating handler for a saga step.
///
/// Runs only after a later (or the same) step failed. It must tolerate the
/// forward step having only partially succeeded, e.g. by checking the context
/// for the identifiers the forward step would have written.
pub type CompensationHandler<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;
