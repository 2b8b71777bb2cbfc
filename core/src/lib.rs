// sagaflow/src/lib.rs

//! Sagaflow: an asynchronous, type-safe saga engine for Rust.
//!
//! A saga is an ordered list of named steps run against one shared context.
//! Each step may carry:
//!  - `before`/`on`/`after` forward handlers,
//!  - a compensating handler that undoes what the step committed,
//!  - a skip condition evaluated against the context,
//!  - a timeout after which the step counts as failed.
//!
//! When a forward handler fails (or a step times out), the compensating
//! handlers of every step that was entered run in reverse order before the
//! original error is returned to the caller. A `SagaRegistry` keyed by the
//! context data type lets services register sagas once at start-up and run
//! them from request handlers.

pub mod core;
pub mod error;
pub mod registry;
pub mod saga;

pub use crate::core::context::{CompensationHandler, Handler};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{SagaControl, SagaOutcome};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::saga::definition::Saga;

pub use crate::error::{SagaError, SagaResult};

pub use crate::registry::SagaRegistry;

/*
    Typical use:
    1. Define a context struct `MyCtx` for the process.
    2. Create a `Saga<MyCtx, MyError>` with its step list.
    3. Register forward handlers with `.on_root()` (and `.before_root()` /
       `.after_root()` where a step needs them).
    4. Register `.on_compensate()` for every step that commits something
       externally visible.
    5. Register the saga with a `SagaRegistry<MyError>`.
    6. Run it with `registry.run(ContextData::new(my_ctx)).await`.
*/
