pub mod context;
pub mod context_data;
pub mod control;
pub mod step;

// Re-export key types for easier access from other sagaflow modules.
pub use context::{CompensationHandler, Handler};
pub use context_data::ContextData;
pub use control::{SagaControl, SagaOutcome};
pub use step::StepDef;
