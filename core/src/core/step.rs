// sagaflow/src/core/step.rs

//! Defines the structure for a single step within a saga.

use super::ContextData;
use std::time::Duration;

/// Condition evaluated before a step runs. If it returns `true`, the step is skipped.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// Definition of a saga step: its name, optionality, skip condition and timeout.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
  /// Upper bound for the whole forward phase (before + on + after) of the step.
  /// Falls back to the saga's default timeout when `None`.
  pub timeout: Option<Duration>,
  /// Runs without any time limit, ignoring the saga's default.
  pub timeout_exempt: bool,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .field("timeout", &self.timeout)
      .field("timeout_exempt", &self.timeout_exempt)
      .finish()
  }
}
