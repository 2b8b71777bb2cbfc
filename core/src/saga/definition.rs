// sagaflow/src/saga/definition.rs

//! Contains the `Saga<TData, Err>` struct and the methods that build and
//! reshape its step list.

use crate::core::context::{CompensationHandler, Handler};
use crate::core::step::{SkipCondition, StepDef};
use crate::error::SagaError;
use std::collections::HashMap;
use std::time::Duration;

/// A saga over the root data type `TData` whose handlers fail with `Err`.
///
/// `Err` must be constructible from `SagaError` so that engine-level failures
/// (missing handlers, timeouts) surface through the same error type as the
/// handlers' own failures.
pub struct Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Ordered list of step definitions.
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,

  /// Compensating handlers, run in reverse step order after a failure.
  pub(crate) compensate: HashMap<String, Vec<CompensationHandler<TData, Err>>>,

  /// Timeout applied to steps that don't define their own.
  pub(crate) default_step_timeout: Option<Duration>,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Creates a saga from `(name, optional, skip_if)` step definitions.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_cond_opt)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_cond_opt.clone(),
        timeout: None,
        timeout_exempt: false,
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      compensate: HashMap::new(),
      default_step_timeout: None,
    }
  }

  /// Panics if the step is unknown. A typo in a step name is a setup bug, not a runtime error.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Saga setup error: Step '{}' not found in saga definition.", step_name);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!("Saga setup error: Step '{}' already exists in saga definition.", step_name);
    }
  }

  fn step_mut(&mut self, step_name: &str) -> &mut StepDef<TData> {
    self.ensure_step_exists(step_name);
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .unwrap_or_else(|| unreachable!("step presence checked above"))
  }

  fn position_of(&self, step_name: &str) -> usize {
    self.ensure_step_exists(step_name);
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .unwrap_or_else(|| unreachable!("step presence checked above"))
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    let idx = self.position_of(existing_step_name);
    let name_str: String = new_step_name.into();
    self.ensure_step_not_exists(&name_str);
    self.steps.insert(
      idx,
      StepDef {
        name: name_str,
        optional,
        skip_if,
        timeout: None,
        timeout_exempt: false,
      },
    );
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    let idx = self.position_of(existing_step_name);
    let name_str: String = new_step_name.into();
    self.ensure_step_not_exists(&name_str);
    self.steps.insert(
      idx + 1,
      StepDef {
        name: name_str,
        optional,
        skip_if,
        timeout: None,
        timeout_exempt: false,
      },
    );
  }

  /// Removes a step together with all of its handlers. Unknown names are a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Some(idx) = self.steps.iter().position(|s| s.name == step_name) {
      self.steps.remove(idx);
      self.before.remove(step_name);
      self.on.remove(step_name);
      self.after.remove(step_name);
      self.compensate.remove(step_name);
    }
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    self.step_mut(step_name).optional = optional;
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.step_mut(step_name).skip_if = skip_if;
  }

  /// Own limit for a step. `None` falls back to the default timeout.
  pub fn set_step_timeout(&mut self, step_name: &str, timeout: Option<Duration>) {
    let step = self.step_mut(step_name);
    step.timeout = timeout;
    step.timeout_exempt = false;
  }

  /// Lets a step run unbounded even when a default timeout is set.
  pub fn exempt_from_timeout(&mut self, step_name: &str) {
    let step = self.step_mut(step_name);
    step.timeout = None;
    step.timeout_exempt = true;
  }

  /// Timeout for every step without its own. `None` disables it.
  pub fn set_default_step_timeout(&mut self, timeout: Option<Duration>) {
    self.default_step_timeout = timeout;
  }

  pub(crate) fn effective_timeout(&self, step: &StepDef<TData>) -> Option<Duration> {
    if step.timeout_exempt {
      return None;
    }
    step.timeout.or(self.default_step_timeout)
  }

  /// Whether a compensating handler is registered for the step.
  pub fn has_compensation(&self, step_name: &str) -> bool {
    self.compensate.get(step_name).is_some_and(|v| !v.is_empty())
  }
}
