// sagaflow/src/core/control.rs

//! Signals for controlling saga flow and the outcome of a saga run.

/// Signal from a forward handler indicating whether the saga should continue or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaControl {
  /// Continue with the remaining handlers of this step and the following steps.
  Continue,
  /// Halt the saga immediately. This is a graceful stop: nothing is compensated.
  Stop,
}

/// Outcome of a saga run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaOutcome {
  /// Every non-skipped step ran to completion.
  Completed,
  /// A handler returned `SagaControl::Stop`.
  Stopped,
}
