// sagaflow/src/saga/execution.rs

//! `Saga::run()`: executes steps in order and, on failure, runs the
//! compensating handlers of every entered step in reverse order.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{SagaControl, SagaOutcome};
use crate::core::step::StepDef;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use std::collections::HashMap;
use tracing::{event, instrument, span, Instrument, Level};

/// Result of running one step's forward phase.
enum StepRun<Err> {
  Skipped,
  Completed,
  Stopped,
  /// `entered` is false when the step failed before any of its handlers ran,
  /// in which case it has nothing of its own to compensate.
  Failed { error: Err, entered: bool },
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Executes the saga against the shared context `ctx_data`.
  ///
  /// On success returns `Completed`, or `Stopped` if a handler asked to halt.
  /// On failure every step whose forward phase was entered (the failing one
  /// included) is compensated, newest first, and the original error is
  /// returned. Compensation failures are logged and don't abort the rollback.
  #[instrument(
        name = "Saga::run",
        skip_all,
        fields(
            saga_context_data_type = %std::any::type_name::<TData>(),
            saga_error_type = %std::any::type_name::<Err>(),
            num_steps = self.steps.len(),
        ),
        err(Display)
    )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<SagaOutcome, Err> {
    event!(Level::DEBUG, "Saga execution starting.");
    let mut entered: Vec<&StepDef<TData>> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "saga_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_step(step_def, &ctx_data).instrument(step_span).await {
        StepRun::Skipped => continue,
        StepRun::Completed => entered.push(step_def),
        StepRun::Stopped => {
          event!(Level::INFO, step_name = %step_def.name, "Saga stopped by a handler.");
          return Ok(SagaOutcome::Stopped);
        }
        StepRun::Failed { error, entered: step_entered } => {
          if step_entered {
            entered.push(step_def);
          }
          event!(
            Level::WARN,
            step_name = %step_def.name,
            error = %error,
            steps_to_compensate = entered.len(),
            "Saga step failed; compensating."
          );
          self.compensate_entered(&entered, &ctx_data).await;
          return Err(error);
        }
      }
    }

    event!(Level::DEBUG, "Saga execution completed successfully.");
    Ok(SagaOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> StepRun<Err> {
    if let Some(skip_cond_fn) = &step_def.skip_if {
      if skip_cond_fn(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped due to 'skip_if' condition.");
        return StepRun::Skipped;
      }
    }

    let step_name_str = step_def.name.as_str();
    let has_handlers = [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name_str).is_some_and(|v| !v.is_empty()));

    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return StepRun::Skipped;
      }
      event!(Level::ERROR, "Non-optional step has no handlers.");
      return StepRun::Failed {
        error: Err::from(SagaError::HandlerMissing {
          step_name: step_def.name.clone(),
        }),
        entered: false,
      };
    }

    let forward = self.run_forward_phases(step_name_str, ctx_data);
    match self.effective_timeout(step_def) {
      Some(limit) => match tokio::time::timeout(limit, forward).await {
        Ok(step_run) => step_run,
        Err(_elapsed) => {
          event!(Level::ERROR, timeout = ?limit, "Step timed out.");
          StepRun::Failed {
            error: Err::from(SagaError::StepTimedOut {
              step_name: step_def.name.clone(),
              timeout: limit,
            }),
            entered: true,
          }
        }
      },
      None => forward.await,
    }
  }

  async fn run_forward_phases(&self, step_name: &str, ctx_data: &ContextData<TData>) -> StepRun<Err> {
    let phases: [(&str, &HashMap<String, Vec<Handler<TData, Err>>>); 3] =
      [("before", &self.before), ("on", &self.on), ("after", &self.after)];

    for (phase_name, phase) in phases {
      let Some(handlers) = phase.get(step_name) else {
        continue;
      };
      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(Level::DEBUG, "handler", phase = phase_name, handler_index = handler_idx);
        match handler_fn(ctx_data.clone()).instrument(handler_span).await {
          Ok(SagaControl::Continue) => {}
          Ok(SagaControl::Stop) => {
            event!(Level::INFO, phase = phase_name, "Stop requested by handler.");
            return StepRun::Stopped;
          }
          Err(e) => {
            event!(Level::ERROR, phase = phase_name, error = %e, "Handler failed.");
            return StepRun::Failed { error: e, entered: true };
          }
        }
      }
    }
    StepRun::Completed
  }

  async fn compensate_entered(&self, entered: &[&StepDef<TData>], ctx_data: &ContextData<TData>) {
    for step_def in entered.iter().rev() {
      let Some(handlers) = self.compensate.get(&step_def.name) else {
        continue;
      };
      let comp_span = span!(Level::INFO, "saga_compensation", step_name = step_def.name.as_str());
      async {
        for handler_fn in handlers.iter().rev() {
          let outcome = match self.effective_timeout(step_def) {
            Some(limit) => match tokio::time::timeout(limit, handler_fn(ctx_data.clone())).await {
              Ok(result) => result,
              Err(_elapsed) => Err(Err::from(SagaError::StepTimedOut {
                step_name: step_def.name.clone(),
                timeout: limit,
              })),
            },
            None => handler_fn(ctx_data.clone()).await,
          };
          match outcome {
            Ok(()) => event!(Level::INFO, "Step compensated."),
            Err(e) => event!(Level::ERROR, error = %e, "Compensation failed; continuing rollback."),
          }
        }
      }
      .instrument(comp_span)
      .await;
    }
  }
}
