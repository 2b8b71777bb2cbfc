// storefront/src/sagas/transitions.rs

//! Order status transition table for processor signals.
//!
//! | current   | completed | expired   | payment failed |
//! |-----------|-----------|-----------|----------------|
//! | pending   | paid      | cancelled | failed         |
//! | paid      | no-op     | illegal   | illegal        |
//! | cancelled | illegal   | no-op     | illegal        |
//! | failed    | illegal   | illegal   | no-op          |

use serde::Serialize;
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSignal {
  SessionCompleted,
  SessionExpired,
  PaymentFailed,
}

impl StatusSignal {
  pub fn target(self) -> OrderStatus {
    match self {
      StatusSignal::SessionCompleted => OrderStatus::Paid,
      StatusSignal::SessionExpired => OrderStatus::Cancelled,
      StatusSignal::PaymentFailed => OrderStatus::Failed,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
  Apply(OrderStatus),
  /// The order already carries the signal's status. Duplicate delivery.
  AlreadyApplied,
  /// Leaving a terminal status. Logged, never applied.
  Illegal { from: OrderStatus, to: OrderStatus },
}

pub fn decide(current: OrderStatus, signal: StatusSignal) -> TransitionDecision {
  let target = signal.target();
  match current {
    c if c == target => TransitionDecision::AlreadyApplied,
    OrderStatus::Pending => TransitionDecision::Apply(target),
    from => TransitionDecision::Illegal { from, to: target },
  }
}

/// What reconciling one verified event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileOutcome {
  Applied { order_id: Uuid, from: OrderStatus, to: OrderStatus },
  Duplicate { order_id: Uuid, status: OrderStatus },
  Illegal { order_id: Uuid, from: OrderStatus, attempted: OrderStatus },
  OrderNotFound { signal: StatusSignal },
  Ignored { event_type: String },
}
