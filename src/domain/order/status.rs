use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ValidationError;

// ============================================================================
// Order Status & Lifecycle Transitions
// ============================================================================
//
// Every status write in the crate funnels through `transition()`. Commands
// never assign `OrderDocument::status` directly; they describe what happened
// as a `LifecycleEvent` and get back the resulting status plus the timeline
// text for the audit trail.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    PendingPayment,
    AwaitingPrep,
    InProduction,
    ReadyForPacking,
    HeatHold,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Terminal statuses accept no further lifecycle events.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded | Self::Delivered)
    }

    /// The sanctioned transition table for direct status writes.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            PendingPayment => matches!(next, AwaitingPrep | Cancelled),
            AwaitingPrep => matches!(next, InProduction | Cancelled),
            InProduction => matches!(next, ReadyForPacking | HeatHold | Cancelled),
            HeatHold => matches!(next, ReadyForPacking | Cancelled),
            ReadyForPacking => matches!(next, Shipped | Cancelled),
            Shipped => matches!(next, Delivered),
            Delivered | Cancelled | Refunded => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PendingPayment => "PendingPayment",
            Self::AwaitingPrep => "AwaitingPrep",
            Self::InProduction => "InProduction",
            Self::ReadyForPacking => "ReadyForPacking",
            Self::HeatHold => "HeatHold",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Normal,
}

/// What happened to an order, as far as its status is concerned.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// An operator set the status directly; validated against the table.
    StatusSet(OrderStatus),
    /// Tracking was attached. Forces `Shipped` from any prior status.
    TrackingAdded { carrier: String, number: String },
    /// A 100% refund completed.
    RefundCompleted { amount: f64, reason: String },
    /// The order was cancelled by an operator.
    Cancelled { reason: String },
}

/// Resolve a lifecycle event against the current status.
///
/// Returns the new status and the timeline entry text describing it.
pub fn transition(
    current: OrderStatus,
    event: &LifecycleEvent,
) -> Result<(OrderStatus, String), ValidationError> {
    match event {
        LifecycleEvent::StatusSet(next) => {
            if current.is_terminal() {
                return Err(ValidationError::TerminalStatus(current));
            }
            if !current.can_transition_to(*next) {
                return Err(ValidationError::InvalidTransition {
                    from: current,
                    to: *next,
                });
            }
            Ok((*next, format!("Status changed: {current} -> {next}")))
        }
        LifecycleEvent::TrackingAdded { carrier, number } => Ok((
            OrderStatus::Shipped,
            format!("Tracking added: {carrier} {number}"),
        )),
        LifecycleEvent::RefundCompleted { amount, reason } => {
            if current.is_terminal() {
                return Err(ValidationError::TerminalStatus(current));
            }
            Ok((
                OrderStatus::Refunded,
                format!("Refund requested: {amount:.2} ({reason})"),
            ))
        }
        LifecycleEvent::Cancelled { reason } => {
            if current.is_terminal() {
                return Err(ValidationError::TerminalStatus(current));
            }
            Ok((OrderStatus::Cancelled, format!("Order cancelled: {reason}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_allows_the_documented_paths() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition_to(AwaitingPrep));
        assert!(AwaitingPrep.can_transition_to(InProduction));
        assert!(InProduction.can_transition_to(HeatHold));
        assert!(HeatHold.can_transition_to(ReadyForPacking));
        assert!(ReadyForPacking.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn table_rejects_backwards_and_terminal_moves() {
        use OrderStatus::*;
        assert!(!Shipped.can_transition_to(InProduction));
        assert!(!Cancelled.can_transition_to(InProduction));
        assert!(!Refunded.can_transition_to(AwaitingPrep));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!InProduction.can_transition_to(InProduction));
    }

    #[test]
    fn status_set_rejects_invalid_transition() {
        let err = transition(
            OrderStatus::Shipped,
            &LifecycleEvent::StatusSet(OrderStatus::InProduction),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTransition { .. }));
    }

    #[test]
    fn tracking_forces_shipped_from_anywhere() {
        let event = LifecycleEvent::TrackingAdded {
            carrier: "Yurtici".into(),
            number: "YT123".into(),
        };
        for current in [
            OrderStatus::PendingPayment,
            OrderStatus::HeatHold,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let (status, entry) = transition(current, &event).unwrap();
            assert_eq!(status, OrderStatus::Shipped);
            assert!(entry.contains("YT123"));
        }
    }

    #[test]
    fn cancel_blocked_in_terminal_states() {
        let event = LifecycleEvent::Cancelled {
            reason: "duplicate".into(),
        };
        for current in [
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
            OrderStatus::Delivered,
        ] {
            let err = transition(current, &event).unwrap_err();
            assert!(matches!(err, ValidationError::TerminalStatus(_)));
        }
        // Shipped orders can still be cancelled by an operator.
        let (status, _) = transition(OrderStatus::Shipped, &event).unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn full_refund_moves_to_refunded() {
        let event = LifecycleEvent::RefundCompleted {
            amount: 820.0,
            reason: "Kalite Sorunu".into(),
        };
        let (status, entry) = transition(OrderStatus::InProduction, &event).unwrap();
        assert_eq!(status, OrderStatus::Refunded);
        assert!(entry.contains("820.00"));
        assert!(entry.contains("Kalite Sorunu"));
    }
}
