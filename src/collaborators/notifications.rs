use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::CollaboratorError;

// ============================================================================
// Notification Service Contract
// ============================================================================

/// Template kinds the order lifecycle dispatches. Template content is the
/// notification service's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderConfirmation,
    Cancellation,
    ShippingNotification,
    DeliveryConfirmation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrderConfirmation => "order-confirmation",
            Self::Cancellation => "cancellation",
            Self::ShippingNotification => "shipping-notification",
            Self::DeliveryConfirmation => "delivery-confirmation",
        };
        f.write_str(name)
    }
}

/// Best-effort delivery. Callers never retry; a failed send is either
/// swallowed and logged (side effects riding a state transition) or
/// surfaced (`send_email`), per the command's purpose.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: Value,
    ) -> Result<(), CollaboratorError>;
}
