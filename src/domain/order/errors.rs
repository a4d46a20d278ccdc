use super::status::OrderStatus;
use crate::collaborators::CollaboratorError;
use crate::sync::collection::CollectionError;

// ============================================================================
// Order Store Error Taxonomy
// ============================================================================

/// A command's input or the order's current state ruled the mutation out.
/// Nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is in terminal status {0}")]
    TerminalStatus(OrderStatus),

    #[error("refund amount must be positive, got {0}")]
    RefundAmountNotPositive(f64),

    #[error("refund of {requested:.2} exceeds the {available:.2} still refundable")]
    RefundExceedsTotal { requested: f64, available: f64 },

    #[error("tag index {index} out of range ({len} tags present)")]
    TagIndexOutOfRange { index: usize, len: usize },

    #[error("customer has no email address on file")]
    MissingEmail,
}

/// Top-level error for every Order Store command.
///
/// `NotFound`, `Validation` and `RemoteWrite` always reject the command.
/// `Collaborator` is surfaced only by commands whose sole purpose is the
/// collaborator call (`send_email`); side effects riding a state transition
/// swallow it at the call site.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("remote write failed: {0}")]
    RemoteWrite(#[from] CollectionError),

    #[error("collaborator call failed: {0}")]
    Collaborator(#[from] CollaboratorError),
}
