// ============================================================================
// Order Domain - Lifecycle Rules for the Order Entity
// ============================================================================
//
// This module contains ALL order-specific domain code:
// - Document model and nested value objects (model)
// - Status enum, transition table, lifecycle event funnel (status)
// - Command input types (commands)
// - Error taxonomy (errors)
// - Append-only audit trail primitives (audit)
// - Pure SLA / countdown derivations (sla)
//
// The store and synchronization layers build on this; nothing in here
// performs I/O.
//
// ============================================================================

pub mod audit;
pub mod commands;
pub mod errors;
pub mod model;
pub mod sla;
pub mod status;

// Re-export for convenience
pub use audit::*;
pub use commands::*;
pub use errors::*;
pub use model::*;
pub use sla::*;
pub use status::*;
