// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure domain rules for the entities this crate manages. Each entity has
// its own subdirectory; the order is currently the only one.
//
// ============================================================================

pub mod order;
