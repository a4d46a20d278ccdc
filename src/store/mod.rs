// ============================================================================
// Order Store - Commands over the Synchronized Cache
// ============================================================================

pub mod order_store;
pub mod patch;
mod shipment;

pub use order_store::OrderStore;
pub use patch::{OrderPatch, Patch};
