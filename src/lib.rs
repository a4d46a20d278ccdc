// ============================================================================
// orderflow - Order Lifecycle Store
// ============================================================================
//
// A synchronized, reactive order store over a remote document collection:
// - Table-validated status transitions, funneled through one place
// - Optimistic per-document revisions; stale writes are rejected
// - Partial-update writes that distinguish "untouched" from "cleared"
// - A full-snapshot-replace cache fed by the collection's change feed
// - Side effects (notifications, carrier, loyalty) behind trait seams
//
// ============================================================================

pub mod collaborators;
pub mod domain;
pub mod store;
pub mod sync;
pub mod utils;

pub use store::OrderStore;
pub use sync::{OrderView, StoreCache, SyncLayer};
