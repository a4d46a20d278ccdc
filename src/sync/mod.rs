// ============================================================================
// Synchronization Layer - Remote Collection <-> Reactive Cache
// ============================================================================

pub mod collection;
pub mod layer;

pub use collection::{CollectionError, InMemoryOrderCollection, OrderCollection, VersionedOrder};
pub use layer::{display_timestamp, OrderView, StoreCache, SyncLayer};
