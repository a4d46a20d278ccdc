use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::domain::order::OrderDocument;
use crate::store::patch::OrderPatch;
use crate::utils::Transient;

// ============================================================================
// Remote Order Collection
// ============================================================================
//
// The replicated document collection holding one document per order. The
// crate only ever sees it through this trait: point writes with an
// optimistic revision check, hard deletes, and a change feed that marks
// when a fresh full snapshot should be pulled.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("document not found: {0}")]
    Missing(Uuid),

    #[error("revision conflict on {doc_id}: expected {expected}, found {found}")]
    RevisionConflict {
        doc_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("collection unavailable: {0}")]
    Unavailable(String),

    #[error("subscription closed")]
    SubscriptionClosed,
}

impl Transient for CollectionError {
    fn is_transient(&self) -> bool {
        matches!(self, CollectionError::Unavailable(_))
    }
}

/// A document plus its monotonic per-document revision. Writes must quote
/// the revision they read; stale writes are rejected instead of silently
/// overwriting a concurrent command's fields.
#[derive(Debug, Clone)]
pub struct VersionedOrder {
    pub revision: u64,
    pub doc: OrderDocument,
}

#[async_trait]
pub trait OrderCollection: Send + Sync {
    /// Full consistent snapshot, ordered by creation time descending.
    async fn snapshot(&self) -> Result<Vec<VersionedOrder>, CollectionError>;

    /// Change feed: the receiver observes a new value after every commit.
    fn changes(&self) -> watch::Receiver<u64>;

    /// Server-assigns `created_at`, returns the document id.
    async fn insert(&self, doc: OrderDocument) -> Result<Uuid, CollectionError>;

    /// Point write. Returns the document's new revision.
    async fn update(
        &self,
        doc_id: Uuid,
        expected_revision: u64,
        patch: OrderPatch,
    ) -> Result<u64, CollectionError>;

    /// Hard delete; irreversible.
    async fn delete(&self, doc_id: Uuid) -> Result<(), CollectionError>;
}

// ============================================================================
// In-Memory Reference Implementation
// ============================================================================

pub struct InMemoryOrderCollection {
    inner: RwLock<Inner>,
    changes_tx: watch::Sender<u64>,
}

struct Inner {
    docs: HashMap<Uuid, VersionedOrder>,
    clock: u64,
}

impl InMemoryOrderCollection {
    pub fn new() -> Self {
        let (changes_tx, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Inner {
                docs: HashMap::new(),
                clock: 0,
            }),
            changes_tx,
        }
    }
}

impl Default for InMemoryOrderCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderCollection for InMemoryOrderCollection {
    async fn snapshot(&self) -> Result<Vec<VersionedOrder>, CollectionError> {
        let inner = self.inner.read().await;
        let mut docs: Vec<VersionedOrder> = inner.docs.values().cloned().collect();
        // Creation time descending; unparseable timestamps sort last.
        docs.sort_by(|a, b| {
            let key = |v: &VersionedOrder| -> Option<DateTime<Utc>> {
                DateTime::parse_from_rfc3339(&v.doc.created_at)
                    .ok()
                    .map(|t| t.with_timezone(&Utc))
            };
            key(b).cmp(&key(a))
        });
        Ok(docs)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes_tx.subscribe()
    }

    async fn insert(&self, mut doc: OrderDocument) -> Result<Uuid, CollectionError> {
        let mut inner = self.inner.write().await;
        doc.created_at = Utc::now().to_rfc3339();
        let doc_id = doc.doc_id;
        inner.docs.insert(doc_id, VersionedOrder { revision: 1, doc });
        inner.clock += 1;
        let _ = self.changes_tx.send(inner.clock);
        Ok(doc_id)
    }

    async fn update(
        &self,
        doc_id: Uuid,
        expected_revision: u64,
        patch: OrderPatch,
    ) -> Result<u64, CollectionError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .docs
            .get_mut(&doc_id)
            .ok_or(CollectionError::Missing(doc_id))?;
        if entry.revision != expected_revision {
            return Err(CollectionError::RevisionConflict {
                doc_id,
                expected: expected_revision,
                found: entry.revision,
            });
        }
        patch.apply(&mut entry.doc);
        entry.revision += 1;
        let revision = entry.revision;
        inner.clock += 1;
        let _ = self.changes_tx.send(inner.clock);
        Ok(revision)
    }

    async fn delete(&self, doc_id: Uuid) -> Result<(), CollectionError> {
        let mut inner = self.inner.write().await;
        if inner.docs.remove(&doc_id).is_none() {
            return Err(CollectionError::Missing(doc_id));
        }
        inner.clock += 1;
        let _ = self.changes_tx.send(inner.clock);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{
        Customer, OrderStatus, Payment, PaymentMethod, PaymentStatus, ShippingInfo,
    };
    use crate::store::patch::Patch;

    fn doc(number: &str) -> OrderDocument {
        OrderDocument::new(
            number,
            Customer {
                name: "Test".into(),
                email: None,
                phone: None,
            },
            vec![],
            Payment {
                method: PaymentMethod::Card,
                status: PaymentStatus::Paid,
                subtotal: 50.0,
                shipping: 0.0,
                discount: 0.0,
                total: 50.0,
                card: None,
                gateway_txn_id: None,
                failure_reason: None,
                retry_count: 0,
                deadline: None,
                confirmed_at: None,
            },
            ShippingInfo {
                address: "a".into(),
                city: "c".into(),
                district: "d".into(),
                delivery_method: "standard".into(),
                estimated_date: None,
            },
        )
    }

    #[tokio::test]
    async fn insert_assigns_server_timestamp_and_revision() {
        let collection = InMemoryOrderCollection::new();
        let id = collection.insert(doc("ORD-1")).await.unwrap();
        let snapshot = collection.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].doc.doc_id, id);
        assert_eq!(snapshot[0].revision, 1);
        assert!(DateTime::parse_from_rfc3339(&snapshot[0].doc.created_at).is_ok());
    }

    #[tokio::test]
    async fn stale_writes_are_rejected() {
        let collection = InMemoryOrderCollection::new();
        let id = collection.insert(doc("ORD-1")).await.unwrap();

        let first = OrderPatch {
            status: Patch::Set(OrderStatus::InProduction),
            ..Default::default()
        };
        let revision = collection.update(id, 1, first).await.unwrap();
        assert_eq!(revision, 2);

        // A second writer that read revision 1 loses.
        let second = OrderPatch {
            status: Patch::Set(OrderStatus::Cancelled),
            ..Default::default()
        };
        let err = collection.update(id, 1, second).await.unwrap_err();
        assert!(matches!(err, CollectionError::RevisionConflict { .. }));

        let snapshot = collection.snapshot().await.unwrap();
        assert_eq!(snapshot[0].doc.status, OrderStatus::InProduction);
    }

    #[tokio::test]
    async fn snapshot_orders_newest_first() {
        let collection = InMemoryOrderCollection::new();
        collection.insert(doc("ORD-old")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        collection.insert(doc("ORD-new")).await.unwrap();

        let snapshot = collection.snapshot().await.unwrap();
        assert_eq!(snapshot[0].doc.number, "ORD-new");
        assert_eq!(snapshot[1].doc.number, "ORD-old");
    }

    #[tokio::test]
    async fn change_feed_observes_every_commit() {
        let collection = InMemoryOrderCollection::new();
        let mut rx = collection.changes();
        assert_eq!(*rx.borrow(), 0);

        collection.insert(doc("ORD-1")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn delete_is_final() {
        let collection = InMemoryOrderCollection::new();
        let id = collection.insert(doc("ORD-1")).await.unwrap();
        collection.delete(id).await.unwrap();
        assert!(collection.snapshot().await.unwrap().is_empty());
        assert!(matches!(
            collection.delete(id).await.unwrap_err(),
            CollectionError::Missing(_)
        ));
    }
}
