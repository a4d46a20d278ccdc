use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::collection::{CollectionError, OrderCollection, VersionedOrder};
use crate::domain::order::sla::sla_minutes;
use crate::store::patch::OrderPatch;
use crate::utils::{deadline, retry, RetryConfig, DEFAULT_DEADLINE};

// ============================================================================
// Order Synchronization Layer
// ============================================================================
//
// Single source of truth bridging the remote order collection and the
// store's in-memory cache. Reads flow one way: collection -> normalization
// -> full cache replace. Writes go through the point-write API and come
// back via the next snapshot; commands never patch the cache themselves.
//
// ============================================================================

/// A normalized cache entry: the persisted document plus derived fields.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub revision: u64,
    pub sla_minutes: i64,
    pub created_at_display: String,
    pub doc: crate::domain::order::OrderDocument,
}

/// The reactive cache shared between the synchronization layer (writer)
/// and the order store (reader).
#[derive(Debug, Default)]
pub struct StoreCache {
    pub orders: Vec<OrderView>,
    /// Set when the live subscription fails; it does not auto-reconnect.
    pub last_error: Option<String>,
}

pub fn display_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn normalize(versioned: VersionedOrder, now: DateTime<Utc>) -> OrderView {
    let sla = sla_minutes(&versioned.doc.created_at, now);
    let created_at_display = match DateTime::parse_from_rfc3339(&versioned.doc.created_at) {
        Ok(parsed) => display_timestamp(&parsed.with_timezone(&Utc)),
        // Opaque timestamps that fail to parse are displayed verbatim.
        Err(_) => versioned.doc.created_at.clone(),
    };
    OrderView {
        revision: versioned.revision,
        sla_minutes: sla,
        created_at_display,
        doc: versioned.doc,
    }
}

pub struct SyncLayer {
    collection: Arc<dyn OrderCollection>,
    cache: Arc<RwLock<StoreCache>>,
}

impl SyncLayer {
    pub fn new(collection: Arc<dyn OrderCollection>) -> Arc<Self> {
        Arc::new(Self {
            collection,
            cache: Arc::new(RwLock::new(StoreCache::default())),
        })
    }

    /// Pull one snapshot, normalize every document, and fully replace the
    /// cached order list. The cache is never merged incrementally.
    pub async fn sync_once(&self) -> Result<(), CollectionError> {
        let snapshot = deadline(DEFAULT_DEADLINE, self.collection.snapshot(), |limit| {
            CollectionError::Unavailable(format!("snapshot timed out after {limit:?}"))
        })
        .await?;
        let now = Utc::now();
        let orders: Vec<OrderView> = snapshot
            .into_iter()
            .map(|versioned| normalize(versioned, now))
            .collect();
        let mut cache = self.cache.write().await;
        tracing::debug!(count = orders.len(), "Publishing order snapshot");
        cache.orders = orders;
        Ok(())
    }

    /// Open the live subscription: re-sync on every change notification.
    /// On failure the error lands in the cache's error slot and the task
    /// stops; operators must re-initialize.
    pub fn spawn_live(self: &Arc<Self>) -> JoinHandle<()> {
        let layer = Arc::clone(self);
        tokio::spawn(async move {
            let mut changes = layer.collection.changes();
            tracing::info!("Order subscription opened");
            loop {
                if let Err(error) = layer.sync_once().await {
                    tracing::error!(error = %error, "Order subscription failed");
                    layer.record_error(error.to_string()).await;
                    return;
                }
                if changes.changed().await.is_err() {
                    let error = CollectionError::SubscriptionClosed;
                    tracing::error!(error = %error, "Order subscription closed");
                    layer.record_error(error.to_string()).await;
                    return;
                }
            }
        })
    }

    async fn record_error(&self, message: String) {
        let mut cache = self.cache.write().await;
        cache.last_error = Some(message);
    }

    /// Momentary snapshot of the cached order list.
    pub async fn current(&self) -> Vec<OrderView> {
        self.cache.read().await.orders.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.cache.read().await.last_error.clone()
    }

    /// Resolve an order by public number or internal document id.
    pub async fn lookup(&self, id: &str) -> Option<OrderView> {
        let cache = self.cache.read().await;
        cache
            .orders
            .iter()
            .find(|view| view.doc.number == id || view.doc.doc_id.to_string() == id)
            .cloned()
    }

    /// Point-write API. `Patch::Keep` fields never reach the remote write,
    /// since the collection treats "absent" and "not included" differently.
    /// Transient collection failures are retried with backoff; conflicts
    /// and missing documents are not.
    pub async fn write(
        &self,
        doc_id: Uuid,
        expected_revision: u64,
        patch: OrderPatch,
    ) -> Result<u64, CollectionError> {
        let config = RetryConfig::default();
        let collection = Arc::clone(&self.collection);
        retry(&config, || {
            let collection = Arc::clone(&collection);
            let patch = patch.clone();
            async move {
                deadline(
                    DEFAULT_DEADLINE,
                    collection.update(doc_id, expected_revision, patch),
                    |limit| CollectionError::Unavailable(format!("write timed out after {limit:?}")),
                )
                .await
            }
        })
        .await
    }

    /// Insert used by the order-placement flow.
    pub async fn insert(
        &self,
        doc: crate::domain::order::OrderDocument,
    ) -> Result<Uuid, CollectionError> {
        deadline(DEFAULT_DEADLINE, self.collection.insert(doc), |limit| {
            CollectionError::Unavailable(format!("insert timed out after {limit:?}"))
        })
        .await
    }

    /// Hard delete plus immediate local eviction. The caller does not wait
    /// for the next snapshot to stop seeing the order.
    pub async fn remove(&self, doc_id: Uuid) -> Result<(), CollectionError> {
        deadline(DEFAULT_DEADLINE, self.collection.delete(doc_id), |limit| {
            CollectionError::Unavailable(format!("delete timed out after {limit:?}"))
        })
        .await?;
        let mut cache = self.cache.write().await;
        cache.orders.retain(|view| view.doc.doc_id != doc_id);
        Ok(())
    }
}
