use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::collaborators::{
    enrich_new_order, CarrierGateway, CollaboratorError, LoyaltyService, NotificationKind,
    NotificationService,
};
use crate::domain::order::{
    appended, diff_field, transition, Cancellation, CancellationRequest, EditRecord, FieldEdit,
    LifecycleEvent, OrderDocument, OrderEdits, OrderStatus, RefundRecord, RefundRequest,
    RefundStatus, StoreError, Tag, TimelineEntry, TrackingInfo, ValidationError,
};
use crate::store::patch::{OrderPatch, Patch};
use crate::sync::{OrderView, SyncLayer};
use crate::utils::{deadline, DEFAULT_DEADLINE};

// ============================================================================
// Order Store - Lifecycle Commands
// ============================================================================
//
// The only sanctioned way to mutate an order. Every command follows the
// same two-phase shape: (1) compute the full partial-update object locally
// from the cached order, (2) delegate the write to the synchronization
// layer and return once it resolves. The cache itself is only ever
// replaced by the next subscription snapshot, never patched here.
//
// Side effects (notifications, carrier calls) run strictly after the
// committed write and never roll it back on failure.
//
// ============================================================================

pub struct OrderStore {
    sync: Arc<SyncLayer>,
    notifications: Arc<dyn NotificationService>,
    carrier: Arc<dyn CarrierGateway>,
    loyalty: Arc<dyn LoyaltyService>,
}

impl OrderStore {
    pub fn new(
        sync: Arc<SyncLayer>,
        notifications: Arc<dyn NotificationService>,
        carrier: Arc<dyn CarrierGateway>,
        loyalty: Arc<dyn LoyaltyService>,
    ) -> Self {
        Self {
            sync,
            notifications,
            carrier,
            loyalty,
        }
    }

    /// Momentary snapshot of the cached order list.
    pub async fn orders(&self) -> Vec<OrderView> {
        self.sync.current().await
    }

    /// The subscription's error slot, if the live feed has failed.
    pub async fn last_error(&self) -> Option<String> {
        self.sync.last_error().await
    }

    pub(crate) fn carrier(&self) -> &dyn CarrierGateway {
        self.carrier.as_ref()
    }

    /// Resolve by public order number or internal document id.
    pub(crate) async fn resolve(&self, id: &str) -> Result<OrderView, StoreError> {
        self.sync
            .lookup(id)
            .await
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Adjacent order-placement flow: best-effort loyalty enrichment, then
    /// insert. The order reaches the cache with the next snapshot.
    pub async fn place_order(&self, doc: OrderDocument) -> Result<Uuid, StoreError> {
        let doc = enrich_new_order(self.loyalty.as_ref(), doc).await;
        tracing::info!(
            order = %doc.number,
            customer = %doc.customer.name,
            total = doc.payment.total,
            "Placing order"
        );
        Ok(self.sync.insert(doc).await?)
    }

    pub async fn update_status(
        &self,
        id: &str,
        new_status: OrderStatus,
    ) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let (status, entry) = transition(doc.status, &LifecycleEvent::StatusSet(new_status))?;
        tracing::info!(
            order = %doc.number,
            from = %doc.status,
            to = %status,
            "Updating order status"
        );
        let patch = OrderPatch {
            status: Patch::Set(status),
            timeline: Patch::Set(appended(&doc.timeline, TimelineEntry::now(entry))),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;

        if status == OrderStatus::Delivered {
            if let Some(email) = doc.customer.email.clone() {
                self.notify_best_effort(
                    NotificationKind::DeliveryConfirmation,
                    &email,
                    payload(doc),
                )
                .await;
            }
        }
        Ok(())
    }

    /// Attach tracking. Forces `Shipped` regardless of the prior status.
    pub async fn add_tracking(
        &self,
        id: &str,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let (status, entry) = transition(
            doc.status,
            &LifecycleEvent::TrackingAdded {
                carrier: carrier.to_string(),
                number: tracking_number.to_string(),
            },
        )?;
        tracing::info!(
            order = %doc.number,
            carrier = %carrier,
            tracking_number = %tracking_number,
            "Adding tracking"
        );
        let patch = OrderPatch {
            status: Patch::Set(status),
            tracking: Patch::Set(TrackingInfo {
                carrier: carrier.to_string(),
                number: tracking_number.to_string(),
                added_at: Utc::now(),
            }),
            timeline: Patch::Set(appended(&doc.timeline, TimelineEntry::now(entry))),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    pub async fn add_tag(&self, id: &str, label: &str, color: &str) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let tag = Tag {
            label: label.to_string(),
            color: color.to_string(),
            added_at: Utc::now(),
        };
        tracing::info!(order = %doc.number, label = %label, "Adding tag");
        let patch = OrderPatch {
            tags: Patch::Set(appended(&doc.tags, tag)),
            timeline: Patch::Set(appended(
                &doc.timeline,
                TimelineEntry::now(format!("Tag added: {label}")),
            )),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    pub async fn remove_tag(&self, id: &str, index: usize) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        if index >= doc.tags.len() {
            return Err(ValidationError::TagIndexOutOfRange {
                index,
                len: doc.tags.len(),
            }
            .into());
        }
        let mut tags = doc.tags.clone();
        let removed = tags.remove(index);
        tracing::info!(order = %doc.number, label = %removed.label, "Removing tag");
        let patch = OrderPatch {
            tags: Patch::Set(tags),
            timeline: Patch::Set(appended(
                &doc.timeline,
                TimelineEntry::now(format!("Tag removed: {}", removed.label)),
            )),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    /// Apply proposed field edits. Only genuinely changed fields produce
    /// edit-history records; zero changes means no write at all.
    pub async fn edit_order(&self, id: &str, edits: OrderEdits) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let mut records: Vec<EditRecord> = Vec::new();
        let mut patch = OrderPatch::default();

        match edits.customer_phone {
            FieldEdit::Set(phone) => {
                let proposed = Some(phone.clone());
                if let Some(record) = diff_field("customer.phone", &doc.customer.phone, &proposed)
                {
                    records.push(record);
                    patch.customer_phone = Patch::Set(phone);
                }
            }
            FieldEdit::Clear => {
                if let Some(record) = diff_field("customer.phone", &doc.customer.phone, &None) {
                    records.push(record);
                    patch.customer_phone = Patch::Clear;
                }
            }
            FieldEdit::Untouched => {}
        }
        if let Some(address) = edits.shipping_address {
            if let Some(record) = diff_field("shipping.address", &doc.shipping.address, &address) {
                records.push(record);
                patch.shipping_address = Patch::Set(address);
            }
        }
        if let Some(city) = edits.shipping_city {
            if let Some(record) = diff_field("shipping.city", &doc.shipping.city, &city) {
                records.push(record);
                patch.shipping_city = Patch::Set(city);
            }
        }
        match edits.gift_note {
            FieldEdit::Set(note) => {
                let proposed = Some(note.clone());
                if let Some(record) = diff_field("gift_note", &doc.gift_note, &proposed) {
                    records.push(record);
                    patch.gift_note = Patch::Set(note);
                }
            }
            FieldEdit::Clear => {
                if let Some(record) = diff_field("gift_note", &doc.gift_note, &None) {
                    records.push(record);
                    patch.gift_note = Patch::Clear;
                }
            }
            FieldEdit::Untouched => {}
        }
        match edits.special_notes {
            FieldEdit::Set(notes) => {
                let proposed = Some(notes.clone());
                if let Some(record) = diff_field("special_notes", &doc.special_notes, &proposed) {
                    records.push(record);
                    patch.special_notes = Patch::Set(notes);
                }
            }
            FieldEdit::Clear => {
                if let Some(record) = diff_field("special_notes", &doc.special_notes, &None) {
                    records.push(record);
                    patch.special_notes = Patch::Clear;
                }
            }
            FieldEdit::Untouched => {}
        }
        if let Some(next) = edits.status {
            if next != doc.status {
                let (validated, _) = transition(doc.status, &LifecycleEvent::StatusSet(next))?;
                if let Some(record) = diff_field("status", &doc.status, &validated) {
                    records.push(record);
                }
                patch.status = Patch::Set(validated);
            }
        }
        if let Some(at) = edits.payment_confirmed_at {
            let proposed = Some(at);
            if let Some(record) =
                diff_field("payment.confirmed_at", &doc.payment.confirmed_at, &proposed)
            {
                records.push(record);
                patch.payment_confirmed_at = Patch::Set(at);
            }
        }

        if records.is_empty() {
            tracing::debug!(order = %doc.number, "Edit requested but no fields changed");
            return Ok(());
        }

        let changed = records.len();
        let summary = if changed == 1 {
            "1 field changed".to_string()
        } else {
            format!("{changed} fields changed")
        };
        patch.edit_history = Patch::Set([doc.edit_history.clone(), records].concat());
        patch.timeline = Patch::Set(appended(&doc.timeline, TimelineEntry::now(summary)));
        tracing::info!(order = %doc.number, fields = changed, "Editing order");
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    /// Record a refund. A 100% refund also moves the order to `Refunded`.
    pub async fn start_refund(&self, id: &str, request: RefundRequest) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        if request.amount <= 0.0 {
            return Err(ValidationError::RefundAmountNotPositive(request.amount).into());
        }
        let available = doc.payment.total - doc.refunded_total();
        if request.amount > available {
            return Err(ValidationError::RefundExceedsTotal {
                requested: request.amount,
                available,
            }
            .into());
        }

        let record = RefundRecord {
            id: Uuid::new_v4(),
            reason: request.reason.clone(),
            amount: request.amount,
            percentage: request.percentage,
            method: request.method.clone(),
            notes: request.notes.clone(),
            created_at: Utc::now(),
            status: RefundStatus::Pending,
        };
        let mut patch = OrderPatch {
            refunds: Patch::Set(appended(&doc.refunds, record)),
            ..Default::default()
        };
        let entry_text = if request.percentage == 100 {
            let (status, text) = transition(
                doc.status,
                &LifecycleEvent::RefundCompleted {
                    amount: request.amount,
                    reason: request.reason.clone(),
                },
            )?;
            patch.status = Patch::Set(status);
            text
        } else {
            format!("Refund requested: {:.2} ({})", request.amount, request.reason)
        };
        let entry = match &request.notes {
            Some(note) => TimelineEntry::with_note(entry_text, note.clone()),
            None => TimelineEntry::now(entry_text),
        };
        patch.timeline = Patch::Set(appended(&doc.timeline, entry));
        tracing::info!(
            order = %doc.number,
            amount = request.amount,
            percentage = request.percentage,
            "Starting refund"
        );
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    /// Domain cancellation of the order. The customer notification, when
    /// requested, runs after the committed write and its failure never
    /// rolls the cancellation back.
    pub async fn cancel_order(
        &self,
        id: &str,
        request: CancellationRequest,
    ) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let (status, entry) = transition(
            doc.status,
            &LifecycleEvent::Cancelled {
                reason: request.reason.clone(),
            },
        )?;
        let cancellation = Cancellation {
            reason: request.reason.clone(),
            notify_customer: request.notify_customer,
            refund_payment: request.refund_payment,
            notes: request.notes.clone(),
            cancelled_at: Utc::now(),
        };
        tracing::info!(order = %doc.number, reason = %request.reason, "Cancelling order");
        let entry = match &request.notes {
            Some(note) => TimelineEntry::with_note(entry, note.clone()),
            None => TimelineEntry::now(entry),
        };
        let patch = OrderPatch {
            status: Patch::Set(status),
            cancellation: Patch::Set(cancellation),
            timeline: Patch::Set(appended(&doc.timeline, entry)),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;

        if request.notify_customer {
            if let Some(email) = doc.customer.email.clone() {
                self.notify_best_effort(NotificationKind::Cancellation, &email, payload(doc))
                    .await;
            }
        }
        Ok(())
    }

    /// Hard delete: the document ceases to exist, so no audit entry is
    /// possible. The local cache is evicted immediately.
    pub async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        tracing::warn!(order = %order.doc.number, "Hard-deleting order");
        self.sync.remove(order.doc.doc_id).await?;
        Ok(())
    }

    /// Send the order-confirmation notification. This command exists for
    /// the notification, so its failure is surfaced, not swallowed.
    pub async fn send_email(&self, id: &str) -> Result<(), StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;
        let email = doc
            .customer
            .email
            .clone()
            .ok_or(ValidationError::MissingEmail)?;
        self.notify(NotificationKind::OrderConfirmation, &email, payload(doc))
            .await?;
        tracing::info!(order = %doc.number, recipient = %email, "Confirmation email sent");
        let patch = OrderPatch {
            timeline: Patch::Set(appended(
                &doc.timeline,
                TimelineEntry::now(format!("Confirmation email sent to {email}")),
            )),
            ..Default::default()
        };
        self.sync.write(doc.doc_id, order.revision, patch).await?;
        Ok(())
    }

    pub(crate) async fn notify(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: Value,
    ) -> Result<(), CollaboratorError> {
        deadline(
            DEFAULT_DEADLINE,
            self.notifications.send(kind, recipient, payload),
            CollaboratorError::Timeout,
        )
        .await
    }

    pub(crate) async fn notify_best_effort(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: Value,
    ) {
        if let Err(error) = self.notify(kind, recipient, payload).await {
            tracing::warn!(
                kind = %kind,
                recipient = %recipient,
                error = %error,
                "Notification failed; state transition stands"
            );
        }
    }

    pub(crate) fn sync(&self) -> &SyncLayer {
        &self.sync
    }
}

pub(crate) fn payload(doc: &OrderDocument) -> Value {
    serde_json::json!({
        "order": doc.number,
        "customer": doc.customer.name,
        "total": doc.payment.total,
    })
}

// ============================================================================
// Tests
// ============================================================================
