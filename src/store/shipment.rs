use chrono::Utc;

use crate::collaborators::{CollaboratorError, NotificationKind, Shipment, ShipmentRequest};
use crate::domain::order::{
    appended, transition, LifecycleEvent, StoreError, TimelineEntry, TrackingInfo,
};
use crate::store::order_store::{payload, OrderStore};
use crate::store::patch::{OrderPatch, Patch};
use crate::utils::{deadline, DEFAULT_DEADLINE};

// ============================================================================
// Shipment Creation
// ============================================================================
//
// Books a shipment through the carrier aggregator, then commits status,
// tracking and the audit entry as ONE write. A reader never observes an
// order that is `Shipped` without its tracking info, or vice versa.
//
// ============================================================================

impl OrderStore {
    pub async fn create_shipment(
        &self,
        id: &str,
        weight_kg: f64,
        desi: f64,
    ) -> Result<Shipment, StoreError> {
        let order = self.resolve(id).await?;
        let doc = &order.doc;

        let request = ShipmentRequest {
            order_ref: doc.number.clone(),
            customer_name: doc.customer.name.clone(),
            address: format!(
                "{}, {} {}",
                doc.shipping.address, doc.shipping.district, doc.shipping.city
            ),
            weight_kg,
            desi,
            content_description: doc
                .items
                .iter()
                .map(|item| item.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            auto_accept: true,
        };

        let shipment = deadline(
            DEFAULT_DEADLINE,
            self.carrier().create_shipment(&request),
            CollaboratorError::Timeout,
        )
        .await?
        .ok_or_else(|| {
            StoreError::Collaborator(CollaboratorError::Carrier(format!(
                "shipment request declined for {}",
                doc.number
            )))
        })?;

        let (status, _) = transition(
            doc.status,
            &LifecycleEvent::TrackingAdded {
                carrier: shipment.carrier.clone(),
                number: shipment.tracking_number.clone(),
            },
        )?;
        tracing::info!(
            order = %doc.number,
            carrier = %shipment.carrier,
            tracking_number = %shipment.tracking_number,
            price = shipment.price,
            "Shipment created"
        );

        let patch = OrderPatch {
            status: Patch::Set(status),
            tracking: Patch::Set(TrackingInfo {
                carrier: shipment.carrier.clone(),
                number: shipment.tracking_number.clone(),
                added_at: Utc::now(),
            }),
            timeline: Patch::Set(appended(
                &doc.timeline,
                TimelineEntry::now(format!(
                    "Shipment created: {} {}",
                    shipment.carrier, shipment.tracking_number
                )),
            )),
            ..Default::default()
        };
        self.sync().write(doc.doc_id, order.revision, patch).await?;

        if let Some(email) = doc.customer.email.clone() {
            self.notify_best_effort(NotificationKind::ShippingNotification, &email, payload(doc))
                .await;
        }
        Ok(shipment)
    }
}

#[cfg(test)]
mod tests {
    use crate::collaborators::{CollaboratorError, NotificationKind};
    use crate::domain::order::{OrderStatus, StoreError};
    use crate::store::order_store::tests::{order, Harness, StubCarrier};

    #[tokio::test]
    async fn shipment_commits_status_tracking_and_audit_in_one_write() {
        let h = Harness::new();
        h.seed(order("ORD-1", OrderStatus::ReadyForPacking)).await;

        let shipment = h.store.create_shipment("ORD-1", 1.2, 2.0).await.unwrap();
        assert_eq!(shipment.carrier, "Yurtici");

        let view = h.view("ORD-1").await;
        // One commit: revision moved exactly once.
        assert_eq!(view.revision, 2);
        assert_eq!(view.doc.status, OrderStatus::Shipped);
        let tracking = view.doc.tracking.unwrap();
        assert_eq!(tracking.number, shipment.tracking_number);
        assert_eq!(view.doc.timeline.len(), 2);
        assert!(view
            .doc
            .timeline
            .last()
            .unwrap()
            .action
            .starts_with("Shipment created:"));

        let sent = h.notifications.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, NotificationKind::ShippingNotification);
    }

    #[tokio::test]
    async fn declined_shipment_surfaces_and_writes_nothing() {
        let h = Harness::with_carrier(StubCarrier { decline: true });
        h.seed(order("ORD-1", OrderStatus::ReadyForPacking)).await;

        let err = h.store.create_shipment("ORD-1", 1.2, 2.0).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Collaborator(CollaboratorError::Carrier(_))
        ));

        let view = h.view("ORD-1").await;
        assert_eq!(view.revision, 1);
        assert_eq!(view.doc.status, OrderStatus::ReadyForPacking);
        assert!(view.doc.tracking.is_none());
        assert!(h.notifications.sent.lock().unwrap().is_empty());
    }
}
