use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::{
    Cancellation, CostAnalysis, EditRecord, OrderDocument, OrderStatus, PaymentStatus,
    RefundRecord, Tag, TimelineEntry, TrackingInfo,
};

// ============================================================================
// Partial-Update Encoding
// ============================================================================
//
// The remote collection treats "field not included" and "field cleared"
// differently, so the write path needs a three-way encoding. `Keep`
// serializes as omission and never reaches the document.
//
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Patch<T> {
    /// Field not touched by this write.
    #[default]
    Keep,
    /// Field set to a new value.
    Set(T),
    /// Field intentionally cleared (optional fields only).
    Clear,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

/// The full partial-update object a command computes locally from the
/// cached order before delegating the write to the synchronization layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub status: Patch<OrderStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub tracking: Patch<TrackingInfo>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub tags: Patch<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub timeline: Patch<Vec<TimelineEntry>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub edit_history: Patch<Vec<EditRecord>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub refunds: Patch<Vec<RefundRecord>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub cancellation: Patch<Cancellation>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub customer_phone: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub shipping_address: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub shipping_city: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub gift_note: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub special_notes: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub payment_status: Patch<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub payment_confirmed_at: Patch<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub cost_analysis: Patch<CostAnalysis>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_keep()
            && self.tracking.is_keep()
            && self.tags.is_keep()
            && self.timeline.is_keep()
            && self.edit_history.is_keep()
            && self.refunds.is_keep()
            && self.cancellation.is_keep()
            && self.customer_phone.is_keep()
            && self.shipping_address.is_keep()
            && self.shipping_city.is_keep()
            && self.gift_note.is_keep()
            && self.special_notes.is_keep()
            && self.payment_status.is_keep()
            && self.payment_confirmed_at.is_keep()
            && self.cost_analysis.is_keep()
    }

    /// Fold this patch into a document. `Keep` fields are untouched;
    /// `Clear` resets optional fields and is a no-op on required ones.
    pub fn apply(self, doc: &mut OrderDocument) {
        if let Patch::Set(status) = self.status {
            doc.status = status;
        }
        match self.tracking {
            Patch::Set(tracking) => doc.tracking = Some(tracking),
            Patch::Clear => doc.tracking = None,
            Patch::Keep => {}
        }
        if let Patch::Set(tags) = self.tags {
            doc.tags = tags;
        }
        if let Patch::Set(timeline) = self.timeline {
            doc.timeline = timeline;
        }
        if let Patch::Set(edit_history) = self.edit_history {
            doc.edit_history = edit_history;
        }
        if let Patch::Set(refunds) = self.refunds {
            doc.refunds = refunds;
        }
        match self.cancellation {
            Patch::Set(cancellation) => doc.cancellation = Some(cancellation),
            Patch::Clear => doc.cancellation = None,
            Patch::Keep => {}
        }
        match self.customer_phone {
            Patch::Set(phone) => doc.customer.phone = Some(phone),
            Patch::Clear => doc.customer.phone = None,
            Patch::Keep => {}
        }
        if let Patch::Set(address) = self.shipping_address {
            doc.shipping.address = address;
        }
        if let Patch::Set(city) = self.shipping_city {
            doc.shipping.city = city;
        }
        match self.gift_note {
            Patch::Set(note) => doc.gift_note = Some(note),
            Patch::Clear => doc.gift_note = None,
            Patch::Keep => {}
        }
        match self.special_notes {
            Patch::Set(notes) => doc.special_notes = Some(notes),
            Patch::Clear => doc.special_notes = None,
            Patch::Keep => {}
        }
        if let Patch::Set(status) = self.payment_status {
            doc.payment.status = status;
        }
        match self.payment_confirmed_at {
            Patch::Set(at) => doc.payment.confirmed_at = Some(at),
            Patch::Clear => doc.payment.confirmed_at = None,
            Patch::Keep => {}
        }
        match self.cost_analysis {
            Patch::Set(analysis) => doc.cost_analysis = Some(analysis),
            Patch::Clear => doc.cost_analysis = None,
            Patch::Keep => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Customer, Payment, PaymentMethod, ShippingInfo};

    fn doc() -> OrderDocument {
        OrderDocument::new(
            "ORD-3001",
            Customer {
                name: "Elif Sahin".into(),
                email: None,
                phone: Some("0532 000 11 22".into()),
            },
            vec![],
            Payment {
                method: PaymentMethod::Card,
                status: PaymentStatus::Paid,
                subtotal: 100.0,
                shipping: 0.0,
                discount: 0.0,
                total: 100.0,
                card: None,
                gateway_txn_id: None,
                failure_reason: None,
                retry_count: 0,
                deadline: None,
                confirmed_at: None,
            },
            ShippingInfo {
                address: "Moda Cad. 12".into(),
                city: "Istanbul".into(),
                district: "Kadikoy".into(),
                delivery_method: "standard".into(),
                estimated_date: None,
            },
        )
    }

    #[test]
    fn keep_fields_are_omitted_on_the_wire() {
        let patch = OrderPatch {
            status: Patch::Set(OrderStatus::InProduction),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("status"));
        assert!(!json.contains("tracking"));
        assert!(!json.contains("timeline"));
    }

    #[test]
    fn apply_distinguishes_clear_from_keep() {
        let mut order = doc();
        order.gift_note = Some("Mutlu yillar".into());

        // Keep leaves the note alone.
        OrderPatch::default().apply(&mut order);
        assert_eq!(order.gift_note.as_deref(), Some("Mutlu yillar"));

        // Clear removes it.
        OrderPatch {
            gift_note: Patch::Clear,
            ..Default::default()
        }
        .apply(&mut order);
        assert!(order.gift_note.is_none());
    }

    #[test]
    fn apply_only_touches_set_fields() {
        let mut order = doc();
        OrderPatch {
            shipping_city: Patch::Set("Ankara".into()),
            ..Default::default()
        }
        .apply(&mut order);
        assert_eq!(order.shipping.city, "Ankara");
        assert_eq!(order.shipping.address, "Moda Cad. 12");
        assert_eq!(order.customer.phone.as_deref(), Some("0532 000 11 22"));
    }

    #[test]
    fn empty_patch_reports_empty() {
        assert!(OrderPatch::default().is_empty());
        assert!(!OrderPatch {
            status: Patch::Set(OrderStatus::Shipped),
            ..Default::default()
        }
        .is_empty());
    }
}
