use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audit::{EditRecord, TimelineEntry};
use super::status::{OrderStatus, Priority};

// ============================================================================
// Order Document - Persisted Shape
// ============================================================================
//
// One document per customer purchase, exactly as it lives in the remote
// order collection. Derived fields (SLA, display timestamps) are NOT part
// of this struct; the synchronization layer computes them into `OrderView`.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDocument {
    /// Internal document identity. Commands resolve to this before writing.
    pub doc_id: Uuid,
    /// Human-facing order number, e.g. "ORD-1007".
    pub number: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    pub shipping: ShippingInfo,
    pub billing: ShippingInfo,
    pub logistics: Logistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub edit_history: Vec<EditRecord>,
    #[serde(default)]
    pub refunds: Vec<RefundRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    /// Populated by an external cost-estimation call, never computed here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_analysis: Option<CostAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_notes: Option<String>,
    // Loyalty collaborator outcomes, recorded as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_tier: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loyalty_points_earned: Option<i64>,
    /// Server-assigned creation timestamp, opaque until normalized.
    pub created_at: String,
}

impl OrderDocument {
    /// Build a fresh document the way the order-placement flow does.
    ///
    /// EFT orders awaiting payment start in `PendingPayment`; everything
    /// else starts in `AwaitingPrep`. `created_at` is left empty for the
    /// collection to assign on insert.
    pub fn new(
        number: impl Into<String>,
        customer: Customer,
        items: Vec<OrderItem>,
        payment: Payment,
        shipping: ShippingInfo,
    ) -> Self {
        let status = match (payment.method, payment.status) {
            (PaymentMethod::Eft, PaymentStatus::Pending) => OrderStatus::PendingPayment,
            _ => OrderStatus::AwaitingPrep,
        };
        Self {
            doc_id: Uuid::new_v4(),
            number: number.into(),
            status,
            priority: Priority::Normal,
            customer,
            items,
            payment,
            billing: shipping.clone(),
            shipping,
            logistics: Logistics::default(),
            tracking: None,
            tags: Vec::new(),
            timeline: vec![TimelineEntry::now("Order created")],
            edit_history: Vec::new(),
            refunds: Vec::new(),
            cancellation: None,
            cost_analysis: None,
            gift_note: None,
            special_notes: None,
            customer_id: None,
            customer_tier: None,
            loyalty_points_earned: None,
            created_at: String::new(),
        }
    }

    /// Sum of all recorded refund amounts, regardless of refund status.
    pub fn refunded_total(&self) -> f64 {
        self.refunds.iter().map(|r| r.amount).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Eft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub subtotal: f64,
    pub shipping: f64,
    pub discount: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_txn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    /// Present only for EFT orders still awaiting payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardMeta {
    pub association: String,
    pub masked_digits: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub district: String,
    pub delivery_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub cold_package: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_alert: Option<String>,
}

/// Presence implies a shipment has been created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub number: String,
    pub added_at: DateTime<Utc>,
}

/// Free-form operator annotation. No uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    pub color: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: Uuid,
    pub reason: String,
    pub amount: f64,
    pub percentage: u8,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: RefundStatus,
}

/// Set at most once; a second cancellation hits the terminal-status guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: String,
    pub notify_customer: bool,
    pub refund_payment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub carrier_cost: f64,
    pub customer_paid: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(method: PaymentMethod, status: PaymentStatus) -> Payment {
        Payment {
            method,
            status,
            subtotal: 800.0,
            shipping: 20.0,
            discount: 0.0,
            total: 820.0,
            card: None,
            gateway_txn_id: None,
            failure_reason: None,
            retry_count: 0,
            deadline: None,
            confirmed_at: None,
        }
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            address: "Moda Cad. 12".into(),
            city: "Istanbul".into(),
            district: "Kadikoy".into(),
            delivery_method: "standard".into(),
            estimated_date: None,
        }
    }

    #[test]
    fn eft_orders_start_pending_payment() {
        let doc = OrderDocument::new(
            "ORD-1001",
            Customer {
                name: "Ayse Demir".into(),
                email: None,
                phone: None,
            },
            vec![],
            payment(PaymentMethod::Eft, PaymentStatus::Pending),
            shipping(),
        );
        assert_eq!(doc.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn card_orders_start_awaiting_prep() {
        let doc = OrderDocument::new(
            "ORD-1002",
            Customer {
                name: "Mehmet Kaya".into(),
                email: None,
                phone: None,
            },
            vec![],
            payment(PaymentMethod::Card, PaymentStatus::Paid),
            shipping(),
        );
        assert_eq!(doc.status, OrderStatus::AwaitingPrep);
        assert_eq!(doc.timeline.len(), 1);
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut doc = OrderDocument::new(
            "ORD-1003",
            Customer {
                name: "Zeynep Arslan".into(),
                email: Some("zeynep@example.com".into()),
                phone: Some("0532 111 22 33".into()),
            },
            vec![OrderItem {
                id: "SKU-7".into(),
                name: "Fistikli Cikolata".into(),
                unit_price: 410.0,
                quantity: 2,
                image: None,
            }],
            payment(PaymentMethod::Card, PaymentStatus::Paid),
            shipping(),
        );
        doc.created_at = Utc::now().to_rfc3339();

        let json = serde_json::to_string(&doc).unwrap();
        let back: OrderDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.number, "ORD-1003");
        assert_eq!(back.items.len(), 1);
        assert_eq!(back.status, OrderStatus::AwaitingPrep);
    }

    #[test]
    fn absent_optionals_are_omitted_from_json() {
        let doc = OrderDocument::new(
            "ORD-1004",
            Customer {
                name: "Ali Vural".into(),
                email: None,
                phone: None,
            },
            vec![],
            payment(PaymentMethod::Card, PaymentStatus::Paid),
            shipping(),
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("tracking"));
        assert!(!json.contains("cancellation"));
        assert!(!json.contains("gift_note"));
    }

    #[test]
    fn refunded_total_sums_all_records() {
        let mut doc = OrderDocument::new(
            "ORD-1005",
            Customer {
                name: "Ali Vural".into(),
                email: None,
                phone: None,
            },
            vec![],
            payment(PaymentMethod::Card, PaymentStatus::Paid),
            shipping(),
        );
        assert_eq!(doc.refunded_total(), 0.0);
        for amount in [100.0, 250.5] {
            doc.refunds.push(RefundRecord {
                id: Uuid::new_v4(),
                reason: "damaged".into(),
                amount,
                percentage: 10,
                method: "original".into(),
                notes: None,
                created_at: Utc::now(),
                status: RefundStatus::Pending,
            });
        }
        assert!((doc.refunded_total() - 350.5).abs() < f64::EPSILON);
    }
}
