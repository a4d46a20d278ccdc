use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orderflow::collaborators::{
    CarrierGateway, CollaboratorError, LoyaltyCustomer, LoyaltyService, NotificationKind,
    NotificationService, Shipment, ShipmentRequest, ShipmentStatus, TierUpgrade,
};
use orderflow::domain::order::{
    CancellationRequest, Customer, OrderDocument, OrderItem, OrderStatus, Payment, PaymentMethod,
    PaymentStatus, RefundRequest, ShippingInfo,
};
use orderflow::store::OrderStore;
use orderflow::sync::{InMemoryOrderCollection, SyncLayer};

// ============================================================================
// Demo Collaborators
// ============================================================================

/// Notification channel that just logs what it would send.
struct ConsoleNotifications;

#[async_trait]
impl NotificationService for ConsoleNotifications {
    async fn send(
        &self,
        kind: NotificationKind,
        recipient: &str,
        payload: serde_json::Value,
    ) -> Result<(), CollaboratorError> {
        tracing::info!(kind = %kind, recipient = %recipient, payload = %payload, "📧 Notification sent");
        Ok(())
    }
}

/// Carrier aggregator that accepts everything at a flat rate.
struct DemoCarrier;

#[async_trait]
impl CarrierGateway for DemoCarrier {
    async fn quote(
        &self,
        _origin: &str,
        _destination: &str,
        _weight_kg: f64,
        _desi: f64,
    ) -> Result<Option<f64>, CollaboratorError> {
        Ok(Some(49.9))
    }

    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<Option<Shipment>, CollaboratorError> {
        Ok(Some(Shipment {
            tracking_number: format!("YT{}", &uuid::Uuid::new_v4().simple().to_string()[..10]),
            carrier: "Yurtici".into(),
            label_url: None,
            shipment_id: format!("shp-{}", request.order_ref),
            price: 49.9,
        }))
    }

    async fn check_status(&self, _order_ref: &str) -> Result<ShipmentStatus, CollaboratorError> {
        Ok(ShipmentStatus {
            status: "in_transit".into(),
            message: "On the road".into(),
        })
    }
}

/// In-memory loyalty program: 1 point per 10 spent, tier 1 for everyone.
struct DemoLoyalty {
    customers: Mutex<HashMap<String, LoyaltyCustomer>>,
}

impl DemoLoyalty {
    fn new() -> Self {
        Self {
            customers: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl LoyaltyService for DemoLoyalty {
    async fn get_or_create_customer(
        &self,
        email: &str,
        _name: &str,
    ) -> Result<LoyaltyCustomer, CollaboratorError> {
        let mut customers = self
            .customers
            .lock()
            .map_err(|_| CollaboratorError::Loyalty("customer registry poisoned".into()))?;
        let customer = customers.entry(email.to_string()).or_insert_with(|| {
            LoyaltyCustomer {
                id: uuid::Uuid::new_v4().to_string(),
                tier_level: 1,
                total_orders: 0,
                referred_by: None,
            }
        });
        customer.total_orders += 1;
        Ok(customer.clone())
    }

    async fn add_points_for_purchase(
        &self,
        _customer_id: &str,
        _order_number: &str,
        total: f64,
        _tier: u32,
    ) -> Result<i64, CollaboratorError> {
        Ok((total / 10.0) as i64)
    }

    async fn check_tier_upgrade(
        &self,
        _customer_id: &str,
    ) -> Result<TierUpgrade, CollaboratorError> {
        Ok(TierUpgrade {
            upgraded: false,
            old_tier: 1,
            new_tier: 1,
        })
    }

    async fn apply_referral_bonus(
        &self,
        _referrer_id: &str,
        _referee_id: &str,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

// ============================================================================
// Demo Walkthrough
// ============================================================================

fn demo_order(number: &str, name: &str, email: &str, total: f64) -> OrderDocument {
    OrderDocument::new(
        number,
        Customer {
            name: name.into(),
            email: Some(email.into()),
            phone: Some("0532 111 22 33".into()),
        },
        vec![OrderItem {
            id: "SKU-7".into(),
            name: "Fistikli Cikolata 70%".into(),
            unit_price: total / 2.0,
            quantity: 2,
            image: None,
        }],
        Payment {
            method: PaymentMethod::Card,
            status: PaymentStatus::Paid,
            subtotal: total,
            shipping: 0.0,
            discount: 0.0,
            total,
            card: None,
            gateway_txn_id: Some(uuid::Uuid::new_v4().to_string()),
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

/// Give the live subscription a beat to re-sync after a commit.
async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orderflow=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order lifecycle demo");

    // === 1. Open the collection and the live subscription ===
    let collection = Arc::new(InMemoryOrderCollection::new());
    let sync_layer = SyncLayer::new(collection);
    sync_layer.spawn_live();

    let store = OrderStore::new(
        sync_layer.clone(),
        Arc::new(ConsoleNotifications),
        Arc::new(DemoCarrier),
        Arc::new(DemoLoyalty::new()),
    );

    // === 2. Place orders ===
    store
        .place_order(demo_order("ORD-1001", "Ayse Demir", "ayse@example.com", 820.0))
        .await?;
    store
        .place_order(demo_order("ORD-1002", "Mehmet Kaya", "mehmet@example.com", 450.0))
        .await?;
    store
        .place_order(demo_order("ORD-1003", "Zeynep Arslan", "zeynep@example.com", 290.0))
        .await?;
    settle().await;
    tracing::info!("✅ Orders placed: {}", store.orders().await.len());

    // === 3. Walk ORD-1001 through the happy path ===
    store.send_email("ORD-1001").await?;
    settle().await;
    store.update_status("ORD-1001", OrderStatus::InProduction).await?;
    settle().await;
    store.update_status("ORD-1001", OrderStatus::ReadyForPacking).await?;
    settle().await;
    let shipment = store.create_shipment("ORD-1001", 1.2, 2.0).await?;
    tracing::info!("✅ ORD-1001 shipped: {} {}", shipment.carrier, shipment.tracking_number);
    settle().await;
    store.update_status("ORD-1001", OrderStatus::Delivered).await?;
    settle().await;

    // === 4. Partial refund on ORD-1002 ===
    store
        .start_refund(
            "ORD-1002",
            RefundRequest {
                reason: "Kalite Sorunu".into(),
                amount: 225.0,
                percentage: 50,
                method: "original".into(),
                notes: None,
            },
        )
        .await?;
    settle().await;
    store.add_tag("ORD-1002", "VIP", "yellow").await?;
    settle().await;

    // === 5. Cancel ORD-1003 ===
    store
        .cancel_order(
            "ORD-1003",
            CancellationRequest {
                reason: "Customer requested cancellation".into(),
                notify_customer: true,
                refund_payment: true,
                notes: None,
            },
        )
        .await?;
    settle().await;

    // === 6. Final cache state ===
    for view in store.orders().await {
        tracing::info!(
            order = %view.doc.number,
            status = %view.doc.status,
            sla_minutes = view.sla_minutes,
            timeline = view.doc.timeline.len(),
            "📦 Order"
        );
    }
    if let Some(error) = store.last_error().await {
        tracing::warn!(error = %error, "Subscription degraded");
    }

    tracing::info!("🎉 Demo complete!");
    Ok(())
}
