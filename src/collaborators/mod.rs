// ============================================================================
// External Collaborators
// ============================================================================
//
// Trait contracts for the services the order store orchestrates but does
// not implement: customer notifications, the carrier aggregator, and the
// loyalty program. Concrete clients live outside this crate; tests and the
// demo binary supply their own implementations.
//
// ============================================================================

pub mod carrier;
pub mod loyalty;
pub mod notifications;

pub use carrier::{desi, CarrierGateway, Shipment, ShipmentRequest, ShipmentStatus};
pub use loyalty::{enrich_new_order, LoyaltyCustomer, LoyaltyService, TierUpgrade};
pub use notifications::{NotificationKind, NotificationService};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("carrier gateway error: {0}")]
    Carrier(String),

    #[error("loyalty service error: {0}")]
    Loyalty(String),

    #[error("collaborator call timed out after {0:?}")]
    Timeout(Duration),
}
