use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CollaboratorError;

// ============================================================================
// Carrier Gateway Contract
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub order_ref: String,
    pub customer_name: String,
    pub address: String,
    pub weight_kg: f64,
    pub desi: f64,
    pub content_description: String,
    pub auto_accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub tracking_number: String,
    pub carrier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    pub shipment_id: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStatus {
    pub status: String,
    pub message: String,
}

#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// A `None` quote means no carrier serves the lane.
    async fn quote(
        &self,
        origin: &str,
        destination: &str,
        weight_kg: f64,
        desi: f64,
    ) -> Result<Option<f64>, CollaboratorError>;

    /// A `None` shipment means the aggregator declined the request.
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<Option<Shipment>, CollaboratorError>;

    async fn check_status(&self, order_ref: &str) -> Result<ShipmentStatus, CollaboratorError>;
}

/// Volumetric weight in desi: volume in cm^3 divided by 3000.
pub fn desi(width_cm: f64, height_cm: f64, depth_cm: f64) -> f64 {
    (width_cm * height_cm * depth_cm) / 3000.0
}
