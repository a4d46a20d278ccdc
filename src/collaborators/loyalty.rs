use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CollaboratorError;
use crate::domain::order::OrderDocument;

// ============================================================================
// Loyalty Service Contract
// ============================================================================
//
// The order lifecycle never computes point amounts or tier thresholds; it
// invokes the loyalty collaborator and records the outcome on the document.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyCustomer {
    pub id: String,
    pub tier_level: u32,
    pub total_orders: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierUpgrade {
    pub upgraded: bool,
    pub old_tier: u32,
    pub new_tier: u32,
}

#[async_trait]
pub trait LoyaltyService: Send + Sync {
    async fn get_or_create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<LoyaltyCustomer, CollaboratorError>;

    /// Returns the points earned for this purchase.
    async fn add_points_for_purchase(
        &self,
        customer_id: &str,
        order_number: &str,
        total: f64,
        tier: u32,
    ) -> Result<i64, CollaboratorError>;

    async fn check_tier_upgrade(&self, customer_id: &str)
        -> Result<TierUpgrade, CollaboratorError>;

    async fn apply_referral_bonus(
        &self,
        referrer_id: &str,
        referee_id: &str,
    ) -> Result<(), CollaboratorError>;
}

/// Loyalty enrichment for a freshly placed order.
///
/// Any loyalty failure falls back to the plain document: the order is still
/// created, just without customer id, tier, or points.
pub async fn enrich_new_order(
    loyalty: &dyn LoyaltyService,
    doc: OrderDocument,
) -> OrderDocument {
    let Some(email) = doc.customer.email.clone() else {
        return doc;
    };
    match try_enrich(loyalty, &email, &doc).await {
        Ok((customer, points)) => {
            let mut doc = doc;
            doc.customer_id = Some(customer.id);
            doc.customer_tier = Some(customer.tier_level);
            doc.loyalty_points_earned = Some(points);
            doc
        }
        Err(error) => {
            tracing::warn!(
                order = %doc.number,
                error = %error,
                "Loyalty enrichment failed, creating plain order"
            );
            doc
        }
    }
}

async fn try_enrich(
    loyalty: &dyn LoyaltyService,
    email: &str,
    doc: &OrderDocument,
) -> Result<(LoyaltyCustomer, i64), CollaboratorError> {
    let customer = loyalty
        .get_or_create_customer(email, &doc.customer.name)
        .await?;
    let points = loyalty
        .add_points_for_purchase(&customer.id, &doc.number, doc.payment.total, customer.tier_level)
        .await?;
    let upgrade = loyalty.check_tier_upgrade(&customer.id).await?;
    if upgrade.upgraded {
        tracing::info!(
            customer_id = %customer.id,
            old_tier = upgrade.old_tier,
            new_tier = upgrade.new_tier,
            "Customer tier upgraded"
        );
    }
    if let Some(referrer) = &customer.referred_by {
        if let Err(error) = loyalty.apply_referral_bonus(referrer, &customer.id).await {
            tracing::warn!(
                customer_id = %customer.id,
                error = %error,
                "Referral bonus not applied"
            );
        }
    }
    Ok((customer, points))
}
