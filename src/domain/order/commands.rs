use chrono::{DateTime, Utc};

use super::status::OrderStatus;

// ============================================================================
// Order Command Inputs - Represent operator intent
// ============================================================================

/// Operator intent for one clearable optional field. Required fields use
/// plain `Option` instead; they can be changed but never cleared.
#[derive(Debug, Clone, Default)]
pub enum FieldEdit<T> {
    /// Field not proposed by this edit.
    #[default]
    Untouched,
    Set(T),
    Clear,
}

/// Proposed field values for `edit_order`. `None` / `Untouched` means "not
/// proposed"; only fields that actually differ from the order produce edit
/// records.
#[derive(Debug, Clone, Default)]
pub struct OrderEdits {
    pub customer_phone: FieldEdit<String>,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub gift_note: FieldEdit<String>,
    pub special_notes: FieldEdit<String>,
    pub status: Option<OrderStatus>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RefundRequest {
    pub reason: String,
    pub amount: f64,
    pub percentage: u8,
    pub method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancellationRequest {
    pub reason: String,
    pub notify_customer: bool,
    pub refund_payment: bool,
    pub notes: Option<String>,
}
