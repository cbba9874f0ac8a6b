use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::enums::payment_statuses::PaymentStatus;

pub const REFERENCE_PREFIX: &str = "lvn_";

/// Opaque, unique checkout reference handed to the gateway.
pub fn new_reference() -> String {
    format!("{}{}", REFERENCE_PREFIX, Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeTransactionRequest {
    pub email: String,
    pub amount_minor: i64,
    pub reference: String,
    pub currency: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub payload: serde_json::Value,
}

/// What the gateway reports for a reference on server-to-server verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub gateway_status: String,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub customer_code: Option<String>,
    pub payload: serde_json::Value,
}

impl VerifiedTransaction {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_gateway_status(&self.gateway_status)
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rejected the request: {message}")]
    Rejected {
        message: String,
        payload: Option<serde_json::Value>,
    },

    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("gateway returned a malformed payload: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn payload(&self) -> serde_json::Value {
        match self {
            GatewayError::Rejected {
                message,
                payload: Some(payload),
            } => serde_json::json!({ "message": message, "response": payload }),
            GatewayError::Rejected { message, .. } => serde_json::json!({ "message": message }),
            GatewayError::Malformed(message) => serde_json::json!({ "malformed": message }),
            GatewayError::Transport(message) => serde_json::json!({ "transport": message }),
        }
    }
}

/// Signed event pushed by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    pub event: String,
    #[serde(default)]
    pub data: PaymentEventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEventData {
    pub reference: Option<String>,
    pub status: Option<String>,
}

impl PaymentEvent {
    pub const CHARGE_SUCCESS: &'static str = "charge.success";

    pub fn charge_success_reference(&self) -> Option<&str> {
        if self.event != Self::CHARGE_SUCCESS {
            return None;
        }
        self.data
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
    }
}

/// Callback query. The gateway sends `reference` and mirrors it as `trxref`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentCallbackQuery {
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

impl PaymentCallbackQuery {
    pub fn reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.trxref.as_deref())
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
    }
}
