use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::payment_statuses::PaymentStatus,
    infra::db::postgres::schema::payment_transactions,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_transactions)]
pub struct PaymentTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub gateway_response: Option<serde_json::Value>,
    pub gateway_events: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransactionEntity {
    /// Unknown stored values are treated as failed so they are never re-processed.
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.status).unwrap_or(PaymentStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_transactions)]
pub struct InsertPaymentTransactionEntity {
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub gateway_events: serde_json::Value,
}
