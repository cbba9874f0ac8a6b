use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::{
    entities::payment_transactions::{
        InsertPaymentTransactionEntity, PaymentTransactionEntity,
    },
    value_objects::{enums::payment_statuses::PaymentStatus, subscriptions::ActivationOutcome},
};

#[async_trait]
#[automock]
pub trait PaymentTransactionRepository {
    async fn create_pending(
        &self,
        insert_transaction_entity: InsertPaymentTransactionEntity,
    ) -> Result<PaymentTransactionEntity>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentTransactionEntity>>;

    /// Moves a pending transaction to `status` and records the gateway payload.
    /// Returns false when the row was no longer pending.
    async fn mark_terminal(
        &self,
        reference: &str,
        status: PaymentStatus,
        gateway_payload: serde_json::Value,
    ) -> Result<bool>;

    /// Marks the transaction successful and activates or extends the owner's
    /// subscription in one database transaction.
    async fn record_success_and_activate(
        &self,
        reference: &str,
        gateway_payload: serde_json::Value,
        customer_code: Option<String>,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> Result<ActivationOutcome>;
}
