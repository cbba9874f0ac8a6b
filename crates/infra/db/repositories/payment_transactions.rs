use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{payment_transactions, profiles, subscriptions},
};
use domain::{
    entities::{
        payment_transactions::{InsertPaymentTransactionEntity, PaymentTransactionEntity},
        subscriptions::SubscriptionEntity,
    },
    repositories::payment_transactions::PaymentTransactionRepository,
    value_objects::{
        enums::payment_statuses::PaymentStatus,
        subscriptions::{ActivationOutcome, ActivationPlan, SubscriptionWrite},
    },
};

pub struct PaymentTransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentTransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn lock_by_reference(tx: &mut PgConnection, reference: &str) -> QueryResult<PaymentTransactionEntity> {
    payment_transactions::table
        .filter(payment_transactions::reference.eq(reference))
        .select(PaymentTransactionEntity::as_select())
        .for_update()
        .first::<PaymentTransactionEntity>(tx)
}

fn appended_events(
    transaction: &PaymentTransactionEntity,
    status: PaymentStatus,
    payload: &serde_json::Value,
    at: DateTime<Utc>,
) -> serde_json::Value {
    let mut events = match &transaction.gateway_events {
        serde_json::Value::Array(events) => events.clone(),
        _ => Vec::new(),
    };
    events.push(json!({
        "status": status.as_str(),
        "at": at.to_rfc3339(),
        "payload": payload,
    }));
    serde_json::Value::Array(events)
}

fn write_status(
    tx: &mut PgConnection,
    transaction: &PaymentTransactionEntity,
    status: PaymentStatus,
    payload: serde_json::Value,
    at: DateTime<Utc>,
) -> QueryResult<usize> {
    let events = appended_events(transaction, status, &payload, at);

    update(
        payment_transactions::table
            .filter(payment_transactions::id.eq(transaction.id))
            .filter(payment_transactions::status.eq(PaymentStatus::Pending.as_str())),
    )
    .set((
        payment_transactions::status.eq(status.as_str()),
        payment_transactions::gateway_response.eq(Some(payload)),
        payment_transactions::gateway_events.eq(events),
        payment_transactions::updated_at.eq(at),
    ))
    .execute(tx)
}

#[async_trait]
impl PaymentTransactionRepository for PaymentTransactionPostgres {
    async fn create_pending(
        &self,
        insert_transaction_entity: InsertPaymentTransactionEntity,
    ) -> Result<PaymentTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payment_transactions::table)
            .values(&insert_transaction_entity)
            .returning(PaymentTransactionEntity::as_returning())
            .get_result::<PaymentTransactionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentTransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payment_transactions::table
            .filter(payment_transactions::reference.eq(reference))
            .select(PaymentTransactionEntity::as_select())
            .first::<PaymentTransactionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn mark_terminal(
        &self,
        reference: &str,
        status: PaymentStatus,
        gateway_payload: serde_json::Value,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let updated = conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            let transaction = lock_by_reference(tx, reference)?;
            if !transaction.status().can_transition_to(status) {
                return Ok(false);
            }

            let rows = write_status(tx, &transaction, status, gateway_payload, now)?;
            Ok(rows > 0)
        })?;

        Ok(updated)
    }

    async fn record_success_and_activate(
        &self,
        reference: &str,
        gateway_payload: serde_json::Value,
        customer_code: Option<String>,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> Result<ActivationOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<ActivationOutcome, anyhow::Error, _>(|tx| {
            let transaction = lock_by_reference(tx, reference)?;
            if let Some(skipped) = ActivationOutcome::skipped_for(transaction.status()) {
                return Ok(skipped);
            }

            // Locks the owner so concurrent activations for different references queue up.
            profiles::table
                .filter(profiles::id.eq(transaction.user_id))
                .select(profiles::id)
                .for_update()
                .first::<Uuid>(tx)?;

            write_status(tx, &transaction, PaymentStatus::Success, gateway_payload, now)?;

            let existing = subscriptions::table
                .filter(subscriptions::user_id.eq(transaction.user_id))
                .select(SubscriptionEntity::as_select())
                .for_update()
                .first::<SubscriptionEntity>(tx)
                .optional()?;

            let plan = ActivationPlan::build(
                &transaction,
                existing.as_ref(),
                customer_code,
                duration_days,
                now,
            )
            .with_context(|| format!("entitlement window for transaction {}", reference))?;

            let subscription = match &plan.subscription {
                SubscriptionWrite::Update { id, changes } => {
                    update(subscriptions::table.filter(subscriptions::id.eq(*id)))
                        .set(changes)
                        .returning(SubscriptionEntity::as_returning())
                        .get_result::<SubscriptionEntity>(tx)?
                }
                SubscriptionWrite::Insert(insert) => insert_into(subscriptions::table)
                    .values(insert)
                    .returning(SubscriptionEntity::as_returning())
                    .get_result::<SubscriptionEntity>(tx)?,
            };

            update(profiles::table.filter(profiles::id.eq(transaction.user_id)))
                .set(&plan.premium)
                .execute(tx)?;

            Ok(ActivationOutcome::Activated {
                subscription,
                extended: plan.window.extended,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(events: serde_json::Value) -> PaymentTransactionEntity {
        let now = Utc::now();
        PaymentTransactionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: None,
            reference: "lvn_test".to_string(),
            amount_minor: 500000,
            currency: "NGN".to_string(),
            status: "pending".to_string(),
            gateway_response: None,
            gateway_events: events,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn events_are_appended_in_order() {
        let existing = transaction(json!([{ "status": "pending" }]));
        let events = appended_events(
            &existing,
            PaymentStatus::Success,
            &json!({ "status": "success" }),
            Utc::now(),
        );

        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["status"], "success");
        assert_eq!(events[1]["payload"]["status"], "success");
    }

    #[test]
    fn non_array_history_is_restarted() {
        let existing = transaction(json!({ "unexpected": true }));
        let events = appended_events(&existing, PaymentStatus::Failed, &json!(null), Utc::now());

        assert_eq!(events.as_array().unwrap().len(), 1);
    }
}
