use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{
        payment_transactions::PaymentTransactionEntity,
        profiles::PremiumMirrorEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity},
    },
    value_objects::enums::payment_statuses::PaymentStatus,
};

/// Start and end of a premium entitlement after a successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub extended: bool,
}

impl EntitlementWindow {
    /// An active subscription is extended from its current end date, otherwise a fresh window starts now.
    pub fn next(
        existing: Option<&SubscriptionEntity>,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if duration_days <= 0 {
            bail!("plan duration must be positive, got {} days", duration_days);
        }
        let duration = Duration::days(i64::from(duration_days));

        let current_end = existing
            .filter(|subscription| subscription.is_currently_active(now))
            .and_then(|subscription| {
                subscription
                    .end_date
                    .map(|end_date| (subscription.start_date, end_date))
            });

        match current_end {
            Some((start_date, end_date)) => Ok(Self {
                start_date,
                end_date: end_date
                    .checked_add_signed(duration)
                    .context("subscription end date overflow")?,
                extended: true,
            }),
            None => Ok(Self {
                start_date: now,
                end_date: now
                    .checked_add_signed(duration)
                    .context("subscription end date overflow")?,
                extended: false,
            }),
        }
    }
}

/// How a verification that reached the database ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    Activated {
        subscription: SubscriptionEntity,
        extended: bool,
    },
    AlreadyCompleted,
    /// Another request moved the transaction to a different terminal state first.
    NotPending(PaymentStatus),
}

impl ActivationOutcome {
    /// Outcome for a transaction that must not be activated, `None` while it is still pending.
    pub fn skipped_for(status: PaymentStatus) -> Option<Self> {
        match status {
            PaymentStatus::Pending => None,
            PaymentStatus::Success => Some(ActivationOutcome::AlreadyCompleted),
            other => Some(ActivationOutcome::NotPending(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionWrite {
    Insert(InsertSubscriptionEntity),
    Update {
        id: Uuid,
        changes: UpdateSubscriptionEntity,
    },
}

/// Rows written when a verified payment grants premium.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationPlan {
    pub window: EntitlementWindow,
    pub subscription: SubscriptionWrite,
    pub premium: PremiumMirrorEntity,
}

impl ActivationPlan {
    pub fn build(
        transaction: &PaymentTransactionEntity,
        existing: Option<&SubscriptionEntity>,
        customer_code: Option<String>,
        duration_days: i32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let window = EntitlementWindow::next(existing, duration_days, now)?;

        let subscription = match existing {
            Some(existing) => SubscriptionWrite::Update {
                id: existing.id,
                changes: UpdateSubscriptionEntity {
                    plan_id: transaction.plan_id.or(existing.plan_id),
                    start_date: window.start_date,
                    end_date: Some(window.end_date),
                    is_active: true,
                    gateway_customer_code: customer_code,
                    updated_at: now,
                },
            },
            None => SubscriptionWrite::Insert(InsertSubscriptionEntity {
                user_id: transaction.user_id,
                plan_id: transaction.plan_id,
                start_date: window.start_date,
                end_date: Some(window.end_date),
                is_active: true,
                gateway_customer_code: customer_code,
            }),
        };

        Ok(Self {
            window,
            subscription,
            premium: PremiumMirrorEntity {
                is_premium: true,
                premium_expires_at: Some(window.end_date),
                updated_at: now,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentSubscriptionDto {
    pub plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CurrentSubscriptionDto {
    pub fn from_entity(
        subscription: &SubscriptionEntity,
        plan_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            plan_id: subscription.plan_id,
            plan_name,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            is_active: subscription.is_currently_active(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckoutDto {
    pub reference: String,
    pub authorization_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerificationDto {
    pub reference: String,
    pub status: PaymentStatus,
    pub premium_until: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        is_active: bool,
    ) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Some(Uuid::new_v4()),
            start_date,
            end_date: Some(end_date),
            is_active,
            gateway_customer_code: None,
            gateway_subscription_code: None,
            created_at: start_date,
            updated_at: start_date,
        }
    }

    #[test]
    fn fresh_window_starts_now() {
        let now = Utc::now();
        let window = EntitlementWindow::next(None, 30, now).unwrap();

        assert_eq!(window.start_date, now);
        assert_eq!(window.end_date, now + Duration::days(30));
        assert!(!window.extended);
    }

    #[test]
    fn active_subscription_extends_from_previous_end() {
        let now = Utc::now();
        let start = now - Duration::days(20);
        let end = now + Duration::days(10);
        let existing = subscription(start, end, true);

        let window = EntitlementWindow::next(Some(&existing), 30, now).unwrap();

        assert_eq!(window.start_date, start);
        assert_eq!(window.end_date, end + Duration::days(30));
        assert!(window.extended);
    }

    #[test]
    fn expired_or_deactivated_subscription_restarts_window() {
        let now = Utc::now();
        let expired = subscription(now - Duration::days(40), now - Duration::days(10), true);
        let deactivated = subscription(now - Duration::days(5), now + Duration::days(25), false);

        for existing in [expired, deactivated] {
            let window = EntitlementWindow::next(Some(&existing), 7, now).unwrap();
            assert_eq!(window.start_date, now);
            assert_eq!(window.end_date, now + Duration::days(7));
        }
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(EntitlementWindow::next(None, 0, Utc::now()).is_err());
    }

    fn pending_transaction(user_id: Uuid, plan_id: Option<Uuid>) -> PaymentTransactionEntity {
        let now = Utc::now();
        PaymentTransactionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            reference: "lvn_activation".to_string(),
            amount_minor: 500000,
            currency: "NGN".to_string(),
            status: "pending".to_string(),
            gateway_response: None,
            gateway_events: serde_json::json!([]),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_activation_inserts_subscription_and_flags_premium() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let transaction = pending_transaction(user_id, Some(plan_id));

        let plan =
            ActivationPlan::build(&transaction, None, Some("CUS_1".to_string()), 30, now).unwrap();

        match plan.subscription {
            SubscriptionWrite::Insert(insert) => {
                assert_eq!(insert.user_id, user_id);
                assert_eq!(insert.plan_id, Some(plan_id));
                assert_eq!(insert.start_date, now);
                assert_eq!(insert.end_date, Some(insert.start_date + Duration::days(30)));
                assert!(insert.is_active);
                assert_eq!(insert.gateway_customer_code.as_deref(), Some("CUS_1"));
            }
            other => panic!("expected insert, got {:?}", other),
        }
        assert!(plan.premium.is_premium);
        assert_eq!(plan.premium.premium_expires_at, Some(now + Duration::days(30)));
        assert!(!plan.window.extended);
    }

    #[test]
    fn renewal_updates_existing_row_from_previous_end() {
        let now = Utc::now();
        let start = now - Duration::days(20);
        let end = now + Duration::days(10);
        let existing = subscription(start, end, true);
        let transaction = pending_transaction(existing.user_id, None);

        let plan = ActivationPlan::build(&transaction, Some(&existing), None, 30, now).unwrap();

        match plan.subscription {
            SubscriptionWrite::Update { id, changes } => {
                assert_eq!(id, existing.id);
                assert_eq!(changes.plan_id, existing.plan_id);
                assert_eq!(changes.start_date, start);
                assert_eq!(changes.end_date, Some(end + Duration::days(30)));
                assert!(changes.is_active);
                assert_eq!(changes.gateway_customer_code, None);
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert_eq!(plan.premium.premium_expires_at, Some(end + Duration::days(30)));
        assert!(plan.window.extended);
    }

    #[test]
    fn expired_row_is_reused_with_a_fresh_window() {
        let now = Utc::now();
        let existing = subscription(now - Duration::days(60), now - Duration::days(30), true);
        let transaction = pending_transaction(existing.user_id, Some(Uuid::new_v4()));

        let plan = ActivationPlan::build(&transaction, Some(&existing), None, 30, now).unwrap();

        match plan.subscription {
            SubscriptionWrite::Update { id, changes } => {
                assert_eq!(id, existing.id);
                assert_eq!(changes.plan_id, transaction.plan_id);
                assert_eq!(changes.start_date, now);
                assert_eq!(changes.end_date, Some(now + Duration::days(30)));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn only_pending_transactions_are_activated() {
        assert_eq!(ActivationOutcome::skipped_for(PaymentStatus::Pending), None);
        assert_eq!(
            ActivationOutcome::skipped_for(PaymentStatus::Success),
            Some(ActivationOutcome::AlreadyCompleted)
        );
        assert_eq!(
            ActivationOutcome::skipped_for(PaymentStatus::Abandoned),
            Some(ActivationOutcome::NotPending(PaymentStatus::Abandoned))
        );
    }
}
