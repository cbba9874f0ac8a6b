use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::subscriptions::SubscriptionEntity,
    repositories::subscriptions::SubscriptionRepository,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Re-derives premium status from the subscription row. The profile flag is only a mirror.
pub struct EntitlementResolver<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
}

impl<S> EntitlementResolver<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>) -> Self {
        Self { subscription_repo }
    }

    pub async fn active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionEntity>> {
        let subscription = self.subscription_repo.find_by_user(user_id).await?;

        match subscription {
            Some(subscription) if subscription.is_currently_active(now) => {
                debug!(
                    %user_id,
                    end_date = ?subscription.end_date,
                    "entitlement: active subscription"
                );
                Ok(Some(subscription))
            }
            Some(_) => {
                debug!(%user_id, "entitlement: subscription expired or inactive");
                Ok(None)
            }
            None => {
                debug!(%user_id, "entitlement: no subscription");
                Ok(None)
            }
        }
    }

    pub async fn is_premium(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.active_subscription(user_id, now).await?.is_some())
    }
}
