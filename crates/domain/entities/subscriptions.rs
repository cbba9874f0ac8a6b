use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscriptions;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub gateway_customer_code: Option<String>,
    pub gateway_subscription_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// The stored flag lags reality; a past end date always wins.
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date.is_some_and(|end_date| end_date > now)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub gateway_customer_code: Option<String>,
}

/// Renewal of an existing row. `None` codes keep the stored value.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct UpdateSubscriptionEntity {
    pub plan_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub gateway_customer_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(is_active: bool, end_date: Option<DateTime<Utc>>) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Some(Uuid::new_v4()),
            start_date: now - Duration::days(10),
            end_date,
            is_active,
            gateway_customer_code: None,
            gateway_subscription_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn expired_subscription_is_inactive_even_when_flagged() {
        let now = Utc::now();
        let expired = subscription(true, Some(now - Duration::seconds(1)));
        assert!(!expired.is_currently_active(now));
    }

    #[test]
    fn flag_and_future_end_date_are_both_required() {
        let now = Utc::now();
        assert!(subscription(true, Some(now + Duration::days(1))).is_currently_active(now));
        assert!(!subscription(false, Some(now + Duration::days(1))).is_currently_active(now));
        assert!(!subscription(true, None).is_currently_active(now));
    }
}
