use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscription_plans;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub features: Vec<String>,
    pub gateway_plan_code: Option<String>,
    pub is_active: bool,
}

/// Raw row used for Diesel queries. Features stay as JSON and are parsed into a list.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub features: serde_json::Value,
    pub gateway_plan_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let features = serde_json::from_value(value.features).unwrap_or_default();

        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            features,
            gateway_plan_code: value.gateway_plan_code,
            is_active: value.is_active,
        }
    }
}
