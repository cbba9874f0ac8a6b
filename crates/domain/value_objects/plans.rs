use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub duration_days: i32,
    pub features: Vec<String>,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            features: value.features,
        }
    }
}
