use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::notifications::{InsertNotificationEntity, NotificationEntity},
    value_objects::enums::notification_kinds::NotificationKind,
};

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
pub const MAX_NOTIFICATION_LIMIT: i64 = 200;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationDto {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub kind: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEntity> for NotificationDto {
    fn from(value: NotificationEntity) -> Self {
        Self {
            id: value.id,
            actor_id: value.actor_id,
            kind: value.kind,
            body: value.body,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
}

impl NotificationListQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, MAX_NOTIFICATION_LIMIT)
    }
}

pub fn like_notification(recipient_id: Uuid, actor_id: Uuid, actor_username: &str) -> InsertNotificationEntity {
    InsertNotificationEntity {
        recipient_id,
        actor_id: Some(actor_id),
        kind: NotificationKind::Like.to_string(),
        body: format!("{} liked your profile", actor_username),
    }
}

pub fn match_notification(recipient_id: Uuid, actor_id: Uuid, actor_username: &str) -> InsertNotificationEntity {
    InsertNotificationEntity {
        recipient_id,
        actor_id: Some(actor_id),
        kind: NotificationKind::Match.to_string(),
        body: format!("You matched with {}", actor_username),
    }
}
