use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::notifications::{InsertNotificationEntity, NotificationEntity};

#[async_trait]
#[automock]
pub trait NotificationRepository {
    async fn create(&self, notifications: Vec<InsertNotificationEntity>) -> Result<()>;
    async fn list_for_recipient(&self, recipient_id: Uuid, limit: i64) -> Result<Vec<NotificationEntity>>;
    /// Returns the number of notifications flipped to read.
    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<usize>;
}
