use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::notifications};
use domain::{
    entities::notifications::{InsertNotificationEntity, NotificationEntity},
    repositories::notifications::NotificationRepository,
};

pub struct NotificationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationPostgres {
    async fn create(&self, new_notifications: Vec<InsertNotificationEntity>) -> Result<()> {
        if new_notifications.is_empty() {
            return Ok(());
        }
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(notifications::table)
            .values(&new_notifications)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_for_recipient(&self, recipient_id: Uuid, limit: i64) -> Result<Vec<NotificationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = notifications::table
            .filter(notifications::recipient_id.eq(recipient_id))
            .order(notifications::created_at.desc())
            .limit(limit)
            .select(NotificationEntity::as_select())
            .load::<NotificationEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(
            notifications::table
                .filter(notifications::recipient_id.eq(recipient_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated)
    }
}
