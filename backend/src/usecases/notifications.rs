use std::sync::Arc;

use crates::domain::{
    repositories::notifications::NotificationRepository,
    value_objects::notifications::NotificationDto,
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NotificationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            NotificationError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, NotificationError>;

pub struct NotificationUseCase<N>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    notification_repo: Arc<N>,
}

impl<N> NotificationUseCase<N>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    pub fn new(notification_repo: Arc<N>) -> Self {
        Self { notification_repo }
    }

    pub async fn list_notifications(&self, user_id: Uuid, limit: i64) -> UseCaseResult<Vec<NotificationDto>> {
        let notifications = self
            .notification_repo
            .list_for_recipient(user_id, limit)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "notifications: failed to list");
                NotificationError::Internal(err)
            })?;

        Ok(notifications.into_iter().map(NotificationDto::from).collect())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> UseCaseResult<usize> {
        let updated = self
            .notification_repo
            .mark_all_read(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "notifications: failed to mark as read");
                NotificationError::Internal(err)
            })?;

        info!(%user_id, updated, "notifications: marked as read");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::notifications::NotificationEntity,
        repositories::notifications::MockNotificationRepository,
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn lists_recipient_notifications_with_limit() {
        let user_id = Uuid::new_v4();
        let notification = NotificationEntity {
            id: Uuid::new_v4(),
            recipient_id: user_id,
            actor_id: Some(Uuid::new_v4()),
            kind: "match".to_string(),
            body: "You matched with bob".to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        let mut notification_repo = MockNotificationRepository::new();
        notification_repo
            .expect_list_for_recipient()
            .with(eq(user_id), eq(20))
            .returning(move |_, _| {
                let notification = notification.clone();
                Box::pin(async move { Ok(vec![notification]) })
            });

        let usecase = NotificationUseCase::new(Arc::new(notification_repo));
        let listed = usecase.list_notifications(user_id, 20).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, "match");
    }

    #[tokio::test]
    async fn repository_failure_is_internal() {
        let mut notification_repo = MockNotificationRepository::new();
        notification_repo
            .expect_mark_all_read()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("db down")) }));

        let usecase = NotificationUseCase::new(Arc::new(notification_repo));
        let err = usecase.mark_all_read(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
