use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    usecases::notifications::NotificationUseCase,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::notifications::NotificationRepository,
        value_objects::notifications::NotificationListQuery,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::notifications::NotificationPostgres,
    },
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usecase = NotificationUseCase::new(Arc::new(NotificationPostgres::new(db_pool)));

    Router::new()
        .route("/", get(list_notifications))
        .route("/read", post(mark_all_read))
        .with_state(Arc::new(usecase))
}

pub async fn list_notifications<N>(
    State(usecase): State<Arc<NotificationUseCase<N>>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Response
where
    N: NotificationRepository + Send + Sync + 'static,
{
    match usecase.list_notifications(user_id, query.limit()).await {
        Ok(notifications) => Json(notifications).into_response(),
        Err(err) => {
            error!(%user_id, error = ?err, "notifications: failed to list notifications");
            error_response(err.status_code(), err.to_string())
        }
    }
}

pub async fn mark_all_read<N>(
    State(usecase): State<Arc<NotificationUseCase<N>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    N: NotificationRepository + Send + Sync + 'static,
{
    match usecase.mark_all_read(user_id).await {
        Ok(updated) => Json(json!({ "updated": updated })).into_response(),
        Err(err) => {
            error!(%user_id, error = ?err, "notifications: failed to mark notifications read");
            error_response(err.status_code(), err.to_string())
        }
    }
}
