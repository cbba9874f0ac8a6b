use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    config::config_model::DotEnvyConfig,
    usecases::matching::{MatchingError, MatchingUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            likes::LikeRepository, notifications::NotificationRepository,
            profiles::ProfileRepository,
        },
        value_objects::matching::BrowseFilter,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            likes::LikePostgres, notifications::NotificationPostgres, profiles::ProfilePostgres,
        },
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct SwipeQuery {
    min_age: Option<u32>,
    max_age: Option<u32>,
    location: Option<String>,
    limit: Option<usize>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let usecase = MatchingUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(LikePostgres::new(Arc::clone(&db_pool))),
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool))),
        config.matching.swipe_page_size,
    );

    Router::new()
        .route("/browse", get(browse))
        .route("/swipe", get(swipe))
        .route("/matches", get(list_matches))
        .route("/likes/:username", post(toggle_like))
        .with_state(Arc::new(usecase))
}

fn map_error(label: &str, err: MatchingError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = ?err, "matching: {} failed", label);
    } else {
        warn!(status = status.as_u16(), error = %err, "matching: {} rejected", label);
    }
    error_response(status, err.to_string())
}

pub async fn browse<P, L, N>(
    State(usecase): State<Arc<MatchingUseCase<P, L, N>>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(filter): Query<BrowseFilter>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    info!(%user_id, ?filter, "matching: browse request received");
    match usecase.browse(user_id, filter).await {
        Ok(page) => Json(page).into_response(),
        Err(err) => map_error("browse", err),
    }
}

pub async fn swipe<P, L, N>(
    State(usecase): State<Arc<MatchingUseCase<P, L, N>>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<SwipeQuery>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    info!(%user_id, ?query, "matching: swipe request received");
    let filter = BrowseFilter {
        min_age: query.min_age,
        max_age: query.max_age,
        location: query.location,
    };

    match usecase.swipe(user_id, filter, query.limit).await {
        Ok(deck) => Json(deck).into_response(),
        Err(err) => map_error("swipe", err),
    }
}

pub async fn list_matches<P, L, N>(
    State(usecase): State<Arc<MatchingUseCase<P, L, N>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    match usecase.list_matches(user_id).await {
        Ok(matches) => Json(matches).into_response(),
        Err(err) => map_error("list_matches", err),
    }
}

pub async fn toggle_like<P, L, N>(
    State(usecase): State<Arc<MatchingUseCase<P, L, N>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(username): Path<String>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    info!(%user_id, target = %username, "matching: like toggle requested");
    match usecase.toggle_like(user_id, &username).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => map_error("toggle_like", err),
    }
}
