use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    config::config_model::DotEnvyConfig,
    usecases::profiles::{ProfileError, ProfileUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            images::ProfileImageRepository, likes::LikeRepository, profiles::ProfileRepository,
            storage::ImageStorage, subscriptions::SubscriptionRepository,
        },
        value_objects::profiles::{CreateProfileModel, UpdateProfileModel},
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                images::ProfileImagePostgres, likes::LikePostgres, profiles::ProfilePostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
        storages::image_storage::S3ImageStorage,
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    image_storage: Arc<S3ImageStorage>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let usecase = ProfileUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(LikePostgres::new(Arc::clone(&db_pool))),
        Arc::new(ProfileImagePostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        image_storage,
        config.frontend.public_base_url.clone(),
    );

    Router::new()
        .route("/", post(create_profile))
        .route(
            "/me",
            get(get_own_profile)
                .patch(update_profile)
                .delete(delete_profile),
        )
        .route("/:username", get(view_profile))
        .with_state(Arc::new(usecase))
}

fn map_error(label: &str, err: ProfileError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = ?err, "profiles: {} failed", label);
    } else {
        warn!(status = status.as_u16(), error = %err, "profiles: {} rejected", label);
    }
    error_response(status, err.to_string())
}

pub async fn create_profile<P, L, I, S, St>(
    State(usecase): State<Arc<ProfileUseCase<P, L, I, S, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CreateProfileModel>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    info!(%user_id, "profiles: create request received");
    match usecase.create_profile(user_id, model).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(err) => map_error("create_profile", err),
    }
}

pub async fn get_own_profile<P, L, I, S, St>(
    State(usecase): State<Arc<ProfileUseCase<P, L, I, S, St>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    match usecase.get_own_profile(user_id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => map_error("get_own_profile", err),
    }
}

pub async fn update_profile<P, L, I, S, St>(
    State(usecase): State<Arc<ProfileUseCase<P, L, I, S, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<UpdateProfileModel>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    info!(%user_id, "profiles: update request received");
    match usecase.update_profile(user_id, model).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => map_error("update_profile", err),
    }
}

pub async fn delete_profile<P, L, I, S, St>(
    State(usecase): State<Arc<ProfileUseCase<P, L, I, S, St>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    info!(%user_id, "profiles: delete request received");
    match usecase.delete_profile(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error("delete_profile", err),
    }
}

pub async fn view_profile<P, L, I, S, St>(
    State(usecase): State<Arc<ProfileUseCase<P, L, I, S, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(username): Path<String>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    if let Err(err) = usecase.touch_activity(user_id).await {
        warn!(%user_id, error = %err, "profiles: failed to record activity");
    }

    match usecase.view_profile(user_id, &username).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => map_error("view_profile", err),
    }
}
