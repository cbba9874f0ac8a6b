use crate::{
    auth::AuthUser,
    axum_http::error_responses::{AppError, error_response},
    usecases::gallery::{GalleryError, GalleryUseCase},
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use crates::{
    domain::{
        repositories::{
            images::ProfileImageRepository, profiles::ProfileRepository, storage::ImageStorage,
        },
        value_objects::images::ImageUpload,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{images::ProfileImagePostgres, profiles::ProfilePostgres},
        },
        storages::image_storage::{S3ImageStorage, content_type_for_file_name},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const IMAGE_FIELD: &str = "image";
const MAKE_MAIN_FIELD: &str = "make_main";

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    image_storage: Arc<S3ImageStorage>,
    body_limit_bytes: usize,
) -> Router {
    let usecase = GalleryUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(ProfileImagePostgres::new(Arc::clone(&db_pool))),
        image_storage,
    );

    // `:id` is a profile id on GET and an image id everywhere else.
    let router = Router::new()
        .route("/", post(upload_image))
        .route("/:id", get(list_images).delete(delete_image))
        .route("/:id/main", put(set_main_image));

    with_upload_limit(router, body_limit_bytes).with_state(Arc::new(usecase))
}

/// `Multipart` caps bodies at 2 MB unless told otherwise.
fn with_upload_limit<S>(router: Router<S>, body_limit_bytes: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(DefaultBodyLimit::max(body_limit_bytes))
}

fn map_error(label: &str, err: GalleryError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = ?err, "gallery: {} failed", label);
    } else {
        warn!(status = status.as_u16(), error = %err, "gallery: {} rejected", label);
    }
    error_response(status, err.to_string())
}

/// Reads the `image` file part and the optional `make_main` flag.
async fn read_upload(mut multipart: Multipart) -> Result<ImageUpload, AppError> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut make_main = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::from)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| field.file_name().and_then(content_type_for_file_name))
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(AppError::from)?;
                image = Some((bytes.to_vec(), content_type));
            }
            Some(MAKE_MAIN_FIELD) => {
                let value = field
                    .text()
                    .await
                    .map_err(AppError::from)?;
                make_main = matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let (bytes, content_type) =
        image.ok_or_else(|| AppError::BadRequest(format!("missing `{}` file field", IMAGE_FIELD)))?;

    Ok(ImageUpload {
        bytes,
        content_type,
        make_main,
    })
}

pub async fn list_images<P, I, St>(
    State(usecase): State<Arc<GalleryUseCase<P, I, St>>>,
    _auth: AuthUser,
    Path(profile_id): Path<Uuid>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    match usecase.list_images(profile_id).await {
        Ok(images) => Json(images).into_response(),
        Err(err) => map_error("list_images", err),
    }
}

pub async fn upload_image<P, I, St>(
    State(usecase): State<Arc<GalleryUseCase<P, I, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    multipart: Multipart,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    info!(%user_id, "gallery: upload request received");
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => {
            warn!(%user_id, error = %err, "gallery: invalid upload form");
            return err.into_response();
        }
    };

    match usecase.upload_image(user_id, upload).await {
        Ok(image) => (StatusCode::CREATED, Json(image)).into_response(),
        Err(err) => map_error("upload_image", err),
    }
}

pub async fn set_main_image<P, I, St>(
    State(usecase): State<Arc<GalleryUseCase<P, I, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(image_id): Path<Uuid>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    match usecase.set_main_image(user_id, image_id).await {
        Ok(image) => Json(image).into_response(),
        Err(err) => map_error("set_main_image", err),
    }
}

pub async fn delete_image<P, I, St>(
    State(usecase): State<Arc<GalleryUseCase<P, I, St>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(image_id): Path<Uuid>,
) -> Response
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    match usecase.delete_image(user_id, image_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error("delete_image", err),
    }
}
