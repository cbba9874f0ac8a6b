use std::sync::Arc;

use crates::domain::{
    entities::images::ProfileImageEntity,
    repositories::{
        images::ProfileImageRepository, profiles::ProfileRepository, storage::ImageStorage,
    },
    value_objects::images::{ImageDto, ImageUpload, extension_for},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("profile not found")]
    ProfileNotFound,
    #[error("image not found")]
    ImageNotFound,
    #[error("image belongs to another profile")]
    NotOwner,
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("image upload is empty")]
    EmptyUpload,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GalleryError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GalleryError::ProfileNotFound | GalleryError::ImageNotFound => StatusCode::NOT_FOUND,
            GalleryError::NotOwner => StatusCode::FORBIDDEN,
            GalleryError::UnsupportedType(_) | GalleryError::EmptyUpload => StatusCode::BAD_REQUEST,
            GalleryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, GalleryError>;

pub struct GalleryUseCase<P, I, St>
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    image_repo: Arc<I>,
    storage: Arc<St>,
}

impl<P, I, St> GalleryUseCase<P, I, St>
where
    P: ProfileRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, image_repo: Arc<I>, storage: Arc<St>) -> Self {
        Self {
            profile_repo,
            image_repo,
            storage,
        }
    }

    async fn ensure_profile(&self, profile_id: Uuid) -> UseCaseResult<()> {
        let profile = self.profile_repo.find_by_id(profile_id).await.map_err(|err| {
            error!(%profile_id, db_error = ?err, "gallery: failed to load profile");
            GalleryError::Internal(err)
        })?;

        match profile {
            Some(_) => Ok(()),
            None => Err(GalleryError::ProfileNotFound),
        }
    }

    async fn owned_image(&self, actor_id: Uuid, image_id: Uuid) -> UseCaseResult<ProfileImageEntity> {
        let image = self
            .image_repo
            .find_by_id(image_id)
            .await
            .map_err(|err| {
                error!(%actor_id, %image_id, db_error = ?err, "gallery: failed to load image");
                GalleryError::Internal(err)
            })?
            .ok_or(GalleryError::ImageNotFound)?;

        if image.profile_id != actor_id {
            warn!(%actor_id, %image_id, owner_id = %image.profile_id, "gallery: image owned by another profile");
            return Err(GalleryError::NotOwner);
        }

        Ok(image)
    }

    pub async fn list_images(&self, profile_id: Uuid) -> UseCaseResult<Vec<ImageDto>> {
        self.ensure_profile(profile_id).await?;

        let mut images = self
            .image_repo
            .list_for_profile(profile_id)
            .await
            .map_err(|err| {
                error!(%profile_id, db_error = ?err, "gallery: failed to list images");
                GalleryError::Internal(err)
            })?;
        images.sort_by_key(|image| image.position);

        Ok(images.into_iter().map(ImageDto::from).collect())
    }

    pub async fn upload_image(&self, actor_id: Uuid, upload: ImageUpload) -> UseCaseResult<ImageDto> {
        if extension_for(&upload.content_type).is_none() {
            return Err(GalleryError::UnsupportedType(upload.content_type));
        }
        if upload.bytes.is_empty() {
            return Err(GalleryError::EmptyUpload);
        }

        self.ensure_profile(actor_id).await?;

        let size = upload.bytes.len();
        let stored = self
            .storage
            .upload_image(actor_id, upload.bytes, &upload.content_type)
            .await
            .map_err(|err| {
                error!(%actor_id, storage_error = ?err, "gallery: failed to store image");
                GalleryError::Internal(err)
            })?;
        let stored_key = stored.key.clone();

        let image = match self
            .image_repo
            .add_image(actor_id, stored, upload.make_main)
            .await
        {
            Ok(image) => image,
            Err(err) => {
                error!(%actor_id, db_error = ?err, "gallery: failed to record image");
                if let Err(cleanup_err) = self.storage.delete_object(&stored_key).await {
                    warn!(%actor_id, key = %stored_key, storage_error = ?cleanup_err, "gallery: failed to clean up orphaned object");
                }
                return Err(GalleryError::Internal(err));
            }
        };

        info!(
            %actor_id,
            image_id = %image.id,
            size,
            is_main = image.is_main,
            "gallery: image uploaded"
        );
        Ok(ImageDto::from(image))
    }

    pub async fn set_main_image(&self, actor_id: Uuid, image_id: Uuid) -> UseCaseResult<ImageDto> {
        self.owned_image(actor_id, image_id).await?;

        let image = self
            .image_repo
            .set_main(actor_id, image_id)
            .await
            .map_err(|err| {
                error!(%actor_id, %image_id, db_error = ?err, "gallery: failed to set main image");
                GalleryError::Internal(err)
            })?;

        info!(%actor_id, %image_id, "gallery: main image changed");
        Ok(ImageDto::from(image))
    }

    pub async fn delete_image(&self, actor_id: Uuid, image_id: Uuid) -> UseCaseResult<()> {
        self.owned_image(actor_id, image_id).await?;

        let removed = self
            .image_repo
            .delete_image(actor_id, image_id)
            .await
            .map_err(|err| {
                error!(%actor_id, %image_id, db_error = ?err, "gallery: failed to delete image");
                GalleryError::Internal(err)
            })?;

        if let Err(err) = self.storage.delete_object(&removed.storage_key).await {
            warn!(%actor_id, key = %removed.storage_key, storage_error = ?err, "gallery: failed to delete stored object");
        }

        info!(%actor_id, %image_id, was_main = removed.is_main, "gallery: image deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use crates::domain::{
        entities::profiles::ProfileEntity,
        repositories::{
            images::MockProfileImageRepository, profiles::MockProfileRepository,
            storage::MockImageStorage,
        },
        value_objects::images::StoredObject,
    };
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn profile(id: Uuid) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            bio: None,
            gender: None,
            seeking: None,
            looking_for: None,
            date_of_birth: None,
            location: None,
            phone_number: None,
            attributes: serde_json::json!({}),
            profile_picture_url: None,
            is_premium: false,
            premium_expires_at: None,
            last_active_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn image(profile_id: Uuid, position: i32, is_main: bool) -> ProfileImageEntity {
        ProfileImageEntity {
            id: Uuid::new_v4(),
            profile_id,
            storage_key: format!("profiles/{profile_id}/{position}.jpg"),
            url: format!("https://cdn.loveny.app/profiles/{profile_id}/{position}.jpg"),
            position,
            is_main,
            created_at: Utc::now(),
        }
    }

    fn existing_profile(profile_id: Uuid) -> MockProfileRepository {
        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .with(eq(profile_id))
            .returning(move |id| Box::pin(async move { Ok(Some(profile(id))) }));
        profile_repo
    }

    /// Image repository backed by a shared vector, applying the main-flag rules.
    fn in_memory_images(images: Arc<Mutex<Vec<ProfileImageEntity>>>) -> MockProfileImageRepository {
        let mut image_repo = MockProfileImageRepository::new();

        let store = Arc::clone(&images);
        image_repo.expect_find_by_id().returning(move |image_id| {
            let found = store.lock().unwrap().iter().find(|i| i.id == image_id).cloned();
            Box::pin(async move { Ok(found) })
        });

        let store = Arc::clone(&images);
        image_repo
            .expect_add_image()
            .returning(move |profile_id, stored: StoredObject, make_main| {
                let mut images = store.lock().unwrap();
                let is_main = make_main || images.is_empty();
                if is_main {
                    images.iter_mut().for_each(|i| i.is_main = false);
                }
                let position = images.iter().map(|i| i.position + 1).max().unwrap_or(0);
                let added = ProfileImageEntity {
                    id: Uuid::new_v4(),
                    profile_id,
                    storage_key: stored.key,
                    url: stored.url,
                    position,
                    is_main,
                    created_at: Utc::now(),
                };
                images.push(added.clone());
                Box::pin(async move { Ok(added) })
            });

        let store = Arc::clone(&images);
        image_repo.expect_set_main().returning(move |_, image_id| {
            let mut images = store.lock().unwrap();
            images.iter_mut().for_each(|i| i.is_main = i.id == image_id);
            let updated = images.iter().find(|i| i.id == image_id).cloned();
            Box::pin(async move { updated.ok_or_else(|| anyhow!("missing image")) })
        });

        let store = Arc::clone(&images);
        image_repo.expect_delete_image().returning(move |_, image_id| {
            let mut images = store.lock().unwrap();
            let index = images.iter().position(|i| i.id == image_id);
            let removed = index.map(|index| images.remove(index));
            if removed.as_ref().is_some_and(|r| r.is_main) {
                if let Some(next) = images.iter_mut().min_by_key(|i| i.position) {
                    next.is_main = true;
                }
            }
            Box::pin(async move { removed.ok_or_else(|| anyhow!("missing image")) })
        });

        image_repo
    }

    fn jpeg(make_main: bool) -> ImageUpload {
        ImageUpload {
            bytes: vec![0xff, 0xd8, 0xff],
            content_type: "image/jpeg".to_string(),
            make_main,
        }
    }

    fn accepting_storage() -> MockImageStorage {
        let mut storage = MockImageStorage::new();
        storage.expect_upload_image().returning(|profile_id, _, _| {
            let key = format!("profiles/{}/{}.jpg", profile_id, Uuid::new_v4());
            let url = format!("https://cdn.loveny.app/{}", key);
            Box::pin(async move { Ok(StoredObject { key, url }) })
        });
        storage
    }

    #[tokio::test]
    async fn making_an_image_main_clears_the_previous_main() {
        let actor_id = Uuid::new_v4();
        let images = Arc::new(Mutex::new(Vec::new()));
        let usecase = GalleryUseCase::new(
            Arc::new(existing_profile(actor_id)),
            Arc::new(in_memory_images(Arc::clone(&images))),
            Arc::new(accepting_storage()),
        );

        let first = usecase.upload_image(actor_id, jpeg(false)).await.unwrap();
        assert!(first.is_main);

        let second = usecase.upload_image(actor_id, jpeg(false)).await.unwrap();
        assert!(!second.is_main);
        assert_eq!(second.position, first.position + 1);

        usecase.set_main_image(actor_id, second.id).await.unwrap();

        let mains: Vec<Uuid> = images.lock().unwrap().iter().filter(|i| i.is_main).map(|i| i.id).collect();
        assert_eq!(mains, vec![second.id]);
    }

    #[tokio::test]
    async fn deleting_main_image_promotes_lowest_position() {
        let actor_id = Uuid::new_v4();
        let main = image(actor_id, 0, true);
        let second = image(actor_id, 1, false);
        let third = image(actor_id, 2, false);
        let images = Arc::new(Mutex::new(vec![main.clone(), third.clone(), second.clone()]));

        let mut storage = MockImageStorage::new();
        storage
            .expect_delete_object()
            .withf(move |key| key == format!("profiles/{actor_id}/0.jpg"))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = GalleryUseCase::new(
            Arc::new(existing_profile(actor_id)),
            Arc::new(in_memory_images(Arc::clone(&images))),
            Arc::new(storage),
        );

        usecase.delete_image(actor_id, main.id).await.unwrap();

        let images = images.lock().unwrap();
        assert_eq!(images.len(), 2);
        let promoted = images.iter().find(|i| i.is_main).unwrap();
        assert_eq!(promoted.id, second.id);
    }

    #[tokio::test]
    async fn foreign_image_cannot_be_touched() {
        let actor_id = Uuid::new_v4();
        let other = image(Uuid::new_v4(), 0, true);
        let images = Arc::new(Mutex::new(vec![other.clone()]));

        let mut storage = MockImageStorage::new();
        storage.expect_delete_object().never();

        let usecase = GalleryUseCase::new(
            Arc::new(existing_profile(actor_id)),
            Arc::new(in_memory_images(Arc::clone(&images))),
            Arc::new(storage),
        );

        let err = usecase.delete_image(actor_id, other.id).await.unwrap_err();
        assert!(matches!(err, GalleryError::NotOwner));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);

        let err = usecase.set_main_image(actor_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, GalleryError::ImageNotFound));
        assert_eq!(images.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_before_storage() {
        let mut storage = MockImageStorage::new();
        storage.expect_upload_image().never();

        let usecase = GalleryUseCase::new(
            Arc::new(MockProfileRepository::new()),
            Arc::new(MockProfileImageRepository::new()),
            Arc::new(storage),
        );

        let upload = ImageUpload {
            bytes: b"%PDF-1.7".to_vec(),
            content_type: "application/pdf".to_string(),
            make_main: false,
        };
        let err = usecase.upload_image(Uuid::new_v4(), upload).await.unwrap_err();
        assert!(matches!(err, GalleryError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn stored_object_is_removed_when_recording_fails() {
        let actor_id = Uuid::new_v4();

        let mut image_repo = MockProfileImageRepository::new();
        image_repo
            .expect_add_image()
            .returning(|_, _, _| Box::pin(async { Err(anyhow!("connection reset")) }));

        let mut storage = accepting_storage();
        storage
            .expect_delete_object()
            .withf(move |key| key.starts_with(&format!("profiles/{actor_id}/")))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = GalleryUseCase::new(
            Arc::new(existing_profile(actor_id)),
            Arc::new(image_repo),
            Arc::new(storage),
        );

        let err = usecase.upload_image(actor_id, jpeg(true)).await.unwrap_err();
        assert!(matches!(err, GalleryError::Internal(_)));
    }
}
