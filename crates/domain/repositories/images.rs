use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{entities::images::ProfileImageEntity, value_objects::images::StoredObject};

#[async_trait]
#[automock]
pub trait ProfileImageRepository {
    async fn list_for_profile(&self, profile_id: Uuid) -> Result<Vec<ProfileImageEntity>>;
    async fn find_by_id(&self, image_id: Uuid) -> Result<Option<ProfileImageEntity>>;
    /// Appends an image at the next position. The first image of a profile is always main.
    async fn add_image(
        &self,
        profile_id: Uuid,
        stored_object: StoredObject,
        make_main: bool,
    ) -> Result<ProfileImageEntity>;
    async fn set_main(&self, profile_id: Uuid, image_id: Uuid) -> Result<ProfileImageEntity>;
    /// Removes the image and promotes the lowest-position survivor when it was main.
    async fn delete_image(&self, profile_id: Uuid, image_id: Uuid) -> Result<ProfileImageEntity>;
}
