use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::images::StoredObject;

#[async_trait]
#[automock]
pub trait ImageStorage {
    async fn upload_image(
        &self,
        profile_id: Uuid,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject>;

    async fn delete_object(&self, key: &str) -> Result<()>;
}
