use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::profiles::{InsertProfileEntity, ProfileEntity, UpdateProfileEntity},
    value_objects::matching::CandidateQuery,
};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_id(&self, profile_id: Uuid) -> Result<Option<ProfileEntity>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileEntity>>;
    async fn find_by_ids(&self, profile_ids: Vec<Uuid>) -> Result<Vec<ProfileEntity>>;
    async fn exists_username_or_email(&self, username: &str, email: &str) -> Result<bool>;
    async fn create(&self, insert_profile_entity: InsertProfileEntity) -> Result<ProfileEntity>;
    async fn update(
        &self,
        profile_id: Uuid,
        update_profile_entity: UpdateProfileEntity,
    ) -> Result<ProfileEntity>;
    /// Deletes the profile and everything cascading from it. Returns the storage keys
    /// of the images that were attached so their objects can be removed.
    async fn delete(&self, profile_id: Uuid) -> Result<Vec<String>>;
    async fn list_candidates(&self, query: CandidateQuery) -> Result<Vec<ProfileEntity>>;
    async fn touch_last_active(&self, profile_id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
