use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::matching::LikeEdgeChange;

#[async_trait]
#[automock]
pub trait LikeRepository {
    /// Flips the liker -> liked edge while holding a lock on the liker's profile row.
    async fn toggle_like(&self, liker_id: Uuid, liked_id: Uuid) -> Result<LikeEdgeChange>;
    async fn has_liked(&self, liker_id: Uuid, liked_id: Uuid) -> Result<bool>;
    /// Profiles `liker_id` has liked.
    async fn liked_ids(&self, liker_id: Uuid) -> Result<Vec<Uuid>>;
    /// Profiles that have liked `liked_id`.
    async fn liker_ids(&self, liked_id: Uuid) -> Result<Vec<Uuid>>;
    async fn mutual_match_ids(&self, profile_id: Uuid) -> Result<Vec<Uuid>>;
}
