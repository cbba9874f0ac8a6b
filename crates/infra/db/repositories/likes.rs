use anyhow::Result;
use async_trait::async_trait;
use diesel::{Connection, RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{likes, profiles},
};
use domain::{
    entities::likes::InsertLikeEntity, repositories::likes::LikeRepository,
    value_objects::matching::LikeEdgeChange,
};

pub struct LikePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LikePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LikeRepository for LikePostgres {
    async fn toggle_like(&self, liker_id: Uuid, liked_id: Uuid) -> Result<LikeEdgeChange> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let change = conn.transaction::<LikeEdgeChange, diesel::result::Error, _>(|tx| {
            // Serializes concurrent toggles by the same actor.
            profiles::table
                .filter(profiles::id.eq(liker_id))
                .select(profiles::id)
                .for_update()
                .first::<Uuid>(tx)?;

            let removed = delete(
                likes::table
                    .filter(likes::liker_id.eq(liker_id))
                    .filter(likes::liked_id.eq(liked_id)),
            )
            .execute(tx)?;

            if removed > 0 {
                return Ok(LikeEdgeChange::Removed);
            }

            insert_into(likes::table)
                .values(&InsertLikeEntity { liker_id, liked_id })
                .on_conflict_do_nothing()
                .execute(tx)?;

            Ok(LikeEdgeChange::Created)
        })?;

        Ok(change)
    }

    async fn has_liked(&self, liker_id: Uuid, liked_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let liked = select(exists(
            likes::table
                .filter(likes::liker_id.eq(liker_id))
                .filter(likes::liked_id.eq(liked_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(liked)
    }

    async fn liked_ids(&self, liker_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = likes::table
            .filter(likes::liker_id.eq(liker_id))
            .select(likes::liked_id)
            .load::<Uuid>(&mut conn)?;

        Ok(results)
    }

    async fn liker_ids(&self, liked_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = likes::table
            .filter(likes::liked_id.eq(liked_id))
            .select(likes::liker_id)
            .load::<Uuid>(&mut conn)?;

        Ok(results)
    }

    async fn mutual_match_ids(&self, profile_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let (outgoing, incoming) = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let outgoing = likes::table
                .filter(likes::liker_id.eq(profile_id))
                .select(likes::liked_id)
                .load::<Uuid>(tx)?;
            let incoming = likes::table
                .filter(likes::liked_id.eq(profile_id))
                .select(likes::liker_id)
                .load::<Uuid>(tx)?;
            Ok((outgoing, incoming.into_iter().collect::<HashSet<Uuid>>()))
        })?;

        Ok(outgoing
            .into_iter()
            .filter(|id| incoming.contains(id))
            .collect())
    }
}
