use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, PgConnection, RunQueryDsl, delete, dsl::max, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{profile_images, profiles},
};
use domain::{
    entities::images::{InsertProfileImageEntity, ProfileImageEntity},
    repositories::images::ProfileImageRepository,
    value_objects::images::StoredObject,
};

pub struct ProfileImagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfileImagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn lock_profile(tx: &mut PgConnection, profile_id: Uuid) -> QueryResult<Uuid> {
    profiles::table
        .filter(profiles::id.eq(profile_id))
        .select(profiles::id)
        .for_update()
        .first::<Uuid>(tx)
}

fn clear_main_flag(tx: &mut PgConnection, profile_id: Uuid) -> QueryResult<usize> {
    update(
        profile_images::table
            .filter(profile_images::profile_id.eq(profile_id))
            .filter(profile_images::is_main.eq(true)),
    )
    .set(profile_images::is_main.eq(false))
    .execute(tx)
}

fn sync_profile_picture(tx: &mut PgConnection, profile_id: Uuid, url: Option<&str>) -> QueryResult<usize> {
    update(profiles::table.filter(profiles::id.eq(profile_id)))
        .set((
            profiles::profile_picture_url.eq(url),
            profiles::updated_at.eq(Utc::now()),
        ))
        .execute(tx)
}

#[async_trait]
impl ProfileImageRepository for ProfileImagePostgres {
    async fn list_for_profile(&self, profile_id: Uuid) -> Result<Vec<ProfileImageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = profile_images::table
            .filter(profile_images::profile_id.eq(profile_id))
            .order((profile_images::position.asc(), profile_images::created_at.asc()))
            .select(ProfileImageEntity::as_select())
            .load::<ProfileImageEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, image_id: Uuid) -> Result<Option<ProfileImageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profile_images::table
            .filter(profile_images::id.eq(image_id))
            .select(ProfileImageEntity::as_select())
            .first::<ProfileImageEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn add_image(
        &self,
        profile_id: Uuid,
        stored_object: StoredObject,
        make_main: bool,
    ) -> Result<ProfileImageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let image = conn.transaction::<ProfileImageEntity, diesel::result::Error, _>(|tx| {
            lock_profile(tx, profile_id)?;

            let last_position = profile_images::table
                .filter(profile_images::profile_id.eq(profile_id))
                .select(max(profile_images::position))
                .first::<Option<i32>>(tx)?;

            let is_main = make_main || last_position.is_none();
            if is_main {
                clear_main_flag(tx, profile_id)?;
            }

            let image = insert_into(profile_images::table)
                .values(&InsertProfileImageEntity {
                    profile_id,
                    storage_key: stored_object.key,
                    url: stored_object.url,
                    position: last_position.map_or(0, |position| position + 1),
                    is_main,
                })
                .returning(ProfileImageEntity::as_returning())
                .get_result::<ProfileImageEntity>(tx)?;

            if is_main {
                sync_profile_picture(tx, profile_id, Some(&image.url))?;
            }

            Ok(image)
        })?;

        Ok(image)
    }

    async fn set_main(&self, profile_id: Uuid, image_id: Uuid) -> Result<ProfileImageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let image = conn.transaction::<ProfileImageEntity, diesel::result::Error, _>(|tx| {
            lock_profile(tx, profile_id)?;
            clear_main_flag(tx, profile_id)?;

            let image = update(
                profile_images::table
                    .filter(profile_images::id.eq(image_id))
                    .filter(profile_images::profile_id.eq(profile_id)),
            )
            .set(profile_images::is_main.eq(true))
            .returning(ProfileImageEntity::as_returning())
            .get_result::<ProfileImageEntity>(tx)?;

            sync_profile_picture(tx, profile_id, Some(&image.url))?;

            Ok(image)
        })?;

        Ok(image)
    }

    async fn delete_image(&self, profile_id: Uuid, image_id: Uuid) -> Result<ProfileImageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let removed = conn.transaction::<ProfileImageEntity, diesel::result::Error, _>(|tx| {
            lock_profile(tx, profile_id)?;

            let removed = delete(
                profile_images::table
                    .filter(profile_images::id.eq(image_id))
                    .filter(profile_images::profile_id.eq(profile_id)),
            )
            .returning(ProfileImageEntity::as_returning())
            .get_result::<ProfileImageEntity>(tx)?;

            if removed.is_main {
                let successor = profile_images::table
                    .filter(profile_images::profile_id.eq(profile_id))
                    .order((profile_images::position.asc(), profile_images::created_at.asc()))
                    .select(ProfileImageEntity::as_select())
                    .first::<ProfileImageEntity>(tx)
                    .optional()?;

                match successor {
                    Some(successor) => {
                        update(profile_images::table.filter(profile_images::id.eq(successor.id)))
                            .set(profile_images::is_main.eq(true))
                            .execute(tx)?;
                        sync_profile_picture(tx, profile_id, Some(&successor.url))?;
                    }
                    None => {
                        sync_profile_picture(tx, profile_id, None)?;
                    }
                }
            }

            Ok(removed)
        })?;

        Ok(removed)
    }
}
