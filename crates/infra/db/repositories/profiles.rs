use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{profile_images, profiles},
};
use domain::{
    entities::profiles::{InsertProfileEntity, ProfileEntity, UpdateProfileEntity},
    repositories::profiles::ProfileRepository,
    value_objects::matching::CandidateQuery,
};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, profile_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::id.eq(profile_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::username.eq(username))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_ids(&self, profile_ids: Vec<Uuid>) -> Result<Vec<ProfileEntity>> {
        if profile_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = profiles::table
            .filter(profiles::id.eq_any(profile_ids))
            .order(profiles::username.asc())
            .select(ProfileEntity::as_select())
            .load::<ProfileEntity>(&mut conn)?;

        Ok(results)
    }

    async fn exists_username_or_email(&self, username: &str, email: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let taken = select(exists(
            profiles::table.filter(profiles::username.eq(username).or(profiles::email.eq(email))),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(taken)
    }

    async fn create(&self, insert_profile_entity: InsertProfileEntity) -> Result<ProfileEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(profiles::table)
            .values(&insert_profile_entity)
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)?;

        Ok(result)
    }

    async fn update(
        &self,
        profile_id: Uuid,
        update_profile_entity: UpdateProfileEntity,
    ) -> Result<ProfileEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(profiles::table.filter(profiles::id.eq(profile_id)))
            .set(&update_profile_entity)
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)?;

        Ok(result)
    }

    async fn delete(&self, profile_id: Uuid) -> Result<Vec<String>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let storage_keys = conn.transaction::<Vec<String>, diesel::result::Error, _>(|tx| {
            let storage_keys = profile_images::table
                .filter(profile_images::profile_id.eq(profile_id))
                .select(profile_images::storage_key)
                .load::<String>(tx)?;

            delete(profiles::table.filter(profiles::id.eq(profile_id))).execute(tx)?;

            Ok(storage_keys)
        })?;

        Ok(storage_keys)
    }

    async fn list_candidates(&self, candidate_query: CandidateQuery) -> Result<Vec<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let categories: Vec<String> = candidate_query
            .categories
            .iter()
            .map(|category| category.to_string())
            .collect();

        let mut query = profiles::table
            .filter(profiles::id.ne_all(candidate_query.exclude_ids))
            .filter(profiles::username.ne(""))
            .filter(profiles::looking_for.eq_any(categories))
            .select(ProfileEntity::as_select())
            .into_boxed();

        if let Some(gender) = candidate_query.gender {
            query = query.filter(profiles::gender.eq(gender.to_string()));
        }

        // Substring prefilter; exact matching happens in the visibility rules.
        if let Some(location) = candidate_query.location.as_deref() {
            query = query.filter(profiles::location.ilike(format!("%{}%", escape_like(location))));
        }

        query = query.order(profiles::last_active_at.desc());

        if let Some(limit) = candidate_query.limit {
            query = query.limit(limit);
        }

        let results = query.load::<ProfileEntity>(&mut conn)?;

        Ok(results)
    }

    async fn touch_last_active(&self, profile_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(profiles::table.filter(profiles::id.eq(profile_id)))
            .set(profiles::last_active_at.eq(at))
            .execute(&mut conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::looking_for::LookingFor;

    const SCHEMA_SQL: &str =
        include_str!("../../../../migrations/2024-06-01-000000_create_loveny/up.sql");

    #[test]
    fn stored_categories_are_limited_to_canonical_names() {
        let allowed = LookingFor::ALL
            .iter()
            .map(|category| format!("'{}'", category.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        assert!(SCHEMA_SQL.contains(&format!("looking_for IN ({})", allowed)));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
