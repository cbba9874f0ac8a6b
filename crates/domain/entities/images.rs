use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::profile_images;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profile_images)]
pub struct ProfileImageEntity {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub storage_key: String,
    pub url: String,
    pub position: i32,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = profile_images)]
pub struct InsertProfileImageEntity {
    pub profile_id: Uuid,
    pub storage_key: String,
    pub url: String,
    pub position: i32,
    pub is_main: bool,
}
