use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::likes;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub struct InsertLikeEntity {
    pub liker_id: Uuid,
    pub liked_id: Uuid,
}
