use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        genders::{Gender, Seeking},
        looking_for::LookingFor,
    },
    infra::db::postgres::schema::profiles,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profiles)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub seeking: Option<String>,
    pub looking_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: serde_json::Value,
    pub profile_picture_url: Option<String>,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileEntity {
    pub fn looking_for(&self) -> Option<LookingFor> {
        self.looking_for.as_deref().and_then(LookingFor::from_str)
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender.as_deref().and_then(Gender::from_str)
    }

    pub fn seeking(&self) -> Option<Seeking> {
        self.seeking.as_deref().and_then(Seeking::from_str)
    }

    pub fn has_handle(&self) -> bool {
        !self.username.trim().is_empty()
    }

    /// Whole years elapsed since birth, counting a year as 365.25 days.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let date_of_birth = self.date_of_birth?;
        let elapsed_days = (today - date_of_birth).num_days();
        if elapsed_days < 0 {
            return None;
        }
        Some((elapsed_days as f64 / 365.25).floor() as u32)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct InsertProfileEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub seeking: Option<String>,
    pub looking_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: serde_json::Value,
    pub last_active_at: DateTime<Utc>,
}

/// Owner-editable columns. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct UpdateProfileEntity {
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub seeking: Option<String>,
    pub looking_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Premium columns mirrored from the subscription on activation.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct PremiumMirrorEntity {
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
