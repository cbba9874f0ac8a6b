use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::profiles::{InsertProfileEntity, ProfileEntity, UpdateProfileEntity},
    value_objects::enums::{
        genders::{Gender, Seeking},
        looking_for::LookingFor,
    },
};

/// Sentinel returned when a profile has no image at all.
pub const DEFAULT_IMAGE_PLACEHOLDER: &str = "default";

pub const MAX_USERNAME_LEN: usize = 150;

pub fn resolve_image_url(main_image_url: Option<&str>, profile_picture_url: Option<&str>) -> String {
    main_image_url
        .or(profile_picture_url)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_IMAGE_PLACEHOLDER)
        .to_string()
}

fn parse_choice<T>(field: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T> {
    match parse(value) {
        Some(parsed) => Ok(parsed),
        None => bail!("Invalid {}: {}", field, value),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileModel {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub seeking: Option<String>,
    pub looking_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: Option<serde_json::Value>,
}

impl CreateProfileModel {
    pub fn into_entity(self, id: Uuid, now: DateTime<Utc>) -> Result<InsertProfileEntity> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            bail!("Username is required");
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            bail!("Username must be at most {} characters", MAX_USERNAME_LEN);
        }

        let email = self.email.trim().to_lowercase();
        if !email.contains('@') {
            bail!("Invalid email: {}", self.email);
        }

        let choices = ChoiceFields::parse(
            self.gender.as_deref(),
            self.seeking.as_deref(),
            self.looking_for.as_deref(),
        )?;
        let attributes = validate_attributes(self.attributes)?.unwrap_or_else(|| serde_json::json!({}));

        Ok(InsertProfileEntity {
            id,
            username,
            email,
            bio: blank_to_none(self.bio),
            gender: choices.gender,
            seeking: choices.seeking,
            looking_for: choices.looking_for,
            date_of_birth: validate_birth_date(self.date_of_birth, now)?,
            location: blank_to_none(self.location),
            phone_number: blank_to_none(self.phone_number),
            attributes,
            last_active_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileModel {
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub seeking: Option<String>,
    pub looking_for: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: Option<serde_json::Value>,
}

impl UpdateProfileModel {
    pub fn into_entity(self, now: DateTime<Utc>) -> Result<UpdateProfileEntity> {
        let choices = ChoiceFields::parse(
            self.gender.as_deref(),
            self.seeking.as_deref(),
            self.looking_for.as_deref(),
        )?;

        Ok(UpdateProfileEntity {
            bio: self.bio.map(|bio| bio.trim().to_string()),
            gender: choices.gender,
            seeking: choices.seeking,
            looking_for: choices.looking_for,
            date_of_birth: validate_birth_date(self.date_of_birth, now)?,
            location: self.location.map(|location| location.trim().to_string()),
            phone_number: self.phone_number.map(|phone| phone.trim().to_string()),
            attributes: validate_attributes(self.attributes)?,
            updated_at: Some(now),
        })
    }
}

struct ChoiceFields {
    gender: Option<String>,
    seeking: Option<String>,
    looking_for: Option<String>,
}

impl ChoiceFields {
    fn parse(gender: Option<&str>, seeking: Option<&str>, looking_for: Option<&str>) -> Result<Self> {
        Ok(Self {
            gender: gender
                .map(|value| parse_choice("gender", value, Gender::from_str))
                .transpose()?
                .map(|gender| gender.to_string()),
            seeking: seeking
                .map(|value| parse_choice("seeking", value, Seeking::from_str))
                .transpose()?
                .map(|seeking| seeking.to_string()),
            looking_for: looking_for
                .map(|value| parse_choice("looking_for", value, LookingFor::from_str))
                .transpose()?
                .map(|looking_for| looking_for.to_string()),
        })
    }
}

fn validate_birth_date(date_of_birth: Option<NaiveDate>, now: DateTime<Utc>) -> Result<Option<NaiveDate>> {
    if let Some(date_of_birth) = date_of_birth {
        if date_of_birth > now.date_naive() {
            bail!("Invalid date_of_birth: cannot be in the future");
        }
    }
    Ok(date_of_birth)
}

fn validate_attributes(attributes: Option<serde_json::Value>) -> Result<Option<serde_json::Value>> {
    match attributes {
        None => Ok(None),
        Some(value @ serde_json::Value::Object(_)) => Ok(Some(value)),
        Some(_) => bail!("Invalid attributes: expected a JSON object"),
    }
}

/// The caller's own profile, including private fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub seeking: Option<Seeking>,
    pub looking_for: Option<LookingFor>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub attributes: serde_json::Value,
    pub image_url: String,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub last_active_at: DateTime<Utc>,
}

impl ProfileDto {
    pub fn from_entity(profile: ProfileEntity, today: NaiveDate) -> Self {
        Self {
            age: profile.age_on(today),
            gender: profile.gender(),
            seeking: profile.seeking(),
            looking_for: profile.looking_for(),
            image_url: resolve_image_url(None, profile.profile_picture_url.as_deref()),
            id: profile.id,
            username: profile.username,
            email: profile.email,
            bio: profile.bio,
            date_of_birth: profile.date_of_birth,
            location: profile.location,
            phone_number: profile.phone_number,
            attributes: profile.attributes,
            is_premium: profile.is_premium,
            premium_expires_at: profile.premium_expires_at,
            last_active_at: profile.last_active_at,
        }
    }
}

/// Another member's profile as seen by the caller. Contact details stay hidden.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileDetailDto {
    pub id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub looking_for: Option<LookingFor>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub attributes: serde_json::Value,
    pub image_url: String,
    pub last_active_at: DateTime<Utc>,
    pub has_liked: bool,
    pub is_matched: bool,
    pub whatsapp_link: Option<String>,
    pub upgrade_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_model() -> CreateProfileModel {
        CreateProfileModel {
            username: "  ada ".to_string(),
            email: "Ada@Example.com".to_string(),
            bio: Some("   ".to_string()),
            gender: Some("f".to_string()),
            seeking: Some("M".to_string()),
            looking_for: Some("dating".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1998, 3, 1),
            location: Some(" Lagos ".to_string()),
            phone_number: None,
            attributes: None,
        }
    }

    #[test]
    fn create_model_normalizes_fields() {
        let entity = create_model().into_entity(Uuid::new_v4(), Utc::now()).unwrap();

        assert_eq!(entity.username, "ada");
        assert_eq!(entity.email, "ada@example.com");
        assert_eq!(entity.bio, None);
        assert_eq!(entity.gender.as_deref(), Some("F"));
        assert_eq!(entity.looking_for.as_deref(), Some("DATING"));
        assert_eq!(entity.location.as_deref(), Some("Lagos"));
        assert_eq!(entity.attributes, serde_json::json!({}));
    }

    #[test]
    fn create_model_rejects_unknown_choices_and_blank_username() {
        let mut model = create_model();
        model.looking_for = Some("FRIENDS".to_string());
        assert!(model.into_entity(Uuid::new_v4(), Utc::now()).is_err());

        let mut model = create_model();
        model.username = "   ".to_string();
        assert!(model.into_entity(Uuid::new_v4(), Utc::now()).is_err());
    }

    #[test]
    fn update_model_only_sets_supplied_fields() {
        let now = Utc::now();
        let update = UpdateProfileModel {
            seeking: Some("a".to_string()),
            ..Default::default()
        }
        .into_entity(now)
        .unwrap();

        assert_eq!(
            update,
            UpdateProfileEntity {
                seeking: Some("A".to_string()),
                updated_at: Some(now),
                ..Default::default()
            }
        );
    }

    #[test]
    fn attributes_must_be_an_object() {
        let update = UpdateProfileModel {
            attributes: Some(serde_json::json!(["tall"])),
            ..Default::default()
        };
        assert!(update.into_entity(Utc::now()).is_err());
    }

    #[test]
    fn image_resolution_prefers_main_then_picture_then_placeholder() {
        assert_eq!(resolve_image_url(Some("https://a/main.jpg"), Some("https://a/pic.jpg")), "https://a/main.jpg");
        assert_eq!(resolve_image_url(None, Some("https://a/pic.jpg")), "https://a/pic.jpg");
        assert_eq!(resolve_image_url(None, None), DEFAULT_IMAGE_PLACEHOLDER);
    }
}
