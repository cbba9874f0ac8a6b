use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::images::ProfileImageEntity;

/// File extension for an accepted upload type, `None` when the type is not accepted.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub make_main: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageDto {
    pub id: Uuid,
    pub url: String,
    pub position: i32,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileImageEntity> for ImageDto {
    fn from(value: ProfileImageEntity) -> Self {
        Self {
            id: value.id,
            url: value.url,
            position: value.position,
            is_main: value.is_main,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_common_image_types_are_accepted() {
        assert_eq!(extension_for("image/JPEG"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }
}
