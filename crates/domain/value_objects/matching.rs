use std::collections::HashSet;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::profiles::ProfileEntity,
    value_objects::{
        enums::{genders::Gender, looking_for::LookingFor},
        profiles::resolve_image_url,
    },
};

pub const MAX_FILTER_AGE: u32 = 120;
pub const DEFAULT_SWIPE_PAGE_SIZE: usize = 20;
pub const MAX_SWIPE_PAGE_SIZE: usize = 50;

/// Optional narrowing a viewer applies on top of the category and gender rules.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BrowseFilter {
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub location: Option<String>,
}

impl BrowseFilter {
    pub fn normalize(self) -> Result<Self> {
        for age in [self.min_age, self.max_age].into_iter().flatten() {
            if age > MAX_FILTER_AGE {
                bail!("Invalid filter: age must be at most {}", MAX_FILTER_AGE);
            }
        }

        if let (Some(min_age), Some(max_age)) = (self.min_age, self.max_age) {
            if min_age > max_age {
                bail!("Invalid filter: min_age is greater than max_age");
            }
        }

        let location = self
            .location
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            min_age: self.min_age,
            max_age: self.max_age,
            location,
        })
    }

    pub fn has_age_bounds(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }
}

/// Categories a viewer may be shown. An unset viewer category falls back to every valid one.
pub fn visible_categories(viewer_category: Option<LookingFor>) -> Vec<LookingFor> {
    match viewer_category {
        Some(category) => vec![category.display_category()],
        None => LookingFor::ALL.to_vec(),
    }
}

/// Gender a candidate must have. Only like-for-like categories with a concrete seeking value apply it.
pub fn required_gender(viewer: &ProfileEntity) -> Option<Gender> {
    let category = viewer.looking_for()?;
    if !category.is_symmetric() {
        return None;
    }
    viewer.seeking()?.as_gender()
}

pub fn is_visible(
    viewer: &ProfileEntity,
    candidate: &ProfileEntity,
    filter: &BrowseFilter,
    today: NaiveDate,
) -> bool {
    if candidate.id == viewer.id || !candidate.has_handle() {
        return false;
    }

    let Some(candidate_category) = candidate.looking_for() else {
        return false;
    };
    if !visible_categories(viewer.looking_for()).contains(&candidate_category) {
        return false;
    }

    if let Some(gender) = required_gender(viewer) {
        if candidate.gender() != Some(gender) {
            return false;
        }
    }

    if filter.has_age_bounds() {
        let Some(age) = candidate.age_on(today) else {
            return false;
        };
        if filter.min_age.is_some_and(|min_age| age < min_age)
            || filter.max_age.is_some_and(|max_age| age > max_age)
        {
            return false;
        }
    }

    if let Some(location) = filter.location.as_deref() {
        let matches_location = candidate
            .location
            .as_deref()
            .is_some_and(|value| value.trim().to_lowercase() == location.to_lowercase());
        if !matches_location {
            return false;
        }
    }

    true
}

/// Storage-side prefilter. `is_visible` stays authoritative over whatever it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub categories: Vec<LookingFor>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub exclude_ids: Vec<Uuid>,
    pub limit: Option<i64>,
}

impl CandidateQuery {
    pub fn for_viewer(viewer: &ProfileEntity, filter: &BrowseFilter) -> Self {
        Self {
            categories: visible_categories(viewer.looking_for()),
            gender: required_gender(viewer),
            location: filter.location.clone(),
            exclude_ids: vec![viewer.id],
            limit: None,
        }
    }
}

/// Result of flipping a directed like edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeEdgeChange {
    Created,
    Removed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
    Liked,
    Unliked,
    Matched,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LikeToggleDto {
    pub target_id: Uuid,
    pub target_username: String,
    pub state: LikeState,
    pub has_liked: bool,
    pub is_matched: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileCardDto {
    pub id: Uuid,
    pub username: String,
    pub looking_for: Option<LookingFor>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub image_url: String,
    pub last_active_at: DateTime<Utc>,
    pub has_liked: bool,
    pub is_matched: bool,
}

impl ProfileCardDto {
    pub fn from_profile(
        profile: &ProfileEntity,
        today: NaiveDate,
        liked_by_viewer: &HashSet<Uuid>,
        likes_viewer: &HashSet<Uuid>,
    ) -> Self {
        let has_liked = liked_by_viewer.contains(&profile.id);
        Self {
            id: profile.id,
            username: profile.username.clone(),
            looking_for: profile.looking_for(),
            gender: profile.gender(),
            age: profile.age_on(today),
            location: profile.location.clone(),
            image_url: resolve_image_url(None, profile.profile_picture_url.as_deref()),
            last_active_at: profile.last_active_at,
            has_liked,
            is_matched: has_liked && likes_viewer.contains(&profile.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryGroupDto {
    pub category: LookingFor,
    pub profiles: Vec<ProfileCardDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BrowseDto {
    pub viewer_category: Option<LookingFor>,
    pub groups: Vec<CategoryGroupDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SwipeDeckDto {
    pub profiles: Vec<ProfileCardDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchesDto {
    pub matches: Vec<ProfileCardDto>,
    pub by_category: Vec<CategoryGroupDto>,
}

/// Groups cards under the viewer's display category, most recently active first.
///
/// A viewer with a category always gets exactly one group, possibly empty. A viewer
/// without one gets a group per category that has at least one card.
pub fn group_by_category(
    cards: Vec<ProfileCardDto>,
    viewer_category: Option<LookingFor>,
) -> Vec<CategoryGroupDto> {
    let mut groups: Vec<CategoryGroupDto> = visible_categories(viewer_category)
        .into_iter()
        .map(|category| CategoryGroupDto {
            category,
            profiles: Vec::new(),
        })
        .collect();

    for card in cards {
        if let Some(group) = groups
            .iter_mut()
            .find(|group| Some(group.category) == card.looking_for)
        {
            group.profiles.push(card);
        }
    }

    for group in groups.iter_mut() {
        group
            .profiles
            .sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
    }

    if viewer_category.is_none() {
        groups.retain(|group| !group.profiles.is_empty());
    }

    groups
}
