use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::profiles::ProfileEntity,
    repositories::{
        images::ProfileImageRepository, likes::LikeRepository, profiles::ProfileRepository,
        storage::ImageStorage, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        contact::{profile_url, whatsapp_link},
        profiles::{
            CreateProfileModel, ProfileDetailDto, ProfileDto, UpdateProfileModel,
            resolve_image_url,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::entitlement::EntitlementResolver;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,
    #[error("a profile already exists for this account")]
    AlreadyExists,
    #[error("username or email is already taken")]
    Conflict,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProfileError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ProfileError::NotFound => StatusCode::NOT_FOUND,
            ProfileError::AlreadyExists | ProfileError::Conflict => StatusCode::CONFLICT,
            ProfileError::Invalid(_) => StatusCode::BAD_REQUEST,
            ProfileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ProfileError>;

pub struct ProfileUseCase<P, L, I, S, St>
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    like_repo: Arc<L>,
    image_repo: Arc<I>,
    storage: Arc<St>,
    entitlement: EntitlementResolver<S>,
    public_base_url: String,
}

impl<P, L, I, S, St> ProfileUseCase<P, L, I, S, St>
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    I: ProfileImageRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    St: ImageStorage + Send + Sync + 'static,
{
    pub fn new(
        profile_repo: Arc<P>,
        like_repo: Arc<L>,
        image_repo: Arc<I>,
        subscription_repo: Arc<S>,
        storage: Arc<St>,
        public_base_url: String,
    ) -> Self {
        Self {
            profile_repo,
            like_repo,
            image_repo,
            storage,
            entitlement: EntitlementResolver::new(subscription_repo),
            public_base_url,
        }
    }

    async fn load_profile(&self, profile_id: Uuid) -> UseCaseResult<ProfileEntity> {
        self.profile_repo
            .find_by_id(profile_id)
            .await
            .map_err(|err| {
                error!(%profile_id, db_error = ?err, "profiles: failed to load profile");
                ProfileError::Internal(err)
            })?
            .ok_or(ProfileError::NotFound)
    }

    pub async fn create_profile(
        &self,
        user_id: Uuid,
        model: CreateProfileModel,
    ) -> UseCaseResult<ProfileDto> {
        let now = Utc::now();
        let insert = model
            .into_entity(user_id, now)
            .map_err(|err| ProfileError::Invalid(err.to_string()))?;

        let existing = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "profiles: failed to check existing profile");
            ProfileError::Internal(err)
        })?;
        if existing.is_some() {
            warn!(%user_id, "profiles: profile already exists");
            return Err(ProfileError::AlreadyExists);
        }

        let taken = self
            .profile_repo
            .exists_username_or_email(&insert.username, &insert.email)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "profiles: failed to check username and email");
                ProfileError::Internal(err)
            })?;
        if taken {
            warn!(%user_id, username = %insert.username, "profiles: username or email taken");
            return Err(ProfileError::Conflict);
        }

        let profile = self.profile_repo.create(insert).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "profiles: failed to create profile");
            ProfileError::Internal(err)
        })?;

        info!(%user_id, username = %profile.username, "profiles: profile created");
        Ok(ProfileDto::from_entity(profile, now.date_naive()))
    }

    pub async fn get_own_profile(&self, user_id: Uuid) -> UseCaseResult<ProfileDto> {
        let profile = self.load_profile(user_id).await?;
        Ok(ProfileDto::from_entity(profile, Utc::now().date_naive()))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        model: UpdateProfileModel,
    ) -> UseCaseResult<ProfileDto> {
        let now = Utc::now();
        let update = model
            .into_entity(now)
            .map_err(|err| ProfileError::Invalid(err.to_string()))?;

        self.load_profile(user_id).await?;

        let profile = self
            .profile_repo
            .update(user_id, update)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "profiles: failed to update profile");
                ProfileError::Internal(err)
            })?;

        info!(%user_id, "profiles: profile updated");
        Ok(ProfileDto::from_entity(profile, now.date_naive()))
    }

    pub async fn view_profile(
        &self,
        viewer_id: Uuid,
        username: &str,
    ) -> UseCaseResult<ProfileDetailDto> {
        let now = Utc::now();
        let viewer = self.load_profile(viewer_id).await?;
        let target = self
            .profile_repo
            .find_by_username(username)
            .await
            .map_err(|err| {
                error!(%viewer_id, username, db_error = ?err, "profiles: failed to load target profile");
                ProfileError::Internal(err)
            })?
            .ok_or(ProfileError::NotFound)?;

        let has_liked = self
            .like_repo
            .has_liked(viewer.id, target.id)
            .await
            .map_err(|err| {
                error!(%viewer_id, target_id = %target.id, db_error = ?err, "profiles: failed to read like edge");
                ProfileError::Internal(err)
            })?;
        let liked_back = self
            .like_repo
            .has_liked(target.id, viewer.id)
            .await
            .map_err(|err| {
                error!(%viewer_id, target_id = %target.id, db_error = ?err, "profiles: failed to read like edge");
                ProfileError::Internal(err)
            })?;

        let images = self
            .image_repo
            .list_for_profile(target.id)
            .await
            .map_err(|err| {
                error!(target_id = %target.id, db_error = ?err, "profiles: failed to load images");
                ProfileError::Internal(err)
            })?;
        let main_image = images.iter().find(|image| image.is_main);

        let is_premium = self
            .entitlement
            .is_premium(viewer.id, now)
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "profiles: failed to resolve entitlement");
                ProfileError::Internal(err)
            })?;

        let whatsapp_link = if is_premium && target.id != viewer.id {
            let viewer_url = profile_url(&self.public_base_url, &viewer.username);
            target
                .phone_number
                .as_deref()
                .and_then(|phone| whatsapp_link(phone, &target.username, &viewer_url))
        } else {
            None
        };

        Ok(ProfileDetailDto {
            id: target.id,
            image_url: resolve_image_url(
                main_image.map(|image| image.url.as_str()),
                target.profile_picture_url.as_deref(),
            ),
            age: target.age_on(now.date_naive()),
            gender: target.gender(),
            looking_for: target.looking_for(),
            username: target.username,
            bio: target.bio,
            location: target.location,
            attributes: target.attributes,
            last_active_at: target.last_active_at,
            has_liked,
            is_matched: has_liked && liked_back,
            whatsapp_link,
            upgrade_required: !is_premium,
        })
    }

    pub async fn delete_profile(&self, user_id: Uuid) -> UseCaseResult<()> {
        self.load_profile(user_id).await?;

        let storage_keys = self.profile_repo.delete(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "profiles: failed to delete profile");
            ProfileError::Internal(err)
        })?;

        for key in &storage_keys {
            if let Err(err) = self.storage.delete_object(key).await {
                warn!(%user_id, key, storage_error = ?err, "profiles: failed to delete stored image");
            }
        }

        info!(%user_id, removed_images = storage_keys.len(), "profiles: profile deleted");
        Ok(())
    }

    pub async fn touch_activity(&self, user_id: Uuid) -> UseCaseResult<()> {
        self.profile_repo
            .touch_last_active(user_id, Utc::now())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "profiles: failed to update last activity");
                ProfileError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::{DateTime, Duration, NaiveDate};
    use crates::domain::{
        entities::{images::ProfileImageEntity, subscriptions::SubscriptionEntity},
        repositories::{
            images::MockProfileImageRepository, likes::MockLikeRepository,
            profiles::MockProfileRepository, storage::MockImageStorage,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::profiles::DEFAULT_IMAGE_PLACEHOLDER,
    };
    use mockall::predicate::eq;

    type TestUseCase = ProfileUseCase<
        MockProfileRepository,
        MockLikeRepository,
        MockProfileImageRepository,
        MockSubscriptionRepository,
        MockImageStorage,
    >;

    fn sample_profile(username: &str, phone_number: Option<&str>) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            bio: Some("hello".to_string()),
            gender: Some("F".to_string()),
            seeking: Some("M".to_string()),
            looking_for: Some("DATING".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1),
            location: Some("Lagos".to_string()),
            phone_number: phone_number.map(str::to_string),
            attributes: serde_json::json!({}),
            profile_picture_url: None,
            is_premium: false,
            premium_expires_at: None,
            last_active_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn subscription_ending(user_id: Uuid, end_date: DateTime<Utc>) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id: Some(Uuid::new_v4()),
            start_date: now - Duration::days(5),
            end_date: Some(end_date),
            is_active: true,
            gateway_customer_code: None,
            gateway_subscription_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn build(
        profile_repo: MockProfileRepository,
        like_repo: MockLikeRepository,
        image_repo: MockProfileImageRepository,
        subscription_repo: MockSubscriptionRepository,
        storage: MockImageStorage,
    ) -> TestUseCase {
        ProfileUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(image_repo),
            Arc::new(subscription_repo),
            Arc::new(storage),
            "https://loveny.app".to_string(),
        )
    }

    /// Viewer and target lookups plus a like repository with no edges.
    fn view_fixtures(
        viewer: &ProfileEntity,
        target: &ProfileEntity,
    ) -> (MockProfileRepository, MockLikeRepository) {
        let mut profile_repo = MockProfileRepository::new();
        let viewer_clone = viewer.clone();
        profile_repo
            .expect_find_by_id()
            .with(eq(viewer.id))
            .returning(move |_| {
                let viewer = viewer_clone.clone();
                Box::pin(async move { Ok(Some(viewer)) })
            });
        let target_clone = target.clone();
        profile_repo
            .expect_find_by_username()
            .withf(|username| username == "bob")
            .returning(move |_| {
                let target = target_clone.clone();
                Box::pin(async move { Ok(Some(target)) })
            });

        let mut like_repo = MockLikeRepository::new();
        like_repo
            .expect_has_liked()
            .returning(|_, _| Box::pin(async { Ok(false) }));

        (profile_repo, like_repo)
    }

    fn without_images() -> MockProfileImageRepository {
        let mut image_repo = MockProfileImageRepository::new();
        image_repo
            .expect_list_for_profile()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
        image_repo
    }

    #[tokio::test]
    async fn premium_viewer_gets_contact_link() {
        let viewer = sample_profile("ada", None);
        let target = sample_profile("bob", Some("+234 801 234 5678"));
        let (profile_repo, like_repo) = view_fixtures(&viewer, &target);
        let image_repo = without_images();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscription = subscription_ending(viewer.id, Utc::now() + Duration::days(10));
        subscription_repo
            .expect_find_by_user()
            .with(eq(viewer.id))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let usecase = build(profile_repo, like_repo, image_repo, subscription_repo, MockImageStorage::new());
        let detail = usecase.view_profile(viewer.id, "bob").await.unwrap();

        let link = detail.whatsapp_link.unwrap();
        assert!(link.starts_with("https://wa.me/2348012345678?text="));
        assert!(link.contains("loveny.app%2Fprofiles%2Fada"));
        assert!(!detail.upgrade_required);
        assert_eq!(detail.image_url, DEFAULT_IMAGE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn expired_subscription_hides_contact_link() {
        let viewer = sample_profile("ada", None);
        let mut target = sample_profile("bob", Some("08012345678"));
        target.is_premium = true;
        let (profile_repo, like_repo) = view_fixtures(&viewer, &target);
        let image_repo = without_images();

        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscription = subscription_ending(viewer.id, Utc::now() - Duration::minutes(1));
        subscription_repo.expect_find_by_user().returning(move |_| {
            let subscription = subscription.clone();
            Box::pin(async move { Ok(Some(subscription)) })
        });

        let usecase = build(profile_repo, like_repo, image_repo, subscription_repo, MockImageStorage::new());
        let detail = usecase.view_profile(viewer.id, "bob").await.unwrap();

        assert_eq!(detail.whatsapp_link, None);
        assert!(detail.upgrade_required);
    }

    #[tokio::test]
    async fn premium_viewer_without_target_phone_gets_no_link() {
        let viewer = sample_profile("ada", None);
        let target = sample_profile("bob", None);
        let (profile_repo, like_repo) = view_fixtures(&viewer, &target);

        let target_id = target.id;
        let mut image_repo = MockProfileImageRepository::new();
        image_repo.expect_list_for_profile().returning(move |profile_id| {
            let image = ProfileImageEntity {
                id: Uuid::new_v4(),
                profile_id,
                storage_key: "profiles/x.jpg".to_string(),
                url: "https://cdn.loveny.app/profiles/x.jpg".to_string(),
                position: 0,
                is_main: true,
                created_at: Utc::now(),
            };
            Box::pin(async move { Ok(vec![image]) })
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscription = subscription_ending(viewer.id, Utc::now() + Duration::days(3));
        subscription_repo.expect_find_by_user().returning(move |_| {
            let subscription = subscription.clone();
            Box::pin(async move { Ok(Some(subscription)) })
        });

        let usecase = build(profile_repo, like_repo, image_repo, subscription_repo, MockImageStorage::new());
        let detail = usecase.view_profile(viewer.id, "bob").await.unwrap();

        assert_eq!(detail.id, target_id);
        assert_eq!(detail.whatsapp_link, None);
        assert!(!detail.upgrade_required);
        assert_eq!(detail.image_url, "https://cdn.loveny.app/profiles/x.jpg");
    }

    #[tokio::test]
    async fn create_rejects_taken_username() {
        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        profile_repo
            .expect_exists_username_or_email()
            .withf(|username, email| username == "ada" && email == "ada@example.com")
            .returning(|_, _| Box::pin(async { Ok(true) }));
        profile_repo.expect_create().never();

        let usecase = build(
            profile_repo,
            MockLikeRepository::new(),
            MockProfileImageRepository::new(),
            MockSubscriptionRepository::new(),
            MockImageStorage::new(),
        );

        let model = CreateProfileModel {
            username: "ada".to_string(),
            email: "ADA@example.com".to_string(),
            bio: None,
            gender: None,
            seeking: None,
            looking_for: None,
            date_of_birth: None,
            location: None,
            phone_number: None,
            attributes: None,
        };
        let err = usecase.create_profile(Uuid::new_v4(), model).await.unwrap_err();
        assert!(matches!(err, ProfileError::Conflict));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_update_never_reaches_repository() {
        let mut profile_repo = MockProfileRepository::new();
        profile_repo.expect_update().never();

        let usecase = build(
            profile_repo,
            MockLikeRepository::new(),
            MockProfileImageRepository::new(),
            MockSubscriptionRepository::new(),
            MockImageStorage::new(),
        );

        let model = UpdateProfileModel {
            looking_for: Some("FRIENDS".to_string()),
            ..Default::default()
        };
        let err = usecase.update_profile(Uuid::new_v4(), model).await.unwrap_err();
        assert!(matches!(err, ProfileError::Invalid(_)));
    }

    #[tokio::test]
    async fn delete_removes_stored_objects_and_tolerates_storage_errors() {
        let profile = sample_profile("ada", None);
        let profile_id = profile.id;

        let mut profile_repo = MockProfileRepository::new();
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });
        profile_repo
            .expect_delete()
            .with(eq(profile_id))
            .times(1)
            .returning(|_| {
                Box::pin(async { Ok(vec!["profiles/a.jpg".to_string(), "profiles/b.jpg".to_string()]) })
            });

        let mut storage = MockImageStorage::new();
        storage
            .expect_delete_object()
            .withf(|key| key == "profiles/a.jpg")
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow!("bucket unavailable")) }));
        storage
            .expect_delete_object()
            .withf(|key| key == "profiles/b.jpg")
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let usecase = build(
            profile_repo,
            MockLikeRepository::new(),
            MockProfileImageRepository::new(),
            MockSubscriptionRepository::new(),
            storage,
        );

        usecase.delete_profile(profile_id).await.unwrap();
    }
}
