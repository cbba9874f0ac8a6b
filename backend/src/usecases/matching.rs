use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use crates::domain::{
    entities::profiles::ProfileEntity,
    repositories::{
        likes::LikeRepository, notifications::NotificationRepository, profiles::ProfileRepository,
    },
    value_objects::{
        enums::looking_for::LookingFor,
        matching::{
            BrowseDto, BrowseFilter, CandidateQuery, CategoryGroupDto, LikeEdgeChange, LikeState,
            LikeToggleDto, MAX_SWIPE_PAGE_SIZE, MatchesDto, ProfileCardDto, SwipeDeckDto,
            group_by_category, is_visible,
        },
        notifications::{like_notification, match_notification},
    },
};
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("profile not found")]
    ProfileNotFound,
    #[error("target profile not found")]
    TargetNotFound,
    #[error("you cannot like your own profile")]
    CannotLikeSelf,
    #[error("{0}")]
    InvalidFilter(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MatchingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MatchingError::ProfileNotFound | MatchingError::TargetNotFound => StatusCode::NOT_FOUND,
            MatchingError::CannotLikeSelf | MatchingError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            MatchingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, MatchingError>;

pub struct MatchingUseCase<P, L, N>
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    like_repo: Arc<L>,
    notification_repo: Arc<N>,
    swipe_page_size: usize,
}

impl<P, L, N> MatchingUseCase<P, L, N>
where
    P: ProfileRepository + Send + Sync + 'static,
    L: LikeRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
{
    pub fn new(
        profile_repo: Arc<P>,
        like_repo: Arc<L>,
        notification_repo: Arc<N>,
        swipe_page_size: usize,
    ) -> Self {
        Self {
            profile_repo,
            like_repo,
            notification_repo,
            swipe_page_size: swipe_page_size.clamp(1, MAX_SWIPE_PAGE_SIZE),
        }
    }

    async fn load_viewer(&self, viewer_id: Uuid) -> UseCaseResult<ProfileEntity> {
        self.profile_repo
            .find_by_id(viewer_id)
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "matching: failed to load viewer profile");
                MatchingError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%viewer_id, "matching: viewer has no profile");
                MatchingError::ProfileNotFound
            })
    }

    async fn touch_activity(&self, viewer_id: Uuid) {
        if let Err(err) = self.profile_repo.touch_last_active(viewer_id, Utc::now()).await {
            warn!(%viewer_id, db_error = ?err, "matching: failed to update last activity");
        }
    }

    async fn like_sets(&self, viewer_id: Uuid) -> UseCaseResult<(HashSet<Uuid>, HashSet<Uuid>)> {
        let liked = self.like_repo.liked_ids(viewer_id).await.map_err(|err| {
            error!(%viewer_id, db_error = ?err, "matching: failed to load outgoing likes");
            MatchingError::Internal(err)
        })?;
        let likers = self.like_repo.liker_ids(viewer_id).await.map_err(|err| {
            error!(%viewer_id, db_error = ?err, "matching: failed to load incoming likes");
            MatchingError::Internal(err)
        })?;

        Ok((liked.into_iter().collect(), likers.into_iter().collect()))
    }

    async fn visible_candidates(
        &self,
        viewer: &ProfileEntity,
        filter: &BrowseFilter,
    ) -> UseCaseResult<Vec<ProfileEntity>> {
        let today = Utc::now().date_naive();
        let candidates = self
            .profile_repo
            .list_candidates(CandidateQuery::for_viewer(viewer, filter))
            .await
            .map_err(|err| {
                error!(viewer_id = %viewer.id, db_error = ?err, "matching: failed to list candidates");
                MatchingError::Internal(err)
            })?;

        Ok(candidates
            .into_iter()
            .filter(|candidate| is_visible(viewer, candidate, filter, today))
            .collect())
    }

    pub async fn browse(&self, viewer_id: Uuid, filter: BrowseFilter) -> UseCaseResult<BrowseDto> {
        let filter = filter
            .normalize()
            .map_err(|err| MatchingError::InvalidFilter(err.to_string()))?;
        let viewer = self.load_viewer(viewer_id).await?;
        self.touch_activity(viewer_id).await;

        let candidates = self.visible_candidates(&viewer, &filter).await?;
        let (liked, likers) = self.like_sets(viewer_id).await?;
        let today = Utc::now().date_naive();

        let cards = candidates
            .iter()
            .map(|candidate| ProfileCardDto::from_profile(candidate, today, &liked, &likers))
            .collect();

        let viewer_category = viewer.looking_for();
        let groups = group_by_category(cards, viewer_category);
        info!(
            %viewer_id,
            candidate_count = candidates.len(),
            "matching: browse page built"
        );

        Ok(BrowseDto {
            viewer_category,
            groups,
        })
    }

    pub async fn swipe(
        &self,
        viewer_id: Uuid,
        filter: BrowseFilter,
        limit: Option<usize>,
    ) -> UseCaseResult<SwipeDeckDto> {
        let filter = filter
            .normalize()
            .map_err(|err| MatchingError::InvalidFilter(err.to_string()))?;
        let limit = limit
            .unwrap_or(self.swipe_page_size)
            .clamp(1, MAX_SWIPE_PAGE_SIZE);
        let viewer = self.load_viewer(viewer_id).await?;
        self.touch_activity(viewer_id).await;

        let (liked, likers) = self.like_sets(viewer_id).await?;
        let mut deck: Vec<ProfileEntity> = self
            .visible_candidates(&viewer, &filter)
            .await?
            .into_iter()
            .filter(|candidate| !liked.contains(&candidate.id))
            .collect();

        deck.shuffle(&mut rand::thread_rng());
        deck.truncate(limit);

        let today = Utc::now().date_naive();
        let profiles = deck
            .iter()
            .map(|candidate| ProfileCardDto::from_profile(candidate, today, &liked, &likers))
            .collect::<Vec<_>>();

        info!(%viewer_id, deck_size = profiles.len(), "matching: swipe deck built");
        Ok(SwipeDeckDto { profiles })
    }

    pub async fn toggle_like(&self, actor_id: Uuid, target_username: &str) -> UseCaseResult<LikeToggleDto> {
        let actor = self.load_viewer(actor_id).await?;

        let target = self
            .profile_repo
            .find_by_username(target_username)
            .await
            .map_err(|err| {
                error!(%actor_id, target_username, db_error = ?err, "matching: failed to load target");
                MatchingError::Internal(err)
            })?
            .ok_or(MatchingError::TargetNotFound)?;

        if target.id == actor.id {
            warn!(%actor_id, "matching: attempted self like");
            return Err(MatchingError::CannotLikeSelf);
        }

        let change = self
            .like_repo
            .toggle_like(actor.id, target.id)
            .await
            .map_err(|err| {
                error!(%actor_id, target_id = %target.id, db_error = ?err, "matching: like toggle failed");
                MatchingError::Internal(err)
            })?;

        let has_liked = self.edge_exists(actor.id, target.id).await?;
        let liked_back = self.edge_exists(target.id, actor.id).await?;
        let is_matched = has_liked && liked_back;

        let state = match change {
            LikeEdgeChange::Removed => LikeState::Unliked,
            LikeEdgeChange::Created if is_matched => LikeState::Matched,
            LikeEdgeChange::Created => LikeState::Liked,
        };

        if change == LikeEdgeChange::Created {
            let notifications = if is_matched {
                vec![
                    match_notification(target.id, actor.id, &actor.username),
                    match_notification(actor.id, target.id, &target.username),
                ]
            } else {
                vec![like_notification(target.id, actor.id, &actor.username)]
            };

            if let Err(err) = self.notification_repo.create(notifications).await {
                warn!(%actor_id, target_id = %target.id, db_error = ?err, "matching: failed to record notifications");
            }
        }

        info!(%actor_id, target_id = %target.id, ?state, "matching: like toggled");

        Ok(LikeToggleDto {
            target_id: target.id,
            target_username: target.username,
            state,
            has_liked,
            is_matched,
        })
    }

    async fn edge_exists(&self, liker_id: Uuid, liked_id: Uuid) -> UseCaseResult<bool> {
        self.like_repo
            .has_liked(liker_id, liked_id)
            .await
            .map_err(|err| {
                error!(%liker_id, %liked_id, db_error = ?err, "matching: failed to read like edge");
                MatchingError::Internal(err)
            })
    }

    pub async fn list_matches(&self, viewer_id: Uuid) -> UseCaseResult<MatchesDto> {
        self.load_viewer(viewer_id).await?;

        let match_ids = self
            .like_repo
            .mutual_match_ids(viewer_id)
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "matching: failed to load matches");
                MatchingError::Internal(err)
            })?;

        let mut profiles = self
            .profile_repo
            .find_by_ids(match_ids.clone())
            .await
            .map_err(|err| {
                error!(%viewer_id, db_error = ?err, "matching: failed to load matched profiles");
                MatchingError::Internal(err)
            })?;
        profiles.sort_by(|a, b| a.username.cmp(&b.username));

        let matched: HashSet<Uuid> = match_ids.into_iter().collect();
        let today = Utc::now().date_naive();
        let matches: Vec<ProfileCardDto> = profiles
            .iter()
            .map(|profile| ProfileCardDto::from_profile(profile, today, &matched, &matched))
            .collect();

        let by_category = LookingFor::ALL
            .iter()
            .map(|category| CategoryGroupDto {
                category: *category,
                profiles: matches
                    .iter()
                    .filter(|card| card.looking_for == Some(*category))
                    .cloned()
                    .collect(),
            })
            .filter(|group| !group.profiles.is_empty())
            .collect();

        info!(%viewer_id, match_count = matches.len(), "matching: matches listed");
        Ok(MatchesDto {
            matches,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crates::domain::{
        entities::notifications::InsertNotificationEntity,
        repositories::{
            likes::MockLikeRepository, notifications::MockNotificationRepository,
            profiles::MockProfileRepository,
        },
    };
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn sample_profile(username: &str, looking_for: &str, gender: &str, seeking: &str) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            bio: None,
            gender: Some(gender.to_string()),
            seeking: Some(seeking.to_string()),
            looking_for: Some(looking_for.to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1996, 5, 20),
            location: Some("Lagos".to_string()),
            phone_number: None,
            attributes: serde_json::json!({}),
            profile_picture_url: None,
            is_premium: false,
            premium_expires_at: None,
            last_active_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_profile_lookups(profile_repo: &mut MockProfileRepository, profiles: Vec<ProfileEntity>) {
        let by_id = profiles.clone();
        profile_repo.expect_find_by_id().returning(move |id| {
            let found = by_id.iter().find(|p| p.id == id).cloned();
            Box::pin(async move { Ok(found) })
        });
        let by_name = profiles;
        profile_repo.expect_find_by_username().returning(move |username| {
            let found = by_name.iter().find(|p| p.username == username).cloned();
            Box::pin(async move { Ok(found) })
        });
    }

    /// In-memory like edges shared between the mocked methods.
    fn like_repo_with_edges(edges: Arc<Mutex<HashSet<(Uuid, Uuid)>>>) -> MockLikeRepository {
        let mut like_repo = MockLikeRepository::new();

        let toggle_edges = Arc::clone(&edges);
        like_repo.expect_toggle_like().returning(move |liker, liked| {
            let mut edges = toggle_edges.lock().unwrap();
            let change = if edges.remove(&(liker, liked)) {
                LikeEdgeChange::Removed
            } else {
                edges.insert((liker, liked));
                LikeEdgeChange::Created
            };
            Box::pin(async move { Ok(change) })
        });

        let read_edges = Arc::clone(&edges);
        like_repo.expect_has_liked().returning(move |liker, liked| {
            let exists = read_edges.lock().unwrap().contains(&(liker, liked));
            Box::pin(async move { Ok(exists) })
        });

        like_repo
    }

    fn recording_notifications(sink: Arc<Mutex<Vec<InsertNotificationEntity>>>) -> MockNotificationRepository {
        let mut notification_repo = MockNotificationRepository::new();
        notification_repo.expect_create().returning(move |notifications| {
            sink.lock().unwrap().extend(notifications);
            Box::pin(async { Ok(()) })
        });
        notification_repo
    }

    #[tokio::test]
    async fn like_then_unlike_restores_previous_state() {
        let actor = sample_profile("ada", "DATING", "F", "M");
        let target = sample_profile("bob", "DATING", "M", "F");

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![actor.clone(), target.clone()]);

        let edges = Arc::new(Mutex::new(HashSet::new()));
        let sink = Arc::new(Mutex::new(Vec::new()));
        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo_with_edges(Arc::clone(&edges))),
            Arc::new(recording_notifications(Arc::clone(&sink))),
            20,
        );

        let liked = usecase.toggle_like(actor.id, "bob").await.unwrap();
        assert_eq!(liked.state, LikeState::Liked);
        assert!(liked.has_liked);
        assert!(!liked.is_matched);

        let unliked = usecase.toggle_like(actor.id, "bob").await.unwrap();
        assert_eq!(unliked.state, LikeState::Unliked);
        assert!(!unliked.has_liked);
        assert!(edges.lock().unwrap().is_empty());

        let notifications = sink.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient_id, target.id);
        assert_eq!(notifications[0].kind, "like");
    }

    #[tokio::test]
    async fn reciprocal_like_becomes_match_and_notifies_both() {
        let actor = sample_profile("ada", "DATING", "F", "M");
        let target = sample_profile("bob", "DATING", "M", "F");

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![actor.clone(), target.clone()]);

        let edges = Arc::new(Mutex::new(HashSet::from([(target.id, actor.id)])));
        let sink = Arc::new(Mutex::new(Vec::new()));
        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo_with_edges(Arc::clone(&edges))),
            Arc::new(recording_notifications(Arc::clone(&sink))),
            20,
        );

        let result = usecase.toggle_like(actor.id, "bob").await.unwrap();
        assert_eq!(result.state, LikeState::Matched);
        assert!(result.is_matched);

        let recipients: HashSet<Uuid> = sink.lock().unwrap().iter().map(|n| n.recipient_id).collect();
        assert_eq!(recipients, HashSet::from([actor.id, target.id]));

        // Unliking breaks the match while the reverse edge survives.
        let result = usecase.toggle_like(actor.id, "bob").await.unwrap();
        assert_eq!(result.state, LikeState::Unliked);
        assert!(!result.is_matched);
        assert!(edges.lock().unwrap().contains(&(target.id, actor.id)));
    }

    #[tokio::test]
    async fn self_like_is_rejected_without_mutation() {
        let actor = sample_profile("ada", "DATING", "F", "M");

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![actor.clone()]);

        let mut like_repo = MockLikeRepository::new();
        like_repo.expect_toggle_like().never();
        let mut notification_repo = MockNotificationRepository::new();
        notification_repo.expect_create().never();

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(notification_repo),
            20,
        );

        let err = usecase.toggle_like(actor.id, "ada").await.unwrap_err();
        assert!(matches!(err, MatchingError::CannotLikeSelf));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let actor = sample_profile("ada", "DATING", "F", "M");

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![actor.clone()]);
        let mut like_repo = MockLikeRepository::new();
        like_repo.expect_toggle_like().never();

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(MockNotificationRepository::new()),
            20,
        );

        let err = usecase.toggle_like(actor.id, "ghost").await.unwrap_err();
        assert!(matches!(err, MatchingError::TargetNotFound));
    }

    #[tokio::test]
    async fn browse_filters_candidates_and_marks_like_state() {
        let viewer = sample_profile("viewer", "DATING", "F", "M");
        let mut recent = sample_profile("recent", "DATING", "M", "F");
        recent.last_active_at = Utc::now();
        let mut older = sample_profile("older", "DATING", "M", "F");
        older.last_active_at = Utc::now() - Duration::days(2);
        let hookup = sample_profile("hookup", "HOOKUP", "M", "F");
        let woman = sample_profile("woman", "DATING", "F", "M");

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![viewer.clone()]);
        profile_repo
            .expect_touch_last_active()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        let candidates = vec![older.clone(), hookup, woman, recent.clone()];
        profile_repo.expect_list_candidates().returning(move |_| {
            let candidates = candidates.clone();
            Box::pin(async move { Ok(candidates) })
        });

        let mut like_repo = MockLikeRepository::new();
        let older_id = older.id;
        like_repo
            .expect_liked_ids()
            .with(eq(viewer.id))
            .returning(move |_| Box::pin(async move { Ok(vec![older_id]) }));
        like_repo
            .expect_liker_ids()
            .with(eq(viewer.id))
            .returning(move |_| Box::pin(async move { Ok(vec![older_id]) }));

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(MockNotificationRepository::new()),
            20,
        );

        let page = usecase.browse(viewer.id, BrowseFilter::default()).await.unwrap();

        assert_eq!(page.viewer_category, Some(LookingFor::Dating));
        assert_eq!(page.groups.len(), 1);
        let names: Vec<_> = page.groups[0].profiles.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["recent", "older"]);
        assert!(page.groups[0].profiles[1].is_matched);
        assert!(!page.groups[0].profiles[0].has_liked);
    }

    #[tokio::test]
    async fn invalid_filter_is_rejected_before_any_lookup() {
        let mut profile_repo = MockProfileRepository::new();
        profile_repo.expect_find_by_id().never();
        profile_repo.expect_touch_last_active().never();

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(MockLikeRepository::new()),
            Arc::new(MockNotificationRepository::new()),
            20,
        );

        let filter = BrowseFilter {
            min_age: Some(50),
            max_age: Some(20),
            location: None,
        };
        let err = usecase.browse(Uuid::new_v4(), filter).await.unwrap_err();
        assert!(matches!(err, MatchingError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn swipe_skips_liked_profiles_and_caps_page_size() {
        let viewer = sample_profile("viewer", "HOOKUP", "M", "A");
        let candidates: Vec<ProfileEntity> = (0..8)
            .map(|i| sample_profile(&format!("c{i}"), "HOOKUP", "F", "M"))
            .collect();
        let already_liked = candidates[0].id;

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![viewer.clone()]);
        profile_repo
            .expect_touch_last_active()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        let listed = candidates.clone();
        profile_repo.expect_list_candidates().returning(move |_| {
            let listed = listed.clone();
            Box::pin(async move { Ok(listed) })
        });

        let mut like_repo = MockLikeRepository::new();
        like_repo
            .expect_liked_ids()
            .returning(move |_| Box::pin(async move { Ok(vec![already_liked]) }));
        like_repo
            .expect_liker_ids()
            .returning(|_| Box::pin(async { Ok(vec![]) }));

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(MockNotificationRepository::new()),
            5,
        );

        let deck = usecase.swipe(viewer.id, BrowseFilter::default(), None).await.unwrap();
        assert_eq!(deck.profiles.len(), 5);
        assert!(deck.profiles.iter().all(|card| card.id != already_liked));

        let deck = usecase
            .swipe(viewer.id, BrowseFilter::default(), Some(500))
            .await
            .unwrap();
        assert_eq!(deck.profiles.len(), 7);
    }

    #[tokio::test]
    async fn matches_are_sorted_by_username_and_grouped() {
        let viewer = sample_profile("viewer", "DATING", "F", "M");
        let zed = sample_profile("zed", "DATING", "M", "F");
        let amy = sample_profile("amy", "HOOKUP", "F", "M");
        let ids = vec![zed.id, amy.id];

        let mut profile_repo = MockProfileRepository::new();
        expect_profile_lookups(&mut profile_repo, vec![viewer.clone()]);
        let matched_profiles = vec![zed.clone(), amy.clone()];
        profile_repo.expect_find_by_ids().returning(move |_| {
            let matched_profiles = matched_profiles.clone();
            Box::pin(async move { Ok(matched_profiles) })
        });

        let mut like_repo = MockLikeRepository::new();
        like_repo
            .expect_mutual_match_ids()
            .with(eq(viewer.id))
            .returning(move |_| {
                let ids = ids.clone();
                Box::pin(async move { Ok(ids) })
            });

        let usecase = MatchingUseCase::new(
            Arc::new(profile_repo),
            Arc::new(like_repo),
            Arc::new(MockNotificationRepository::new()),
            20,
        );

        let matches = usecase.list_matches(viewer.id).await.unwrap();
        let names: Vec<_> = matches.matches.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert!(matches.matches.iter().all(|card| card.is_matched));

        let categories: Vec<_> = matches.by_category.iter().map(|g| g.category).collect();
        assert_eq!(categories, vec![LookingFor::Dating, LookingFor::Hookup]);
    }
}
