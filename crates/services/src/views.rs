//! Read models returned by the services: entities enriched with the derived
//! fields callers render (author summary, score, own vote, edit count).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, Post, Profile, ProfileComment, Thread, User, UserRepository,
};

/// Public projection of a user and the moderation windows on their profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_ref: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub silenced_until: Option<DateTime<Utc>>,
    pub banned_until: Option<DateTime<Utc>>,
}

impl UserSummary {
    pub fn new(user: &User, profile: &Profile) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar_ref: profile.avatar_ref.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            silenced_until: profile.silenced_until,
            banned_until: profile.banned_until,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub thread: Thread,
    pub author: UserSummary,
    pub posts_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub thread_slug: String,
    pub author: UserSummary,
    pub score: i64,
    pub my_vote: i64,
    pub edit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: ProfileComment,
    pub author: UserSummary,
    pub score: i64,
    pub my_vote: i64,
    pub edit_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user: User,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationView {
    pub username: String,
    pub silenced_until: Option<DateTime<Utc>>,
    pub banned_until: Option<DateTime<Utc>>,
}

/// Loads user + profile pairs, remembering each author for the rest of a listing.
pub(crate) struct Authors<'a> {
    users: &'a dyn UserRepository,
    seen: HashMap<Uuid, UserSummary>,
}

impl<'a> Authors<'a> {
    pub(crate) fn new(users: &'a dyn UserRepository) -> Self {
        Self {
            users,
            seen: HashMap::new(),
        }
    }

    pub(crate) async fn summary(&mut self, id: Uuid) -> DomainResult<UserSummary> {
        if let Some(found) = self.seen.get(&id) {
            return Ok(found.clone());
        }
        let user = self
            .users
            .find_user(id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        let profile = self
            .users
            .get_profile(id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("user {id} has no profile")))?;
        let summary = UserSummary::new(&user, &profile);
        self.seen.insert(id, summary.clone());
        Ok(summary)
    }
}
