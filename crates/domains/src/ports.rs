//! # Core Traits (Ports)
//!
//! Any storage, auth or rendering adapter must implement these traits to be
//! wired into the services. Each method is one atomic unit against the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::moderation::ModerationPatch;
use crate::models::{
    EditRecord, NewNotification, NewUser, Notification, Page, Post, Profile, ProfileComment,
    ProfileUpdate, Subject, Thread, User, VoteValue,
};

/// Users and their 1:1 profiles.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user and an empty profile together. Duplicate username → `Conflict`.
    async fn create_user(&self, new: NewUser, now: DateTime<Utc>) -> DomainResult<User>;
    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    /// Unknown names are skipped.
    async fn find_users_by_usernames(&self, usernames: &[String]) -> DomainResult<Vec<User>>;
    async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<Profile>>;
    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> DomainResult<Profile>;
    async fn apply_moderation(&self, user_id: Uuid, patch: ModerationPatch)
        -> DomainResult<Profile>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Fast-path check only; the unique index in `insert_thread` is authoritative.
    async fn slug_exists(&self, slug: &str) -> DomainResult<bool>;
    /// Slug already taken → `Conflict`.
    async fn insert_thread(&self, thread: Thread) -> DomainResult<()>;
    async fn find_thread_by_slug(&self, slug: &str) -> DomainResult<Option<Thread>>;
    /// Newest first.
    async fn list_threads(&self, page: Page) -> DomainResult<Vec<Thread>>;
    async fn count_posts(&self, thread_id: Uuid) -> DomainResult<i64>;
    async fn update_thread_title(
        &self,
        id: Uuid,
        title: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Thread>;
    /// Removes the thread with its posts, their edits and ratings.
    async fn delete_thread(&self, id: Uuid) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: Post) -> DomainResult<()>;
    async fn find_post(&self, id: Uuid) -> DomainResult<Option<Post>>;
    /// Oldest first.
    async fn list_posts(&self, thread_id: Uuid) -> DomainResult<Vec<Post>>;
    /// Snapshots the current body into the history table, then replaces it
    /// and stamps `edited_at`, as one transaction.
    async fn edit_post(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Post>;
    async fn delete_post(&self, id: Uuid) -> DomainResult<()>;
    /// Newest first.
    async fn post_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>>;
    async fn count_post_edits(&self, id: Uuid) -> DomainResult<i64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileCommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: ProfileComment) -> DomainResult<()>;
    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<ProfileComment>>;
    /// Oldest first.
    async fn list_comments(&self, profile_user_id: Uuid) -> DomainResult<Vec<ProfileComment>>;
    /// Same history-then-update contract as [`PostRepository::edit_post`].
    async fn edit_comment(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<ProfileComment>;
    async fn delete_comment(&self, id: Uuid) -> DomainResult<()>;
    /// Newest first.
    async fn comment_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>>;
    async fn count_comment_edits(&self, id: Uuid) -> DomainResult<i64>;
}

/// One rating row per (subject, user).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Single conditional insert-or-update keyed on (subject, user).
    async fn upsert_rating(
        &self,
        subject: Subject,
        user_id: Uuid,
        value: VoteValue,
        now: DateTime<Utc>,
    ) -> DomainResult<()>;
    /// Returns whether a row was removed.
    async fn delete_rating(&self, subject: Subject, user_id: Uuid) -> DomainResult<bool>;
    /// Live sum of all values; 0 when there are none.
    async fn score(&self, subject: Subject) -> DomainResult<i64>;
    async fn vote_of(&self, subject: Subject, user_id: Uuid) -> DomainResult<Option<VoteValue>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(
        &self,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> DomainResult<Notification>;
    /// Newest first, at most `limit`.
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> DomainResult<Vec<Notification>>;
    /// Sets `read_at` if unset. `None` when the id is unknown or belongs to
    /// another user.
    async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Notification>>;
}

/// Markdown source to sanitized HTML. Pure.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ContentRenderer: Send + Sync {
    fn render_safe_html(&self, source: &str) -> String;
}

/// Turns a bearer token into the id of the user it was issued for.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> DomainResult<Uuid>;
}
