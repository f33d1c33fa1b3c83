//! # Domain Models
//!
//! These structs represent the core entities of the forum.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account. `is_authenticated` is not stored; it belongs to [`Principal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Staff or superuser.
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Created together with its [`User`] and removed with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    pub avatar_ref: Option<String>,
    pub device: String,
    pub silenced_until: Option<DateTime<Utc>>,
    pub banned_until: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            bio: String::new(),
            avatar_ref: None,
            device: String::new(),
            silenced_until: None,
            banned_until: None,
        }
    }
}

/// Partial update of the self-service profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub device: Option<String>,
    pub avatar_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    /// Globally unique, generated at creation.
    pub slug: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reply inside a [`Thread`]. Posts of a thread sort by `created_at` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub author_id: Uuid,
    /// Markdown source.
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// A comment left on somebody's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileComment {
    pub id: Uuid,
    /// Owner of the profile the comment is attached to.
    pub profile_user_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// One row of the append-only edit history (`post_edits` / `profile_comment_edits`).
///
/// `body` is the text as it was *before* the edit that produced the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    pub subject_id: Uuid,
    /// `None` once the editor account has been deleted.
    pub editor_id: Option<Uuid>,
    pub body: String,
    pub edited_at: DateTime<Utc>,
}

/// The thing a rating applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Post(Uuid),
    ProfileComment(Uuid),
}

impl Subject {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Post(id) | Self::ProfileComment(id) => *id,
        }
    }
}

/// A validated rating value: exactly -1 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
    Down,
    Up,
}

impl VoteValue {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Down => -1,
            Self::Up => 1,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = crate::DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Down),
            1 => Ok(Self::Up),
            _ => Err(crate::DomainError::invalid("value", "value must be 1 or -1")),
        }
    }
}

impl From<VoteValue> for i64 {
    fn from(value: VoteValue) -> Self {
        value.as_i64()
    }
}

/// Live sum of a subject's ratings plus the caller's own vote (0 if none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub score: i64,
    pub my_vote: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ThreadReply,
    ProfileComment,
    Mention,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreadReply => "thread_reply",
            Self::ProfileComment => "profile_comment",
            Self::Mention => "mention",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "thread_reply" => Some(Self::ThreadReply),
            "profile_comment" => Some(Self::ProfileComment),
            "mention" => Some(Self::Mention),
            _ => None,
        }
    }
}

/// Immutable apart from `read_at`, which moves from `None` to `Some` once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadReplyPayload {
    pub thread_slug: String,
    pub post_id: Uuid,
    pub actor_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCommentPayload {
    pub username: String,
    pub comment_id: Uuid,
    pub actor_username: String,
}

/// Where a mention happened; flattened into the mention payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MentionContext {
    Post { thread_slug: String, post_id: Uuid },
    ProfileComment { username: String, comment_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionPayload {
    pub actor_username: String,
    pub mentioned_username: String,
    #[serde(flatten)]
    pub context: MentionContext,
}

/// The authenticated caller, with the moderation windows of their profile
/// loaded once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub silenced_until: Option<DateTime<Utc>>,
    pub banned_until: Option<DateTime<Utc>>,
}

impl Actor {
    pub fn from_parts(user: &User, profile: &Profile) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            silenced_until: profile.silenced_until,
            banned_until: profile.banned_until,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// Who is calling: nobody, or an [`Actor`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(Actor),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Self::Authenticated(actor) => Some(actor),
            Self::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.actor().map(|a| a.id)
    }
}

/// Offset pagination for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamps caller-supplied values into range.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_value_accepts_only_unit_values() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        assert!(VoteValue::try_from(0).is_err());
        assert!(VoteValue::try_from(2).is_err());
    }

    #[test]
    fn mention_payload_flattens_context() {
        let post_id = Uuid::now_v7();
        let payload = MentionPayload {
            actor_username: "b".into(),
            mentioned_username: "a".into(),
            context: MentionContext::Post {
                thread_slug: "hello-1234abcd".into(),
                post_id,
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "post");
        assert_eq!(value["threadSlug"], "hello-1234abcd");
        assert_eq!(value["postId"], post_id.to_string());
        assert_eq!(value["actorUsername"], "b");
        assert_eq!(value["mentionedUsername"], "a");
    }

    #[test]
    fn page_clamps_limits() {
        assert_eq!(Page::new(Some(1000), Some(-5)), Page { limit: 100, offset: 0 });
        assert_eq!(Page::default().limit, Page::DEFAULT_LIMIT);
    }
}
