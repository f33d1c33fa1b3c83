//! Wire shapes. Field names are camelCase; every timestamp is Unix seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{ContentRenderer, EditRecord, Notification, ProfileUpdate};
use services::{
    CommentView, ModerationView, PostView, ProfileView, ThreadView, UserSummary,
};

fn unix(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

fn unix_opt(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(unix)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub silenced_until: Option<i64>,
    pub banned_until: Option<i64>,
}

impl From<UserSummary> for UserDto {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar: user.avatar_ref.unwrap_or_default(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            silenced_until: unix_opt(user.silenced_until),
            banned_until: unix_opt(user.banned_until),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author: UserDto,
    pub created_at: i64,
    pub updated_at: i64,
    pub posts_count: i64,
}

impl From<ThreadView> for ThreadDto {
    fn from(view: ThreadView) -> Self {
        Self {
            id: view.thread.id,
            title: view.thread.title,
            slug: view.thread.slug,
            author: view.author.into(),
            created_at: unix(view.thread.created_at),
            updated_at: unix(view.thread.updated_at),
            posts_count: view.posts_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: Uuid,
    /// Slug of the owning thread.
    pub thread: String,
    pub author: UserDto,
    pub body: String,
    pub body_html: String,
    pub created_at: i64,
    pub last_edited_at: Option<i64>,
    pub edit_count: i64,
    pub score: i64,
    pub my_vote: i64,
}

impl PostDto {
    pub fn new(view: PostView, renderer: &dyn ContentRenderer) -> Self {
        Self {
            id: view.post.id,
            thread: view.thread_slug,
            author: view.author.into(),
            body_html: renderer.render_safe_html(&view.post.body),
            body: view.post.body,
            created_at: unix(view.post.created_at),
            last_edited_at: unix_opt(view.post.edited_at),
            edit_count: view.edit_count,
            score: view.score,
            my_vote: view.my_vote,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    /// Username of the profile the comment sits on.
    pub profile: String,
    pub author: UserDto,
    pub body: String,
    pub body_html: String,
    pub created_at: i64,
    pub last_edited_at: Option<i64>,
    pub edit_count: i64,
    pub score: i64,
    pub my_vote: i64,
}

impl CommentDto {
    pub fn new(view: CommentView, profile: &str, renderer: &dyn ContentRenderer) -> Self {
        Self {
            id: view.comment.id,
            profile: profile.to_string(),
            author: view.author.into(),
            body_html: renderer.render_safe_html(&view.comment.body),
            body: view.comment.body,
            created_at: unix(view.comment.created_at),
            last_edited_at: unix_opt(view.comment.edited_at),
            edit_count: view.edit_count,
            score: view.score,
            my_vote: view.my_vote,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDto {
    pub editor_id: Option<Uuid>,
    pub body: String,
    pub edited_at: i64,
}

impl From<EditRecord> for EditDto {
    fn from(record: EditRecord) -> Self {
        Self {
            editor_id: record.editor_id,
            body: record.body,
            edited_at: unix(record.edited_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub id: Uuid,
    pub username: String,
    pub bio: String,
    pub avatar: String,
    pub device: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: i64,
    pub silenced_until: Option<i64>,
    pub banned_until: Option<i64>,
}

impl From<ProfileView> for ProfileDto {
    fn from(view: ProfileView) -> Self {
        Self {
            id: view.user.id,
            username: view.user.username,
            bio: view.profile.bio,
            avatar: view.profile.avatar_ref.unwrap_or_default(),
            device: view.profile.device,
            is_staff: view.user.is_staff,
            is_superuser: view.user.is_superuser,
            date_joined: unix(view.user.created_at),
            silenced_until: unix_opt(view.profile.silenced_until),
            banned_until: unix_opt(view.profile.banned_until),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: serde_json::Value,
    pub created_at: i64,
    pub read_at: Option<i64>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind.as_str(),
            payload: n.payload,
            created_at: unix(n.created_at),
            read_at: unix_opt(n.read_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationDto {
    pub username: String,
    pub silenced_until: Option<i64>,
    pub banned_until: Option<i64>,
}

impl From<ModerationView> for ModerationDto {
    fn from(view: ModerationView) -> Self {
        Self {
            username: view.username,
            silenced_until: unix_opt(view.silenced_until),
            banned_until: unix_opt(view.banned_until),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanNoticeDto {
    pub banned_until: Option<i64>,
}

impl BanNoticeDto {
    pub fn new(banned_until: Option<DateTime<Utc>>) -> Self {
        Self {
            banned_until: unix_opt(banned_until),
        }
    }
}

// ── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BodyRequest {
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub avatar_ref: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            bio: req.bio,
            device: req.device,
            avatar_ref: req.avatar_ref,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub unread: Option<String>,
}

impl NotificationQuery {
    pub fn unread_only(&self) -> bool {
        matches!(self.unread.as_deref(), Some("1" | "true" | "True"))
    }
}
