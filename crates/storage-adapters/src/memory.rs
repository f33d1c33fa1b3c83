//! Process-local store.
//!
//! Relational data sits behind one `RwLock` so that cascades, edit snapshots
//! and the unique username/slug indexes stay consistent. Notifications are
//! independent per user and live in a `DashMap`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, EditRecord, ModerationPatch, NewNotification, NewUser,
    Notification, NotificationRepository, Page, Post, PostRepository, Profile, ProfileComment,
    ProfileCommentRepository, ProfileUpdate, RatingRepository, Subject, Thread, ThreadRepository,
    User, UserRepository, VoteValue,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    profiles: HashMap<Uuid, Profile>,
    threads: HashMap<Uuid, Thread>,
    slugs: HashMap<String, Uuid>,
    posts: HashMap<Uuid, Post>,
    post_edits: HashMap<Uuid, Vec<EditRecord>>,
    comments: HashMap<Uuid, ProfileComment>,
    comment_edits: HashMap<Uuid, Vec<EditRecord>>,
    ratings: HashMap<(Subject, Uuid), VoteValue>,
}

impl Tables {
    fn remove_post(&mut self, id: Uuid) {
        self.posts.remove(&id);
        self.post_edits.remove(&id);
        self.ratings.retain(|(subject, _), _| *subject != Subject::Post(id));
    }
}

/// Snapshot rows come back newest first; ties keep reverse insertion order.
fn newest_first(records: Option<&Vec<EditRecord>>) -> Vec<EditRecord> {
    records
        .map(|r| r.iter().rev().cloned().collect())
        .unwrap_or_default()
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    notifications: DashMap<Uuid, Notification>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, new: NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        let mut t = self.tables.write().await;
        if t.usernames.contains_key(&new.username) {
            return Err(DomainError::Conflict(format!(
                "username {} is taken",
                new.username
            )));
        }
        let user = User {
            id: Uuid::now_v7(),
            username: new.username,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            created_at: now,
        };
        t.usernames.insert(user.username.clone(), user.id);
        t.profiles.insert(user.id, Profile::empty(user.id));
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.usernames.get(username).and_then(|id| t.users.get(id)).cloned())
    }

    async fn find_users_by_usernames(&self, usernames: &[String]) -> DomainResult<Vec<User>> {
        let t = self.tables.read().await;
        Ok(usernames
            .iter()
            .filter_map(|name| t.usernames.get(name))
            .filter_map(|id| t.users.get(id))
            .cloned()
            .collect())
    }

    async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> DomainResult<Profile> {
        let mut t = self.tables.write().await;
        let profile = t
            .profiles
            .get_mut(&user_id)
            .ok_or(DomainError::NotFound("user"))?;
        if let Some(bio) = update.bio {
            profile.bio = bio;
        }
        if let Some(device) = update.device {
            profile.device = device;
        }
        if let Some(avatar_ref) = update.avatar_ref {
            profile.avatar_ref = Some(avatar_ref);
        }
        Ok(profile.clone())
    }

    async fn apply_moderation(
        &self,
        user_id: Uuid,
        patch: ModerationPatch,
    ) -> DomainResult<Profile> {
        let mut t = self.tables.write().await;
        let profile = t
            .profiles
            .get_mut(&user_id)
            .ok_or(DomainError::NotFound("user"))?;
        profile.silenced_until = patch.silenced_until.apply(profile.silenced_until);
        profile.banned_until = patch.banned_until.apply(profile.banned_until);
        Ok(profile.clone())
    }
}

#[async_trait]
impl ThreadRepository for InMemoryStore {
    async fn slug_exists(&self, slug: &str) -> DomainResult<bool> {
        Ok(self.tables.read().await.slugs.contains_key(slug))
    }

    async fn insert_thread(&self, thread: Thread) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        if t.slugs.contains_key(&thread.slug) {
            return Err(DomainError::Conflict(format!("slug {} is taken", thread.slug)));
        }
        t.slugs.insert(thread.slug.clone(), thread.id);
        t.threads.insert(thread.id, thread);
        Ok(())
    }

    async fn find_thread_by_slug(&self, slug: &str) -> DomainResult<Option<Thread>> {
        let t = self.tables.read().await;
        Ok(t.slugs.get(slug).and_then(|id| t.threads.get(id)).cloned())
    }

    async fn list_threads(&self, page: Page) -> DomainResult<Vec<Thread>> {
        let t = self.tables.read().await;
        let mut threads: Vec<Thread> = t.threads.values().cloned().collect();
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(threads
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count_posts(&self, thread_id: Uuid) -> DomainResult<i64> {
        let t = self.tables.read().await;
        Ok(t.posts.values().filter(|p| p.thread_id == thread_id).count() as i64)
    }

    async fn update_thread_title(
        &self,
        id: Uuid,
        title: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Thread> {
        let mut t = self.tables.write().await;
        let thread = t.threads.get_mut(&id).ok_or(DomainError::NotFound("thread"))?;
        thread.title = title;
        thread.updated_at = now;
        Ok(thread.clone())
    }

    async fn delete_thread(&self, id: Uuid) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        let thread = t.threads.remove(&id).ok_or(DomainError::NotFound("thread"))?;
        t.slugs.remove(&thread.slug);
        let post_ids: Vec<Uuid> = t
            .posts
            .values()
            .filter(|p| p.thread_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in post_ids {
            t.remove_post(post_id);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert_post(&self, post: Post) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        if !t.threads.contains_key(&post.thread_id) {
            return Err(DomainError::NotFound("thread"));
        }
        t.posts.insert(post.id, post);
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> DomainResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn list_posts(&self, thread_id: Uuid) -> DomainResult<Vec<Post>> {
        let t = self.tables.read().await;
        let mut posts: Vec<Post> = t
            .posts
            .values()
            .filter(|p| p.thread_id == thread_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn edit_post(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Post> {
        let mut t = self.tables.write().await;
        let post = t.posts.get_mut(&id).ok_or(DomainError::NotFound("post"))?;
        let previous = std::mem::replace(&mut post.body, body);
        post.edited_at = Some(now);
        let edited = post.clone();
        t.post_edits.entry(id).or_default().push(EditRecord {
            subject_id: id,
            editor_id: Some(editor_id),
            body: previous,
            edited_at: now,
        });
        Ok(edited)
    }

    async fn delete_post(&self, id: Uuid) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&id) {
            return Err(DomainError::NotFound("post"));
        }
        t.remove_post(id);
        Ok(())
    }

    async fn post_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>> {
        Ok(newest_first(self.tables.read().await.post_edits.get(&id)))
    }

    async fn count_post_edits(&self, id: Uuid) -> DomainResult<i64> {
        let t = self.tables.read().await;
        Ok(t.post_edits.get(&id).map_or(0, |r| r.len() as i64))
    }
}

#[async_trait]
impl ProfileCommentRepository for InMemoryStore {
    async fn insert_comment(&self, comment: ProfileComment) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&comment.profile_user_id) {
            return Err(DomainError::NotFound("user"));
        }
        t.comments.insert(comment.id, comment);
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<ProfileComment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, profile_user_id: Uuid) -> DomainResult<Vec<ProfileComment>> {
        let t = self.tables.read().await;
        let mut comments: Vec<ProfileComment> = t
            .comments
            .values()
            .filter(|c| c.profile_user_id == profile_user_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn edit_comment(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<ProfileComment> {
        let mut t = self.tables.write().await;
        let comment = t
            .comments
            .get_mut(&id)
            .ok_or(DomainError::NotFound("comment"))?;
        let previous = std::mem::replace(&mut comment.body, body);
        comment.edited_at = Some(now);
        let edited = comment.clone();
        t.comment_edits.entry(id).or_default().push(EditRecord {
            subject_id: id,
            editor_id: Some(editor_id),
            body: previous,
            edited_at: now,
        });
        Ok(edited)
    }

    async fn delete_comment(&self, id: Uuid) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        t.comments
            .remove(&id)
            .ok_or(DomainError::NotFound("comment"))?;
        t.comment_edits.remove(&id);
        t.ratings
            .retain(|(subject, _), _| *subject != Subject::ProfileComment(id));
        Ok(())
    }

    async fn comment_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>> {
        Ok(newest_first(self.tables.read().await.comment_edits.get(&id)))
    }

    async fn count_comment_edits(&self, id: Uuid) -> DomainResult<i64> {
        let t = self.tables.read().await;
        Ok(t.comment_edits.get(&id).map_or(0, |r| r.len() as i64))
    }
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn upsert_rating(
        &self,
        subject: Subject,
        user_id: Uuid,
        value: VoteValue,
        _now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut t = self.tables.write().await;
        let exists = match subject {
            Subject::Post(id) => t.posts.contains_key(&id),
            Subject::ProfileComment(id) => t.comments.contains_key(&id),
        };
        if !exists {
            return Err(DomainError::NotFound("subject"));
        }
        t.ratings.insert((subject, user_id), value);
        Ok(())
    }

    async fn delete_rating(&self, subject: Subject, user_id: Uuid) -> DomainResult<bool> {
        let mut t = self.tables.write().await;
        Ok(t.ratings.remove(&(subject, user_id)).is_some())
    }

    async fn score(&self, subject: Subject) -> DomainResult<i64> {
        let t = self.tables.read().await;
        Ok(t.ratings
            .iter()
            .filter(|((s, _), _)| *s == subject)
            .map(|(_, v)| v.as_i64())
            .sum())
    }

    async fn vote_of(&self, subject: Subject, user_id: Uuid) -> DomainResult<Option<VoteValue>> {
        Ok(self.tables.read().await.ratings.get(&(subject, user_id)).copied())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert_notification(
        &self,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> DomainResult<Notification> {
        let notification = Notification {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            kind: new.kind,
            payload: new.payload,
            created_at: now,
            read_at: None,
        };
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> DomainResult<Vec<Notification>> {
        let mut found: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || n.read_at.is_none()))
            .map(|n| n.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Notification>> {
        let Some(mut entry) = self.notifications.get_mut(&id) else {
            return Ok(None);
        };
        if entry.user_id != user_id {
            return Ok(None);
        }
        entry.read_at.get_or_insert(now);
        Ok(Some(entry.clone()))
    }
}
