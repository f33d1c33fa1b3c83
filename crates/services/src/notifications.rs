//! # Notification pipeline
//!
//! Derives `thread_reply`, `profile_comment` and `mention` notifications
//! from freshly created content. Dispatch runs after the content write has
//! committed; every `notify_*` call returns a `Result` that the content
//! services hand to [`report_dispatch`], which logs it and drops it.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use domains::{
    Actor, DomainError, DomainResult, MentionContext, MentionPayload, NewNotification,
    Notification, NotificationKind, NotificationRepository, Post, Principal, ProfileComment,
    ProfileCommentPayload, Thread, ThreadReplyPayload, User, UserRepository,
};

use crate::gate::{authorize, Action};

/// Listings never return more than this many notifications.
pub const LIST_LIMIT: i64 = 50;

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]{1,30})").expect("mention pattern compiles"));

/// Distinct usernames mentioned in `text`, in sorted order.
pub fn extract_mentions(text: &str) -> BTreeSet<String> {
    MENTION_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Logs a failed side effect. Never propagates: the triggering write has
/// already succeeded.
pub(crate) fn report_dispatch<T>(result: DomainResult<T>, event: &'static str, source_id: Uuid) {
    if let Err(error) = result {
        tracing::warn!(%error, event, %source_id, "notification dispatch failed");
    }
}

fn to_payload<T: serde::Serialize>(payload: &T) -> DomainResult<serde_json::Value> {
    serde_json::to_value(payload).map_err(|e| DomainError::Internal(e.to_string()))
}

#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            users,
            notifications,
        }
    }

    async fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> DomainResult<Notification> {
        self.notifications
            .insert_notification(
                NewNotification {
                    user_id,
                    kind,
                    payload,
                },
                Utc::now(),
            )
            .await
    }

    /// Tells the thread author about a reply, unless they wrote it.
    pub async fn notify_thread_reply(
        &self,
        actor: &Actor,
        thread: &Thread,
        post: &Post,
    ) -> DomainResult<Option<Notification>> {
        if thread.author_id == actor.id {
            return Ok(None);
        }
        let payload = to_payload(&ThreadReplyPayload {
            thread_slug: thread.slug.clone(),
            post_id: post.id,
            actor_username: actor.username.clone(),
        })?;
        self.emit(thread.author_id, NotificationKind::ThreadReply, payload)
            .await
            .map(Some)
    }

    /// Tells a profile owner about a new comment, unless they wrote it.
    pub async fn notify_profile_comment(
        &self,
        actor: &Actor,
        profile_owner: &User,
        comment: &ProfileComment,
    ) -> DomainResult<Option<Notification>> {
        if profile_owner.id == actor.id {
            return Ok(None);
        }
        let payload = to_payload(&ProfileCommentPayload {
            username: profile_owner.username.clone(),
            comment_id: comment.id,
            actor_username: actor.username.clone(),
        })?;
        self.emit(profile_owner.id, NotificationKind::ProfileComment, payload)
            .await
            .map(Some)
    }

    /// One `mention` per distinct existing user named in `text`, skipping
    /// the actor. Independent of the reply/comment notifications: a user can
    /// receive both for the same piece of content. A recipient whose insert
    /// fails is logged and skipped; the rest are still notified.
    pub async fn notify_mentions(
        &self,
        actor: &Actor,
        text: &str,
        context: MentionContext,
    ) -> DomainResult<Vec<Notification>> {
        let usernames: Vec<String> = extract_mentions(text).into_iter().collect();
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.users.find_users_by_usernames(&usernames).await?;

        let mut sent = Vec::new();
        for user in found.iter().filter(|u| u.id != actor.id) {
            let payload = MentionPayload {
                actor_username: actor.username.clone(),
                mentioned_username: user.username.clone(),
                context: context.clone(),
            };
            let emitted = match to_payload(&payload) {
                Ok(value) => self.emit(user.id, NotificationKind::Mention, value).await,
                Err(error) => Err(error),
            };
            match emitted {
                Ok(notification) => sent.push(notification),
                Err(error) => {
                    tracing::warn!(%error, recipient = %user.username, "mention dispatch failed");
                }
            }
        }
        Ok(sent)
    }

    /// The caller's notifications, newest first, capped at [`LIST_LIMIT`].
    pub async fn list(
        &self,
        principal: &Principal,
        unread_only: bool,
    ) -> DomainResult<Vec<Notification>> {
        authorize(principal, Action::ReadNotifications, None, Utc::now())?;
        let user_id = principal.user_id().ok_or(DomainError::Unauthenticated)?;
        self.notifications
            .list_notifications(user_id, unread_only, LIST_LIMIT)
            .await
    }

    /// Marks one of the caller's notifications read. Someone else's
    /// notification is reported as missing.
    pub async fn mark_read(&self, principal: &Principal, id: Uuid) -> DomainResult<Notification> {
        let now = Utc::now();
        authorize(principal, Action::ReadNotifications, None, now)?;
        let user_id = principal.user_id().ok_or(DomainError::Unauthenticated)?;
        self.notifications
            .mark_read(id, user_id, now)
            .await?
            .ok_or(DomainError::NotFound("notification"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockNotificationRepository, MockUserRepository};

    fn actor(username: &str) -> Actor {
        Actor {
            id: Uuid::now_v7(),
            username: username.into(),
            is_staff: false,
            is_superuser: false,
            silenced_until: None,
            banned_until: None,
        }
    }

    fn user(id: Uuid, username: &str) -> User {
        User {
            id,
            username: username.into(),
            is_staff: false,
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    fn echo_insert(notifications: &mut MockNotificationRepository) {
        notifications
            .expect_insert_notification()
            .returning(|new, now| {
                Ok(Notification {
                    id: Uuid::now_v7(),
                    user_id: new.user_id,
                    kind: new.kind,
                    payload: new.payload,
                    created_at: now,
                    read_at: None,
                })
            });
    }

    #[test]
    fn mentions_are_distinct_and_bounded() {
        let found = extract_mentions("hi @alice and @bob, @alice again; mail a@b");
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["alice".to_string(), "b".to_string(), "bob".to_string()]
        );
        let long = format!("@{}", "x".repeat(40));
        let only = extract_mentions(&long);
        assert_eq!(only.len(), 1);
        assert_eq!(only.iter().next().unwrap().len(), 30);
        assert!(extract_mentions("no mentions @ here").is_empty());
    }

    #[tokio::test]
    async fn self_mentions_are_suppressed_and_duplicates_collapse() {
        let writer = actor("writer");
        let writer_id = writer.id;
        let friend_id = Uuid::now_v7();

        let mut users = MockUserRepository::new();
        users
            .expect_find_users_by_usernames()
            .withf(|names| names.iter().map(String::as_str).eq(["friend", "writer"]))
            .returning(move |_| Ok(vec![user(writer_id, "writer"), user(friend_id, "friend")]));
        let mut notifications = MockNotificationRepository::new();
        echo_insert(&mut notifications);

        let service = NotificationService::new(Arc::new(users), Arc::new(notifications));
        let sent = service
            .notify_mentions(
                &writer,
                "@friend @friend and me @writer",
                MentionContext::ProfileComment {
                    username: "friend".into(),
                    comment_id: Uuid::now_v7(),
                },
            )
            .await
            .unwrap();

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, friend_id);
        assert_eq!(sent[0].kind, NotificationKind::Mention);
        assert_eq!(sent[0].payload["type"], "profile_comment");
        assert_eq!(sent[0].payload["mentionedUsername"], "friend");
    }

    #[tokio::test]
    async fn reply_to_own_thread_is_silent() {
        let author = actor("author");
        let thread = Thread {
            id: Uuid::now_v7(),
            title: "t".into(),
            slug: "t-00000000".into(),
            author_id: author.id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let post = Post {
            id: Uuid::now_v7(),
            thread_id: thread.id,
            author_id: author.id,
            body: "bump".into(),
            created_at: Utc::now(),
            edited_at: None,
        };
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert_notification().never();

        let service = NotificationService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(notifications),
        );
        let sent = service.notify_thread_reply(&author, &thread, &post).await;
        tokio_test::assert_ok!(&sent);
        assert!(sent.unwrap().is_none());
    }

    #[tokio::test]
    async fn marking_foreign_notification_is_not_found() {
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_mark_read().returning(|_, _, _| Ok(None));

        let service = NotificationService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(notifications),
        );
        let result = service
            .mark_read(&Principal::Authenticated(actor("reader")), Uuid::now_v7())
            .await;
        assert_eq!(result, Err(DomainError::NotFound("notification")));
    }

    #[tokio::test]
    async fn anonymous_cannot_list() {
        let service = NotificationService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockNotificationRepository::new()),
        );
        let result = service.list(&Principal::Anonymous, false).await;
        tokio_test::assert_err!(&result);
        assert_eq!(result, Err(DomainError::Unauthenticated));
    }
}
