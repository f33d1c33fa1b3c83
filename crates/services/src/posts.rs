//! Posts inside threads: CRUD, edit history and votes.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, EditRecord, MentionContext, Post, PostRepository, Principal,
    Subject, Thread, ThreadRepository, UserRepository, VoteTally,
};

use crate::content::validate_body;
use crate::gate::{authorize, Action};
use crate::notifications::{report_dispatch, NotificationService};
use crate::views::{Authors, PostView};
use crate::voting::{parse_vote_value, VoteService};

#[derive(Clone)]
pub struct PostService {
    threads: Arc<dyn ThreadRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    votes: VoteService,
    notifications: NotificationService,
}

impl PostService {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        votes: VoteService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            threads,
            posts,
            users,
            votes,
            notifications,
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        thread_slug: &str,
    ) -> DomainResult<Vec<PostView>> {
        authorize(principal, Action::List, None, Utc::now())?;
        let thread = self.thread(thread_slug).await?;
        let posts = self.posts.list_posts(thread.id).await?;
        let mut authors = Authors::new(self.users.as_ref());
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.view(principal, &mut authors, &thread, post).await?);
        }
        Ok(views)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
    ) -> DomainResult<PostView> {
        authorize(principal, Action::Retrieve, None, Utc::now())?;
        let (thread, post) = self.locate(thread_slug, id).await?;
        self.view(principal, &mut Authors::new(self.users.as_ref()), &thread, post)
            .await
    }

    /// Persists the post, then fires reply and mention notifications. A
    /// notification failure is logged and does not affect the result.
    pub async fn create(
        &self,
        principal: &Principal,
        thread_slug: &str,
        body: String,
    ) -> DomainResult<PostView> {
        let now = Utc::now();
        authorize(principal, Action::Create, None, now)?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let thread = self.thread(thread_slug).await?;
        validate_body(&body)?;

        let post = Post {
            id: Uuid::now_v7(),
            thread_id: thread.id,
            author_id: actor.id,
            body,
            created_at: now,
            edited_at: None,
        };
        self.posts.insert_post(post.clone()).await?;
        tracing::info!(
            post_id = %post.id,
            thread = %thread.slug,
            author = %actor.username,
            "post created"
        );

        report_dispatch(
            self.notifications.notify_thread_reply(actor, &thread, &post).await,
            "thread_reply",
            post.id,
        );
        report_dispatch(
            self.notifications
                .notify_mentions(
                    actor,
                    &post.body,
                    MentionContext::Post {
                        thread_slug: thread.slug.clone(),
                        post_id: post.id,
                    },
                )
                .await,
            "mention",
            post.id,
        );

        self.view(principal, &mut Authors::new(self.users.as_ref()), &thread, post)
            .await
    }

    /// Records the previous body in the history, then applies `body`.
    pub async fn update(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
        body: String,
    ) -> DomainResult<PostView> {
        let now = Utc::now();
        authorize(principal, Action::Edit, None, now)?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let (thread, post) = self.locate(thread_slug, id).await?;
        authorize(principal, Action::Edit, Some(&post), now)?;
        validate_body(&body)?;

        let edited = self.posts.edit_post(post.id, actor.id, body, now).await?;
        tracing::info!(post_id = %edited.id, editor = %actor.username, "post edited");
        self.view(principal, &mut Authors::new(self.users.as_ref()), &thread, edited)
            .await
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
    ) -> DomainResult<()> {
        let now = Utc::now();
        authorize(principal, Action::Delete, None, now)?;
        let (_, post) = self.locate(thread_slug, id).await?;
        authorize(principal, Action::Delete, Some(&post), now)?;
        self.posts.delete_post(post.id).await?;
        tracing::info!(post_id = %post.id, "post deleted");
        Ok(())
    }

    /// Staff-only; newest edit first.
    pub async fn history(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
    ) -> DomainResult<Vec<EditRecord>> {
        authorize(principal, Action::ViewHistory, None, Utc::now())?;
        let (_, post) = self.locate(thread_slug, id).await?;
        self.posts.post_history(post.id).await
    }

    pub async fn vote(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
        value: &serde_json::Value,
    ) -> DomainResult<VoteTally> {
        authorize(principal, Action::Vote, None, Utc::now())?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let (_, post) = self.locate(thread_slug, id).await?;
        let value = parse_vote_value(value)?;
        self.votes.set_vote(actor, Subject::Post(post.id), value).await
    }

    pub async fn unvote(
        &self,
        principal: &Principal,
        thread_slug: &str,
        id: Uuid,
    ) -> DomainResult<VoteTally> {
        authorize(principal, Action::Vote, None, Utc::now())?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let (_, post) = self.locate(thread_slug, id).await?;
        self.votes.clear_vote(actor, Subject::Post(post.id)).await
    }

    async fn thread(&self, slug: &str) -> DomainResult<Thread> {
        self.threads
            .find_thread_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound("thread"))
    }

    /// A post addressed through a thread it does not belong to is missing.
    async fn locate(&self, thread_slug: &str, id: Uuid) -> DomainResult<(Thread, Post)> {
        let thread = self.thread(thread_slug).await?;
        match self.posts.find_post(id).await? {
            Some(post) if post.thread_id == thread.id => Ok((thread, post)),
            _ => Err(DomainError::NotFound("post")),
        }
    }

    async fn view(
        &self,
        principal: &Principal,
        authors: &mut Authors<'_>,
        thread: &Thread,
        post: Post,
    ) -> DomainResult<PostView> {
        let author = authors.summary(post.author_id).await?;
        let tally = self
            .votes
            .tally(Subject::Post(post.id), principal.user_id())
            .await?;
        let edit_count = self.posts.count_post_edits(post.id).await?;
        Ok(PostView {
            post,
            thread_slug: thread.slug.clone(),
            author,
            score: tally.score,
            my_vote: tally.my_vote,
            edit_count,
        })
    }
}
