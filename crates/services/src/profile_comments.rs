//! Comments on user profiles. Same rules as posts; the profile owner may
//! additionally delete comments left on their profile.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, EditRecord, MentionContext, Principal, ProfileComment,
    ProfileCommentRepository, Subject, User, UserRepository, VoteTally,
};

use crate::content::validate_body;
use crate::gate::{authorize, Action};
use crate::notifications::{report_dispatch, NotificationService};
use crate::views::{Authors, CommentView};
use crate::voting::{parse_vote_value, VoteService};

#[derive(Clone)]
pub struct ProfileCommentService {
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn ProfileCommentRepository>,
    votes: VoteService,
    notifications: NotificationService,
}

impl ProfileCommentService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn ProfileCommentRepository>,
        votes: VoteService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            users,
            comments,
            votes,
            notifications,
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        username: &str,
    ) -> DomainResult<Vec<CommentView>> {
        authorize(principal, Action::List, None, Utc::now())?;
        let owner = self.owner(username).await?;
        let comments = self.comments.list_comments(owner.id).await?;
        let mut authors = Authors::new(self.users.as_ref());
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.view(principal, &mut authors, comment).await?);
        }
        Ok(views)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
    ) -> DomainResult<CommentView> {
        authorize(principal, Action::Retrieve, None, Utc::now())?;
        let comment = self.locate(username, id).await?;
        self.view(principal, &mut Authors::new(self.users.as_ref()), comment)
            .await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        username: &str,
        body: String,
    ) -> DomainResult<CommentView> {
        let now = Utc::now();
        authorize(principal, Action::Create, None, now)?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let owner = self.owner(username).await?;
        validate_body(&body)?;

        let comment = ProfileComment {
            id: Uuid::now_v7(),
            profile_user_id: owner.id,
            author_id: actor.id,
            body,
            created_at: now,
            edited_at: None,
        };
        self.comments.insert_comment(comment.clone()).await?;
        tracing::info!(
            comment_id = %comment.id,
            profile = %owner.username,
            author = %actor.username,
            "profile comment created"
        );

        report_dispatch(
            self.notifications
                .notify_profile_comment(actor, &owner, &comment)
                .await,
            "profile_comment",
            comment.id,
        );
        report_dispatch(
            self.notifications
                .notify_mentions(
                    actor,
                    &comment.body,
                    MentionContext::ProfileComment {
                        username: owner.username.clone(),
                        comment_id: comment.id,
                    },
                )
                .await,
            "mention",
            comment.id,
        );

        self.view(principal, &mut Authors::new(self.users.as_ref()), comment)
            .await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
        body: String,
    ) -> DomainResult<CommentView> {
        let now = Utc::now();
        authorize(principal, Action::Edit, None, now)?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let comment = self.locate(username, id).await?;
        authorize(principal, Action::Edit, Some(&comment), now)?;
        validate_body(&body)?;

        let edited = self.comments.edit_comment(comment.id, actor.id, body, now).await?;
        tracing::info!(comment_id = %edited.id, editor = %actor.username, "profile comment edited");
        self.view(principal, &mut Authors::new(self.users.as_ref()), edited)
            .await
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
    ) -> DomainResult<()> {
        let now = Utc::now();
        authorize(principal, Action::Delete, None, now)?;
        let comment = self.locate(username, id).await?;
        authorize(principal, Action::Delete, Some(&comment), now)?;
        self.comments.delete_comment(comment.id).await?;
        tracing::info!(comment_id = %comment.id, "profile comment deleted");
        Ok(())
    }

    pub async fn history(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
    ) -> DomainResult<Vec<EditRecord>> {
        authorize(principal, Action::ViewHistory, None, Utc::now())?;
        let comment = self.locate(username, id).await?;
        self.comments.comment_history(comment.id).await
    }

    pub async fn vote(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
        value: &serde_json::Value,
    ) -> DomainResult<VoteTally> {
        authorize(principal, Action::Vote, None, Utc::now())?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let comment = self.locate(username, id).await?;
        let value = parse_vote_value(value)?;
        self.votes
            .set_vote(actor, Subject::ProfileComment(comment.id), value)
            .await
    }

    pub async fn unvote(
        &self,
        principal: &Principal,
        username: &str,
        id: Uuid,
    ) -> DomainResult<VoteTally> {
        authorize(principal, Action::Vote, None, Utc::now())?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let comment = self.locate(username, id).await?;
        self.votes
            .clear_vote(actor, Subject::ProfileComment(comment.id))
            .await
    }

    async fn owner(&self, username: &str) -> DomainResult<User> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or(DomainError::NotFound("user"))
    }

    /// The comment must hang off `username`'s profile.
    async fn locate(&self, username: &str, id: Uuid) -> DomainResult<ProfileComment> {
        let owner = self.owner(username).await?;
        match self.comments.find_comment(id).await? {
            Some(comment) if comment.profile_user_id == owner.id => Ok(comment),
            _ => Err(DomainError::NotFound("comment")),
        }
    }

    async fn view(
        &self,
        principal: &Principal,
        authors: &mut Authors<'_>,
        comment: ProfileComment,
    ) -> DomainResult<CommentView> {
        let author = authors.summary(comment.author_id).await?;
        let tally = self
            .votes
            .tally(Subject::ProfileComment(comment.id), principal.user_id())
            .await?;
        let edit_count = self.comments.count_comment_edits(comment.id).await?;
        Ok(CommentView {
            comment,
            author,
            score: tally.score,
            my_vote: tally.my_vote,
            edit_count,
        })
    }
}
