//! rusty-forum/crates/services/src/lib.rs
//!
//! Business rules of the forum: the authorization gate, content lifecycle,
//! voting, notifications and moderation. Talks to storage only through the
//! port traits in `domains`.

pub mod accounts;
pub mod content;
pub mod gate;
pub mod moderation;
pub mod notifications;
pub mod posts;
pub mod profile_comments;
pub mod slug;
pub mod threads;
pub mod views;
pub mod voting;

use std::sync::Arc;

use domains::{
    NotificationRepository, PostRepository, ProfileCommentRepository, RatingRepository,
    ThreadRepository, UserRepository,
};

pub use accounts::AccountService;
pub use gate::{authorize, Action, Owned};
pub use moderation::ModerationService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use profile_comments::ProfileCommentService;
pub use threads::{CreateThread, ThreadService, UpdateThread};
pub use views::*;
pub use voting::VoteService;

/// Every port the services need, usually all backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn ProfileCommentRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Uses a single store for every port.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ThreadRepository
            + PostRepository
            + ProfileCommentRepository
            + RatingRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            threads: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            ratings: store.clone(),
            notifications: store,
        }
    }
}

/// The assembled service layer handed to the API adapter.
#[derive(Clone)]
pub struct ForumServices {
    pub accounts: AccountService,
    pub threads: ThreadService,
    pub posts: PostService,
    pub comments: ProfileCommentService,
    pub notifications: NotificationService,
    pub moderation: ModerationService,
}

impl ForumServices {
    pub fn new(repos: Repositories) -> Self {
        let votes = VoteService::new(repos.ratings.clone());
        let notifications =
            NotificationService::new(repos.users.clone(), repos.notifications.clone());
        Self {
            accounts: AccountService::new(repos.users.clone()),
            threads: ThreadService::new(repos.threads.clone(), repos.users.clone()),
            posts: PostService::new(
                repos.threads.clone(),
                repos.posts.clone(),
                repos.users.clone(),
                votes.clone(),
                notifications.clone(),
            ),
            comments: ProfileCommentService::new(
                repos.users.clone(),
                repos.comments.clone(),
                votes,
                notifications.clone(),
            ),
            notifications,
            moderation: ModerationService::new(repos.users),
        }
    }
}
