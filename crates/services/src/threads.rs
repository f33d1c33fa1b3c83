//! Thread lifecycle behind the gate.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{DomainError, DomainResult, Page, Principal, Thread, ThreadRepository, UserRepository};

use crate::gate::{authorize, Action};
use crate::slug;
use crate::views::{Authors, ThreadView};

pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct CreateThread {
    pub title: String,
    /// Explicit slug; generated from the title when absent.
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateThread {
    pub title: Option<String>,
}

fn validate_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::invalid("title", "title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DomainError::invalid(
            "title",
            format!("title must be at most {MAX_TITLE_CHARS} characters"),
        ));
    }
    Ok(title.to_string())
}

#[derive(Clone)]
pub struct ThreadService {
    threads: Arc<dyn ThreadRepository>,
    users: Arc<dyn UserRepository>,
}

impl ThreadService {
    pub fn new(threads: Arc<dyn ThreadRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { threads, users }
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> DomainResult<Vec<ThreadView>> {
        authorize(principal, Action::List, None, Utc::now())?;
        let threads = self.threads.list_threads(page).await?;
        let mut authors = Authors::new(self.users.as_ref());
        let mut views = Vec::with_capacity(threads.len());
        for thread in threads {
            views.push(self.view(&mut authors, thread).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, principal: &Principal, slug: &str) -> DomainResult<ThreadView> {
        authorize(principal, Action::Retrieve, None, Utc::now())?;
        let thread = self.find(slug).await?;
        self.view(&mut Authors::new(self.users.as_ref()), thread).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateThread,
    ) -> DomainResult<ThreadView> {
        let now = Utc::now();
        authorize(principal, Action::Create, None, now)?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let title = validate_title(&input.title)?;

        let mut thread = Thread {
            id: Uuid::now_v7(),
            title,
            slug: String::new(),
            author_id: actor.id,
            created_at: now,
            updated_at: now,
        };
        match input.slug.as_deref().map(slug::slugify) {
            Some(explicit) if !explicit.is_empty() => {
                thread.slug = explicit;
                self.threads.insert_thread(thread.clone()).await?;
            }
            _ => self.insert_with_generated_slug(&mut thread).await?,
        }

        tracing::info!(
            thread_id = %thread.id,
            slug = %thread.slug,
            author = %actor.username,
            "thread created"
        );
        self.view(&mut Authors::new(self.users.as_ref()), thread).await
    }

    /// Up to five `base-xxxxxxxx` candidates, then `thread-xxxxxxxx`. The
    /// existence probe skips obvious collisions; the unique index decides.
    async fn insert_with_generated_slug(&self, thread: &mut Thread) -> DomainResult<()> {
        let base = slug::slug_base(&thread.title);
        for _ in 0..slug::MAX_ATTEMPTS {
            let candidate = slug::candidate(&base);
            if self.threads.slug_exists(&candidate).await? {
                tracing::debug!(%candidate, "slug taken, retrying");
                continue;
            }
            thread.slug = candidate;
            match self.threads.insert_thread(thread.clone()).await {
                Ok(()) => return Ok(()),
                Err(DomainError::Conflict(_)) => {
                    tracing::debug!(slug = %thread.slug, "slug lost insert race, retrying");
                }
                Err(other) => return Err(other),
            }
        }
        thread.slug = slug::fallback();
        self.threads.insert_thread(thread.clone()).await
    }

    /// Applies a partial update. An empty patch still goes through the gate.
    pub async fn update(
        &self,
        principal: &Principal,
        slug: &str,
        patch: UpdateThread,
    ) -> DomainResult<ThreadView> {
        let now = Utc::now();
        authorize(principal, Action::Edit, None, now)?;
        let thread = self.find(slug).await?;
        authorize(principal, Action::Edit, Some(&thread), now)?;
        let updated = match patch.title {
            Some(title) => {
                let title = validate_title(&title)?;
                self.threads.update_thread_title(thread.id, title, now).await?
            }
            None => thread,
        };
        self.view(&mut Authors::new(self.users.as_ref()), updated).await
    }

    pub async fn delete(&self, principal: &Principal, slug: &str) -> DomainResult<()> {
        let now = Utc::now();
        authorize(principal, Action::Delete, None, now)?;
        let thread = self.find(slug).await?;
        authorize(principal, Action::Delete, Some(&thread), now)?;
        self.threads.delete_thread(thread.id).await?;
        tracing::info!(thread_id = %thread.id, slug = %thread.slug, "thread deleted");
        Ok(())
    }

    async fn find(&self, slug: &str) -> DomainResult<Thread> {
        self.threads
            .find_thread_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound("thread"))
    }

    async fn view(&self, authors: &mut Authors<'_>, thread: Thread) -> DomainResult<ThreadView> {
        let author = authors.summary(thread.author_id).await?;
        let posts_count = self.threads.count_posts(thread.id).await?;
        Ok(ThreadView {
            thread,
            author,
            posts_count,
        })
    }
}
