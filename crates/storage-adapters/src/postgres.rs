//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the domain models.
//! Multi-statement writes (user + profile, edit snapshot + update) run in a
//! transaction; unique violations surface as `DomainError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, EditRecord, ModerationPatch, NewNotification, NewUser,
    Notification, NotificationKind, NotificationRepository, Page, Post, PostRepository, Profile,
    ProfileComment, ProfileCommentRepository, ProfileUpdate, RatingRepository, Subject, Thread,
    ThreadRepository, User, UserRepository, VoteValue, WindowChange,
};

const USER_COLUMNS: &str = "id, username, is_staff, is_superuser, created_at";
const PROFILE_COLUMNS: &str =
    "user_id, bio, avatar_ref, device, silenced_until, banned_until";
const THREAD_COLUMNS: &str = "id, title, slug, author_id, created_at, updated_at";
const POST_COLUMNS: &str = "id, thread_id, author_id, body, created_at, edited_at";
const COMMENT_COLUMNS: &str = "id, profile_user_id, author_id, body, created_at, edited_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, payload, created_at, read_at";

fn db_err(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DomainError::NotFound("referenced row")
        }
        _ => {
            tracing::error!(error = %err, "database error");
            DomainError::Internal(err.to_string())
        }
    }
}

fn user_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_row(row: &PgRow) -> Result<Profile, sqlx::Error> {
    Ok(Profile {
        user_id: row.try_get("user_id")?,
        bio: row.try_get("bio")?,
        avatar_ref: row.try_get("avatar_ref")?,
        device: row.try_get("device")?,
        silenced_until: row.try_get("silenced_until")?,
        banned_until: row.try_get("banned_until")?,
    })
}

fn thread_row(row: &PgRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        thread_id: row.try_get("thread_id")?,
        author_id: row.try_get("author_id")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        edited_at: row.try_get("edited_at")?,
    })
}

fn comment_row(row: &PgRow) -> Result<ProfileComment, sqlx::Error> {
    Ok(ProfileComment {
        id: row.try_get("id")?,
        profile_user_id: row.try_get("profile_user_id")?,
        author_id: row.try_get("author_id")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        edited_at: row.try_get("edited_at")?,
    })
}

fn edit_row(row: &PgRow) -> Result<EditRecord, sqlx::Error> {
    Ok(EditRecord {
        subject_id: row.try_get("subject_id")?,
        editor_id: row.try_get("editor_id")?,
        body: row.try_get("body")?,
        edited_at: row.try_get("edited_at")?,
    })
}

fn notification_row(row: &PgRow) -> DomainResult<Notification> {
    let kind: String = row.try_get("kind").map_err(db_err)?;
    Ok(Notification {
        id: row.try_get("id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| DomainError::Internal(format!("unknown notification kind {kind}")))?,
        payload: row.try_get("payload").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        read_at: row.try_get("read_at").map_err(db_err)?,
    })
}

/// A body-bearing table and its append-only history table.
struct Editable {
    table: &'static str,
    columns: &'static str,
    history: &'static str,
    history_fk: &'static str,
    missing: &'static str,
}

const POSTS: Editable = Editable {
    table: "posts",
    columns: POST_COLUMNS,
    history: "post_edits",
    history_fk: "post_id",
    missing: "post",
};

const COMMENTS: Editable = Editable {
    table: "profile_comments",
    columns: COMMENT_COLUMNS,
    history: "profile_comment_edits",
    history_fk: "comment_id",
    missing: "comment",
};

/// Rating table and subject column for a subject.
fn rating_table(subject: Subject) -> (&'static str, &'static str) {
    match subject {
        Subject::Post(_) => ("post_ratings", "post_id"),
        Subject::ProfileComment(_) => ("profile_comment_ratings", "comment_id"),
    }
}

/// `(keep, value)` pair bound into the moderation `CASE` expression.
fn window_binds(change: WindowChange) -> (bool, Option<DateTime<Utc>>) {
    match change {
        WindowChange::Keep => (true, None),
        WindowChange::Clear => (false, None),
        WindowChange::Set(at) => (false, Some(at)),
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Locks the row, copies its body into the history table, then applies
    /// the new body.
    async fn snapshot_and_update(
        &self,
        target: &Editable,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<PgRow> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let select = format!("SELECT body FROM {} WHERE id = $1 FOR UPDATE", target.table);
        let previous: String = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound(target.missing))?
            .try_get("body")
            .map_err(db_err)?;

        let snapshot = format!(
            "INSERT INTO {} ({}, editor_id, body, edited_at) VALUES ($1, $2, $3, $4)",
            target.history, target.history_fk
        );
        sqlx::query(&snapshot)
            .bind(id)
            .bind(editor_id)
            .bind(previous)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let update = format!(
            "UPDATE {} SET body = $2, edited_at = $3 WHERE id = $1 RETURNING {}",
            target.table, target.columns
        );
        let row = sqlx::query(&update)
            .bind(id)
            .bind(body)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(row)
    }

    async fn history(&self, target: &Editable, id: Uuid) -> DomainResult<Vec<EditRecord>> {
        let sql = format!(
            "SELECT {fk} AS subject_id, editor_id, body, edited_at FROM {table} \
             WHERE {fk} = $1 ORDER BY edited_at DESC, id DESC",
            fk = target.history_fk,
            table = target.history
        );
        sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| edit_row(row).map_err(db_err))
            .collect()
    }

    async fn count_edits(&self, target: &Editable, id: Uuid) -> DomainResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {} WHERE {} = $1",
            target.history, target.history_fk
        );
        sqlx::query(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get("n")
            .map_err(db_err)
    }

    async fn delete_by_id(&self, table: &str, id: Uuid, missing: &'static str) -> DomainResult<()> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let done = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::NotFound(missing));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new: NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let user = User {
            id: Uuid::now_v7(),
            username: new.username,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            created_at: now,
        };
        sqlx::query(
            "INSERT INTO users (id, username, is_staff, is_superuser, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| user_row(&row).map_err(db_err))
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| user_row(&row).map_err(db_err))
            .transpose()
    }

    async fn find_users_by_usernames(&self, usernames: &[String]) -> DomainResult<Vec<User>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ANY($1)");
        sqlx::query(&sql)
            .bind(usernames)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| user_row(row).map_err(db_err))
            .collect()
    }

    async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
        sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| profile_row(&row).map_err(db_err))
            .transpose()
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> DomainResult<Profile> {
        let sql = format!(
            "UPDATE profiles SET bio = COALESCE($2, bio), device = COALESCE($3, device), \
             avatar_ref = COALESCE($4, avatar_ref) WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(update.bio)
            .bind(update.device)
            .bind(update.avatar_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound("user"))?;
        profile_row(&row).map_err(db_err)
    }

    async fn apply_moderation(
        &self,
        user_id: Uuid,
        patch: ModerationPatch,
    ) -> DomainResult<Profile> {
        let (keep_silence, silenced_until) = window_binds(patch.silenced_until);
        let (keep_ban, banned_until) = window_binds(patch.banned_until);
        let sql = format!(
            "UPDATE profiles SET \
             silenced_until = CASE WHEN $2 THEN silenced_until ELSE $3 END, \
             banned_until = CASE WHEN $4 THEN banned_until ELSE $5 END \
             WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(keep_silence)
            .bind(silenced_until)
            .bind(keep_ban)
            .bind(banned_until)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound("user"))?;
        profile_row(&row).map_err(db_err)
    }
}

#[async_trait]
impl ThreadRepository for PgStore {
    async fn slug_exists(&self, slug: &str) -> DomainResult<bool> {
        sqlx::query("SELECT EXISTS (SELECT 1 FROM threads WHERE slug = $1) AS taken")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get("taken")
            .map_err(db_err)
    }

    async fn insert_thread(&self, thread: Thread) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO threads (id, title, slug, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(thread.id)
        .bind(thread.title)
        .bind(thread.slug)
        .bind(thread.author_id)
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_thread_by_slug(&self, slug: &str) -> DomainResult<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE slug = $1");
        sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| thread_row(&row).map_err(db_err))
            .transpose()
    }

    async fn list_threads(&self, page: Page) -> DomainResult<Vec<Thread>> {
        let sql = format!(
            "SELECT {THREAD_COLUMNS} FROM threads \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| thread_row(row).map_err(db_err))
            .collect()
    }

    async fn count_posts(&self, thread_id: Uuid) -> DomainResult<i64> {
        sqlx::query("SELECT COUNT(*) AS n FROM posts WHERE thread_id = $1")
            .bind(thread_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get("n")
            .map_err(db_err)
    }

    async fn update_thread_title(
        &self,
        id: Uuid,
        title: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Thread> {
        let sql = format!(
            "UPDATE threads SET title = $2, updated_at = $3 WHERE id = $1 RETURNING {THREAD_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(title)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::NotFound("thread"))?;
        thread_row(&row).map_err(db_err)
    }

    async fn delete_thread(&self, id: Uuid) -> DomainResult<()> {
        self.delete_by_id("threads", id, "thread").await
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: Post) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO posts (id, thread_id, author_id, body, created_at, edited_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(post.id)
        .bind(post.thread_id)
        .bind(post.author_id)
        .bind(post.body)
        .bind(post.created_at)
        .bind(post.edited_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> DomainResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| post_row(&row).map_err(db_err))
            .transpose()
    }

    async fn list_posts(&self, thread_id: Uuid) -> DomainResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE thread_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query(&sql)
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| post_row(row).map_err(db_err))
            .collect()
    }

    async fn edit_post(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Post> {
        let row = self.snapshot_and_update(&POSTS, id, editor_id, body, now).await?;
        post_row(&row).map_err(db_err)
    }

    async fn delete_post(&self, id: Uuid) -> DomainResult<()> {
        self.delete_by_id("posts", id, "post").await
    }

    async fn post_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>> {
        self.history(&POSTS, id).await
    }

    async fn count_post_edits(&self, id: Uuid) -> DomainResult<i64> {
        self.count_edits(&POSTS, id).await
    }
}

#[async_trait]
impl ProfileCommentRepository for PgStore {
    async fn insert_comment(&self, comment: ProfileComment) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO profile_comments (id, profile_user_id, author_id, body, created_at, edited_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(comment.id)
        .bind(comment.profile_user_id)
        .bind(comment.author_id)
        .bind(comment.body)
        .bind(comment.created_at)
        .bind(comment.edited_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> DomainResult<Option<ProfileComment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM profile_comments WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| comment_row(&row).map_err(db_err))
            .transpose()
    }

    async fn list_comments(&self, profile_user_id: Uuid) -> DomainResult<Vec<ProfileComment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM profile_comments WHERE profile_user_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query(&sql)
            .bind(profile_user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| comment_row(row).map_err(db_err))
            .collect()
    }

    async fn edit_comment(
        &self,
        id: Uuid,
        editor_id: Uuid,
        body: String,
        now: DateTime<Utc>,
    ) -> DomainResult<ProfileComment> {
        let row = self
            .snapshot_and_update(&COMMENTS, id, editor_id, body, now)
            .await?;
        comment_row(&row).map_err(db_err)
    }

    async fn delete_comment(&self, id: Uuid) -> DomainResult<()> {
        self.delete_by_id("profile_comments", id, "comment").await
    }

    async fn comment_history(&self, id: Uuid) -> DomainResult<Vec<EditRecord>> {
        self.history(&COMMENTS, id).await
    }

    async fn count_comment_edits(&self, id: Uuid) -> DomainResult<i64> {
        self.count_edits(&COMMENTS, id).await
    }
}

#[async_trait]
impl RatingRepository for PgStore {
    async fn upsert_rating(
        &self,
        subject: Subject,
        user_id: Uuid,
        value: VoteValue,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let (table, column) = rating_table(subject);
        let sql = format!(
            "INSERT INTO {table} ({column}, user_id, value, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT ({column}, user_id) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at"
        );
        sqlx::query(&sql)
            .bind(subject.id())
            .bind(user_id)
            .bind(value.as_i64() as i16)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_rating(&self, subject: Subject, user_id: Uuid) -> DomainResult<bool> {
        let (table, column) = rating_table(subject);
        let sql = format!("DELETE FROM {table} WHERE {column} = $1 AND user_id = $2");
        let done = sqlx::query(&sql)
            .bind(subject.id())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(done.rows_affected() > 0)
    }

    async fn score(&self, subject: Subject) -> DomainResult<i64> {
        let (table, column) = rating_table(subject);
        let sql = format!(
            "SELECT COALESCE(SUM(value), 0)::BIGINT AS score FROM {table} WHERE {column} = $1"
        );
        sqlx::query(&sql)
            .bind(subject.id())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get("score")
            .map_err(db_err)
    }

    async fn vote_of(&self, subject: Subject, user_id: Uuid) -> DomainResult<Option<VoteValue>> {
        let (table, column) = rating_table(subject);
        let sql = format!("SELECT value FROM {table} WHERE {column} = $1 AND user_id = $2");
        let Some(row) = sqlx::query(&sql)
            .bind(subject.id())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let raw: i16 = row.try_get("value").map_err(db_err)?;
        VoteValue::try_from(i64::from(raw))
            .map(Some)
            .map_err(|_| DomainError::Internal(format!("stored rating {raw} out of range")))
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notification(
        &self,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> DomainResult<Notification> {
        let sql = format!(
            "INSERT INTO notifications (id, user_id, kind, payload, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {NOTIFICATION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::now_v7())
            .bind(new.user_id)
            .bind(new.kind.as_str())
            .bind(new.payload)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        notification_row(&row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> DomainResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL) \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(notification_row)
            .collect()
    }

    async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Notification>> {
        let sql = format!(
            "UPDATE notifications SET read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND user_id = $2 RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| notification_row(&row))
            .transpose()
    }
}
