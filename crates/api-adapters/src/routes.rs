use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, comments, posts, threads, users};
use crate::middleware::{block_banned, resolve_principal, track_metrics};
use crate::state::AppState;

/// The full HTTP surface. Layers run outermost first: tracing, metrics,
/// principal resolution, then the ban block.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/threads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route(
            "/threads/{slug}",
            get(threads::get_thread)
                .patch(threads::update_thread)
                .delete(threads::delete_thread),
        )
        .route(
            "/threads/{slug}/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/threads/{slug}/posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/threads/{slug}/posts/{id}/rate",
            post(posts::rate_post).delete(posts::unrate_post),
        )
        .route("/threads/{slug}/posts/{id}/history", get(posts::post_history))
        .route("/users/{username}/profile", get(users::get_profile))
        .route(
            "/me/profile",
            get(users::my_profile).patch(users::update_my_profile),
        )
        .route(
            "/users/{username}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/users/{username}/comments/{id}",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/users/{username}/comments/{id}/rate",
            post(comments::rate_comment).delete(comments::unrate_comment),
        )
        .route(
            "/users/{username}/comments/{id}/history",
            get(comments::comment_history),
        )
        .route("/users/{username}/moderation", patch(users::set_moderation))
        .route("/notifications", get(users::list_notifications))
        .route(
            "/notifications/{id}/read",
            post(users::mark_notification_read),
        )
        .route("/banned", get(users::ban_notice));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(from_fn(block_banned))
        .layer(from_fn_with_state(state.clone(), resolve_principal))
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
