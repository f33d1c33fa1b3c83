//! Cross-cutting request handling: principal resolution, the ban block and
//! response metrics.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use domains::{DenyReason, DomainError, Principal};
use services::AccountService;

use crate::error::ApiError;
use crate::state::AppState;

/// Paths a banned caller can still reach. Entries ending in `/` cover their
/// whole subtree; the others match the exact path or its subpaths.
const BAN_ALLOW_LIST: [&str; 6] = [
    "/api/auth/",
    "/api/banned",
    "/static/",
    "/media/",
    "/health",
    "/metrics",
];

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

fn ban_allowed(path: &str) -> bool {
    BAN_ALLOW_LIST.iter().any(|entry| match path.strip_prefix(entry) {
        Some(rest) => entry.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    })
}

/// Turns the bearer token into a [`Principal`] stored in the request
/// extensions. No header means anonymous; a bad token is a 401.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match bearer_token(request.headers()) {
        None => Principal::Anonymous,
        Some(token) => {
            let resolved = match state.verifier.verify(&token) {
                Ok(user_id) => state.services.accounts.principal_for(user_id).await,
                Err(err) => Err(err),
            };
            match resolved {
                Ok(principal) => principal,
                Err(err) => return ApiError(err).into_response(),
            }
        }
    };
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Refuses every request of a currently banned caller outside the allow-list.
pub async fn block_banned(request: Request, next: Next) -> Response {
    let banned = request
        .extensions()
        .get::<Principal>()
        .and_then(|p| AccountService::active_ban(p, Utc::now()))
        .is_some();
    if banned && !ban_allowed(request.uri().path()) {
        tracing::debug!(path = %request.uri().path(), "blocked banned caller");
        return ApiError(DomainError::Forbidden(DenyReason::Banned)).into_response();
    }
    next.run(request).await
}

pub async fn track_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    state
        .metrics
        .observe_response(&method, response.status().as_u16());
    if let Some(reason) = response.extensions().get::<DenyReason>() {
        state.metrics.observe_denial(reason.as_str());
    }
    response
}
