//! Profiles, notifications, moderation and the ban notice.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Map, Value};

use domains::DomainError;
use services::{AccountService, Action};

use crate::dto::{
    BanNoticeDto, ModerationDto, NotificationDto, NotificationQuery, ProfileDto,
    UpdateProfileRequest,
};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiBody, CurrentPrincipal};
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(username): Path<String>,
) -> Result<Json<ProfileDto>, ApiError> {
    let view = state
        .services
        .accounts
        .get_profile(&principal, &username)
        .await?;
    Ok(Json(view.into()))
}

pub async fn my_profile(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ProfileDto>, ApiError> {
    let view = state.services.accounts.my_profile(&principal).await?;
    Ok(Json(view.into()))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: ApiBody,
) -> Result<Json<ProfileDto>, ApiError> {
    let req: UpdateProfileRequest = body.decode_for(&principal, Action::UpdateOwnProfile)?;
    let view = state
        .services
        .accounts
        .update_own_profile(&principal, req.into())
        .await?;
    Ok(Json(view.into()))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationDto>>, ApiError> {
    let found = state
        .services
        .notifications
        .list(&principal, query.unread_only())
        .await?;
    Ok(Json(found.into_iter().map(NotificationDto::from).collect()))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "notification")?;
    state
        .services
        .notifications
        .mark_read(&principal, id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// Body `{silenced_until?, banned_until?}`: Unix seconds to set, null/0/""
/// to clear, absent to keep.
pub async fn set_moderation(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(username): Path<String>,
    body: ApiBody,
) -> Result<Json<ModerationDto>, ApiError> {
    let req: Map<String, Value> = body.decode_for(&principal, Action::Moderate)?;
    let view = state
        .services
        .moderation
        .set_moderation(&principal, &username, &req)
        .await?;
    Ok(Json(view.into()))
}

/// The caller's active ban, for the ban notice page.
pub async fn ban_notice(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<BanNoticeDto>, ApiError> {
    if !principal.is_authenticated() {
        return Err(ApiError(DomainError::Unauthenticated));
    }
    Ok(Json(BanNoticeDto::new(AccountService::active_ban(
        &principal,
        Utc::now(),
    ))))
}
