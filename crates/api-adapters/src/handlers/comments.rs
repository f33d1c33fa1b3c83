use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use domains::VoteTally;
use services::Action;

use crate::dto::{BodyRequest, CommentDto, EditDto};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiBody, CurrentPrincipal};
use crate::state::AppState;

pub async fn list_comments(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(username): Path<String>,
) -> Result<Json<Vec<CommentDto>>, ApiError> {
    let comments = state.services.comments.list(&principal, &username).await?;
    let renderer = state.renderer.as_ref();
    Ok(Json(
        comments
            .into_iter()
            .map(|view| CommentDto::new(view, &username, renderer))
            .collect(),
    ))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(username): Path<String>,
    body: ApiBody,
) -> Result<impl IntoResponse, ApiError> {
    let req: BodyRequest = body.decode_for(&principal, Action::Create)?;
    let view = state
        .services
        .comments
        .create(&principal, &username, req.body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentDto::new(view, &username, state.renderer.as_ref())),
    ))
}

pub async fn get_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
) -> Result<Json<CommentDto>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let view = state.services.comments.get(&principal, &username, id).await?;
    Ok(Json(CommentDto::new(view, &username, state.renderer.as_ref())))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
    body: ApiBody,
) -> Result<Json<CommentDto>, ApiError> {
    let req: BodyRequest = body.decode_for(&principal, Action::Edit)?;
    let id = parse_id(&id, "comment")?;
    let view = state
        .services
        .comments
        .update(&principal, &username, id, req.body)
        .await?;
    Ok(Json(CommentDto::new(view, &username, state.renderer.as_ref())))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "comment")?;
    state
        .services
        .comments
        .delete(&principal, &username, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rate_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
    body: ApiBody,
) -> Result<Json<VoteTally>, ApiError> {
    let req: Value = body.decode_for(&principal, Action::Vote)?;
    let id = parse_id(&id, "comment")?;
    let value = req.get("value").cloned().unwrap_or(Value::Null);
    let tally = state
        .services
        .comments
        .vote(&principal, &username, id, &value)
        .await?;
    Ok(Json(tally))
}

pub async fn unrate_comment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
) -> Result<Json<VoteTally>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let tally = state
        .services
        .comments
        .unvote(&principal, &username, id)
        .await?;
    Ok(Json(tally))
}

pub async fn comment_history(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((username, id)): Path<(String, String)>,
) -> Result<Json<Vec<EditDto>>, ApiError> {
    let id = parse_id(&id, "comment")?;
    let history = state
        .services
        .comments
        .history(&principal, &username, id)
        .await?;
    Ok(Json(history.into_iter().map(EditDto::from).collect()))
}
