use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use domains::VoteTally;
use services::Action;

use crate::dto::{BodyRequest, EditDto, PostDto};
use crate::error::ApiError;
use crate::extract::{parse_id, ApiBody, CurrentPrincipal};
use crate::state::AppState;

pub async fn list_posts(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(slug): Path<String>,
) -> Result<Json<Vec<PostDto>>, ApiError> {
    let posts = state.services.posts.list(&principal, &slug).await?;
    let renderer = state.renderer.as_ref();
    Ok(Json(
        posts.into_iter().map(|view| PostDto::new(view, renderer)).collect(),
    ))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(slug): Path<String>,
    body: ApiBody,
) -> Result<impl IntoResponse, ApiError> {
    let req: BodyRequest = body.decode_for(&principal, Action::Create)?;
    let view = state.services.posts.create(&principal, &slug, req.body).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostDto::new(view, state.renderer.as_ref())),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<PostDto>, ApiError> {
    let id = parse_id(&id, "post")?;
    let view = state.services.posts.get(&principal, &slug, id).await?;
    Ok(Json(PostDto::new(view, state.renderer.as_ref())))
}

pub async fn update_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
    body: ApiBody,
) -> Result<Json<PostDto>, ApiError> {
    let req: BodyRequest = body.decode_for(&principal, Action::Edit)?;
    let id = parse_id(&id, "post")?;
    let view = state
        .services
        .posts
        .update(&principal, &slug, id, req.body)
        .await?;
    Ok(Json(PostDto::new(view, state.renderer.as_ref())))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "post")?;
    state.services.posts.delete(&principal, &slug, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body `{"value": 1 | -1}`; the value is checked after the gate.
pub async fn rate_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
    body: ApiBody,
) -> Result<Json<VoteTally>, ApiError> {
    let req: Value = body.decode_for(&principal, Action::Vote)?;
    let id = parse_id(&id, "post")?;
    let value = req.get("value").cloned().unwrap_or(Value::Null);
    let tally = state
        .services
        .posts
        .vote(&principal, &slug, id, &value)
        .await?;
    Ok(Json(tally))
}

pub async fn unrate_post(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<VoteTally>, ApiError> {
    let id = parse_id(&id, "post")?;
    let tally = state.services.posts.unvote(&principal, &slug, id).await?;
    Ok(Json(tally))
}

pub async fn post_history(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Vec<EditDto>>, ApiError> {
    let id = parse_id(&id, "post")?;
    let history = state.services.posts.history(&principal, &slug, id).await?;
    Ok(Json(history.into_iter().map(EditDto::from).collect()))
}
