use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use domains::Page;
use services::{Action, CreateThread, UpdateThread};

use crate::dto::{CreateThreadRequest, PageQuery, ThreadDto, UpdateThreadRequest};
use crate::error::ApiError;
use crate::extract::{ApiBody, CurrentPrincipal};
use crate::state::AppState;

pub async fn list_threads(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ThreadDto>>, ApiError> {
    let threads = state
        .services
        .threads
        .list(&principal, Page::new(query.limit, query.offset))
        .await?;
    Ok(Json(threads.into_iter().map(ThreadDto::from).collect()))
}

pub async fn create_thread(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: ApiBody,
) -> Result<impl IntoResponse, ApiError> {
    let req: CreateThreadRequest = body.decode_for(&principal, Action::Create)?;
    let view = state
        .services
        .threads
        .create(
            &principal,
            CreateThread {
                title: req.title,
                slug: req.slug,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ThreadDto::from(view))))
}

pub async fn get_thread(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(slug): Path<String>,
) -> Result<Json<ThreadDto>, ApiError> {
    let view = state.services.threads.get(&principal, &slug).await?;
    Ok(Json(view.into()))
}

pub async fn update_thread(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(slug): Path<String>,
    body: ApiBody,
) -> Result<Json<ThreadDto>, ApiError> {
    let req: UpdateThreadRequest = body.decode_for(&principal, Action::Edit)?;
    let view = state
        .services
        .threads
        .update(&principal, &slug, UpdateThread { title: req.title })
        .await?;
    Ok(Json(view.into()))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.services.threads.delete(&principal, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
