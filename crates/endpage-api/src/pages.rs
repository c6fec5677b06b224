use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use endpage_store::StoreError;
use endpage_types::api::{Claims, CreatePageRequest, PageResponse, UpdatePageRequest};
use endpage_types::models::Page;

use crate::AppState;
use crate::error::ApiError;

/// The creator id always comes from the token, never from the body.
pub async fn create_page(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for (field, value) in [
        ("creatorName", &req.creator_name),
        ("reasonOfLeaving", &req.reason_of_leaving),
        ("themeName", &req.theme_name),
        ("creatorMessage", &req.creator_message),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field} is required")));
        }
    }

    let page = Page {
        id: Uuid::new_v4(),
        creator_name: req.creator_name,
        creator_id: claims.sub,
        reason_of_leaving: req.reason_of_leaving,
        theme_name: req.theme_name,
        custom_theme: req.custom_theme,
        creator_message: req.creator_message,
        images: req.images,
        gifs: req.gifs,
        videos: req.videos,
        liked_by: Vec::new(),
        created_at: chrono::Utc::now(),
    };

    let page = state.pages.insert(page).await?;
    Ok((StatusCode::CREATED, Json(PageResponse::from(page))))
}

pub async fn list_pages(
    State(state): State<AppState>,
) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.pages.list().await?;
    Ok(Json(pages.into_iter().map(PageResponse::from).collect()))
}

pub async fn top_liked(
    State(state): State<AppState>,
    Path(n): Path<String>,
) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let n: usize = n
        .parse()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| ApiError::BadRequest("invalid number parameter".into()))?;

    let pages = state.pages.top_liked(n).await?;
    Ok(Json(pages.into_iter().map(PageResponse::from).collect()))
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("page not found"))?;
    Ok(Json(page.into()))
}

/// Ownership is checked against the stored creator id; the creator id is
/// immutable, so the check cannot go stale between read and write.
pub async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePageRequest>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("page not found"))?;
    if page.creator_id != claims.sub {
        return Err(ApiError::Forbidden("only the creator can edit this page"));
    }

    let updated = state
        .pages
        .update(id, |page| {
            if let Some(v) = req.creator_name {
                page.creator_name = v;
            }
            if let Some(v) = req.reason_of_leaving {
                page.reason_of_leaving = v;
            }
            if let Some(v) = req.theme_name {
                page.theme_name = v;
            }
            if let Some(v) = req.custom_theme {
                page.custom_theme = Some(v);
            }
            if let Some(v) = req.creator_message {
                page.creator_message = v;
            }
            if let Some(v) = req.images {
                page.images = v;
            }
            if let Some(v) = req.gifs {
                page.gifs = v;
            }
            if let Some(v) = req.videos {
                page.videos = v;
            }
        })
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("page not found"),
            e => e.into(),
        })?;

    Ok(Json(updated.into()))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let page = state
        .pages
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("page not found"))?;
    if page.creator_id != claims.sub {
        return Err(ApiError::Forbidden("only the creator can delete this page"));
    }

    state.pages.delete(id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("page not found"),
        e => e.into(),
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Liking requires authentication but not ownership.
pub async fn like_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .add_like(id, claims.sub)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("page not found"),
            StoreError::Conflict => ApiError::Conflict("page already liked"),
            e => e.into(),
        })?;
    Ok(Json(page.into()))
}

pub async fn unlike_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .remove_like(id, claims.sub)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("page not found"),
            StoreError::Conflict => ApiError::Conflict("no like to remove"),
            e => e.into(),
        })?;
    Ok(Json(page.into()))
}
