//! Admin menu editing.

use axum::{Json, extract::State};

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::MenuItem;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// `GET /api/admin/menu`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.menu().load().await?))
}

/// `POST /api/admin/menu`
pub async fn add(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(item): ApiJson<MenuItem>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.menu().add(item).await?))
}

/// `PUT /api/admin/menu/{index}`
pub async fn replace(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(index): ApiPath<usize>,
    ApiJson(item): ApiJson<MenuItem>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.menu().replace(index, item).await?))
}

/// `DELETE /api/admin/menu/{index}`
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(index): ApiPath<usize>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.menu().remove(index).await?))
}
