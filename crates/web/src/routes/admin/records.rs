//! Generic admin record endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::db::PgRecordStore;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::Record;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::records::RecordService;
use crate::state::AppState;

/// `GET /api/admin/records/{kind}`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(kind): ApiPath<String>,
) -> Result<Json<Vec<Record>>, AppError> {
    let store = PgRecordStore::new(state.pool());
    Ok(Json(RecordService::new(&store).list(&kind).await?))
}

/// `GET /api/admin/records/{kind}/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath((kind, id)): ApiPath<(String, i32)>,
) -> Result<Json<Record>, AppError> {
    let store = PgRecordStore::new(state.pool());
    Ok(Json(RecordService::new(&store).get(&kind, id).await?))
}

/// `PATCH /api/admin/records/{kind}/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath((kind, id)): ApiPath<(String, i32)>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Json<Record>, AppError> {
    let store = PgRecordStore::new(state.pool());
    let record = RecordService::new(&store).update(&kind, id, &body).await?;

    tracing::info!(admin_id = %admin.id, %kind, id, "Admin edited record");
    Ok(Json(record))
}

/// `DELETE /api/admin/records/{kind}/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath((kind, id)): ApiPath<(String, i32)>,
) -> Result<StatusCode, AppError> {
    let store = PgRecordStore::new(state.pool());
    RecordService::new(&store).delete(&kind, id).await?;

    tracing::info!(admin_id = %admin.id, %kind, id, "Admin deleted record");
    Ok(StatusCode::NO_CONTENT)
}
