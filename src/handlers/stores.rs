// Store endpoints
use axum::{
    extract::Path,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Store;
use crate::error::ApiError;
use crate::middleware::auth::{require_admin, require_fresh, AuthUser};
use crate::services::catalog::CatalogService;

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub name: String,
}

/// GET /store - List all stores
pub async fn list() -> Result<Json<Vec<Store>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).list_stores().await?))
}

/// GET /store/:id
pub async fn get(Path(store_id): Path<i32>) -> Result<Json<Store>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).get_store(store_id).await?))
}

/// POST /store - Create a store (fresh token required)
pub async fn create(
    auth: AuthUser,
    Json(payload): Json<StoreRequest>,
) -> Result<(StatusCode, Json<Store>), ApiError> {
    require_fresh(&auth)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Store name is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let store = CatalogService::new(pool)
        .create_store(payload.name.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// DELETE /store/:id - Delete a store and cascade to its items and tags
/// (fresh admin token required)
pub async fn delete(auth: AuthUser, Path(store_id): Path<i32>) -> Result<Json<Value>, ApiError> {
    require_fresh(&auth)?;
    require_admin(&auth)?;

    let pool = DatabaseManager::pool().await?;
    CatalogService::new(pool).delete_store(store_id).await?;
    Ok(Json(json!({ "message": "Store deleted." })))
}
