// Item endpoints
use axum::{
    extract::Path,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::Item;
use crate::error::ApiError;
use crate::middleware::auth::{require_admin, require_fresh, AuthUser};
use crate::services::catalog::CatalogService;

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub price: f64,
    pub store_id: i32,
}

/// GET /item - List all items (token required)
pub async fn list(_auth: AuthUser) -> Result<Json<Vec<Item>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).list_items().await?))
}

/// GET /item/:id (token required)
pub async fn get(_auth: AuthUser, Path(item_id): Path<i32>) -> Result<Json<Item>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).get_item(item_id).await?))
}

/// POST /item - Create an item in a store (fresh token required)
pub async fn create(
    auth: AuthUser,
    Json(payload): Json<ItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    require_fresh(&auth)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Item name is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let item = CatalogService::new(pool)
        .create_item(payload.name.trim(), payload.price, payload.store_id)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /item/:id - Upsert: replace every field of an existing item, or
/// create one under the requested id (fresh token required). 200 on
/// replace, 201 on create.
pub async fn put(
    auth: AuthUser,
    Path(item_id): Path<i32>,
    Json(payload): Json<ItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    require_fresh(&auth)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Item name is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let (item, created) = CatalogService::new(pool)
        .replace_or_create_item(item_id, payload.name.trim(), payload.price, payload.store_id)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)))
}

/// DELETE /item/:id (fresh admin token required)
pub async fn delete(auth: AuthUser, Path(item_id): Path<i32>) -> Result<Json<Value>, ApiError> {
    require_fresh(&auth)?;
    require_admin(&auth)?;

    let pool = DatabaseManager::pool().await?;
    CatalogService::new(pool).delete_item(item_id).await?;
    Ok(Json(json!({ "message": "Item deleted." })))
}
