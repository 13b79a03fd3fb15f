// Tag endpoints, including the item/tag link relation
use axum::{
    extract::Path,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::{Tag, TagItemPair};
use crate::error::ApiError;
use crate::middleware::auth::{require_admin, require_fresh, AuthUser};
use crate::services::catalog::CatalogService;

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

/// GET /tag - List all tags
pub async fn list() -> Result<Json<Vec<Tag>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).list_tags().await?))
}

/// GET /tag/:id
pub async fn get(Path(tag_id): Path<i32>) -> Result<Json<Tag>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).get_tag(tag_id).await?))
}

/// GET /store/:id/tag - List a store's tags
pub async fn list_for_store(Path(store_id): Path<i32>) -> Result<Json<Vec<Tag>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(
        CatalogService::new(pool).list_tags_for_store(store_id).await?,
    ))
}

/// POST /store/:id/tag - Create a tag in a store (fresh token required)
pub async fn create_in_store(
    auth: AuthUser,
    Path(store_id): Path<i32>,
    Json(payload): Json<TagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    require_fresh(&auth)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Tag name is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let tag = CatalogService::new(pool)
        .create_tag(store_id, payload.name.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// POST /item/:id/tag/:tag_id - Link a tag to an item in the same store
/// (fresh token required). Idempotent.
pub async fn link(
    auth: AuthUser,
    Path((item_id, tag_id)): Path<(i32, i32)>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    require_fresh(&auth)?;

    let pool = DatabaseManager::pool().await?;
    let tag = CatalogService::new(pool).link_tag_item(item_id, tag_id).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// DELETE /item/:id/tag/:tag_id - Remove a tag/item link (fresh token
/// required). No-op-safe when the pair is not linked.
pub async fn unlink(
    auth: AuthUser,
    Path((item_id, tag_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, ApiError> {
    require_fresh(&auth)?;

    let pool = DatabaseManager::pool().await?;
    let (item, tag) = CatalogService::new(pool)
        .unlink_tag_item(item_id, tag_id)
        .await?;
    Ok(Json(json!({
        "message": "Tag removed from item",
        "item": item,
        "tag": tag,
    })))
}

/// DELETE /tag/:id - Delete a tag with no linked items (fresh admin token
/// required)
pub async fn delete(
    auth: AuthUser,
    Path(tag_id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_fresh(&auth)?;
    require_admin(&auth)?;

    let pool = DatabaseManager::pool().await?;
    CatalogService::new(pool).delete_tag(tag_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Tag deleted." })),
    ))
}

/// GET /itemtags - List every item/tag pair
pub async fn list_pairs() -> Result<Json<Vec<TagItemPair>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(CatalogService::new(pool).list_item_tag_pairs().await?))
}
