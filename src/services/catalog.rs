use sqlx::PgPool;
use thiserror::Error;

use crate::database::models::{Item, Store, Tag, TagItemPair};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidRelation(String),

    #[error("{0}")]
    HasDependents(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Maintains stores, items, tags and the item/tag join relation.
///
/// Every mutation runs inside a transaction: either the whole operation
/// commits or nothing does. Cross-store and dependent-deletion rules are
/// enforced here rather than left to database constraints.
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- stores ---

    pub async fn create_store(&self, name: &str) -> Result<Store, CatalogError> {
        sqlx::query_as::<_, Store>("INSERT INTO stores (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CatalogError::Conflict(format!("A store named '{}' already exists", name))
                } else {
                    e.into()
                }
            })
    }

    pub async fn get_store(&self, store_id: i32) -> Result<Store, CatalogError> {
        sqlx::query_as::<_, Store>("SELECT id, name FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Store {} not found", store_id)))
    }

    pub async fn list_stores(&self) -> Result<Vec<Store>, CatalogError> {
        Ok(
            sqlx::query_as::<_, Store>("SELECT id, name FROM stores ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Deletes a store and everything it owns. The cascade is explicit:
    /// first the join rows of its items and tags, then items, tags, and
    /// finally the store row, all in one transaction.
    pub async fn delete_store(&self, store_id: i32) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CatalogError::NotFound(format!(
                "Store {} not found",
                store_id
            )));
        }

        sqlx::query(
            "DELETE FROM item_tags WHERE item_id IN (SELECT id FROM items WHERE store_id = $1)",
        )
        .bind(store_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM items WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // --- items ---

    pub async fn create_item(
        &self,
        name: &str,
        price: f64,
        store_id: i32,
    ) -> Result<Item, CatalogError> {
        let mut tx = self.pool.begin().await?;
        Self::require_store(&mut tx, store_id).await?;

        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (name, price, store_id) VALUES ($1, $2, $3) \
             RETURNING id, name, price, store_id",
        )
        .bind(name)
        .bind(price)
        .bind(store_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn get_item(&self, item_id: i32) -> Result<Item, CatalogError> {
        sqlx::query_as::<_, Item>("SELECT id, name, price, store_id FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Item {} not found", item_id)))
    }

    pub async fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(sqlx::query_as::<_, Item>(
            "SELECT id, name, price, store_id FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Upsert: replaces every field of an existing item, or inserts a new
    /// item under the requested id. Returns the item and whether it was
    /// created.
    pub async fn replace_or_create_item(
        &self,
        item_id: i32,
        name: &str,
        price: f64,
        store_id: i32,
    ) -> Result<(Item, bool), CatalogError> {
        let mut tx = self.pool.begin().await?;
        Self::require_store(&mut tx, store_id).await?;

        let updated = sqlx::query_as::<_, Item>(
            "UPDATE items SET name = $2, price = $3, store_id = $4 WHERE id = $1 \
             RETURNING id, name, price, store_id",
        )
        .bind(item_id)
        .bind(name)
        .bind(price)
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (item, created) = match updated {
            Some(item) => (item, false),
            None => {
                let item = sqlx::query_as::<_, Item>(
                    "INSERT INTO items (id, name, price, store_id) VALUES ($1, $2, $3, $4) \
                     RETURNING id, name, price, store_id",
                )
                .bind(item_id)
                .bind(name)
                .bind(price)
                .bind(store_id)
                .fetch_one(&mut *tx)
                .await?;

                // The explicit id bypasses the serial sequence; keep the
                // sequence ahead of it so later inserts don't collide on
                // the primary key.
                sqlx::query(
                    "SELECT setval(pg_get_serial_sequence('items', 'id'), \
                     (SELECT MAX(id) FROM items))",
                )
                .execute(&mut *tx)
                .await?;

                (item, true)
            }
        };

        tx.commit().await?;
        Ok((item, created))
    }

    pub async fn delete_item(&self, item_id: i32) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM item_tags WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!(
                "Item {} not found",
                item_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    // --- tags ---

    pub async fn create_tag(&self, store_id: i32, name: &str) -> Result<Tag, CatalogError> {
        let mut tx = self.pool.begin().await?;
        Self::require_store(&mut tx, store_id).await?;

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, store_id) VALUES ($1, $2) RETURNING id, name, store_id",
        )
        .bind(name)
        .bind(store_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::Conflict(format!(
                    "A tag named '{}' already exists in that store",
                    name
                ))
            } else {
                CatalogError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(tag)
    }

    pub async fn get_tag(&self, tag_id: i32) -> Result<Tag, CatalogError> {
        sqlx::query_as::<_, Tag>("SELECT id, name, store_id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Tag {} not found", tag_id)))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, CatalogError> {
        Ok(
            sqlx::query_as::<_, Tag>("SELECT id, name, store_id FROM tags ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn list_tags_for_store(&self, store_id: i32) -> Result<Vec<Tag>, CatalogError> {
        // 404 on a missing store rather than an empty list
        self.get_store(store_id).await?;
        Ok(sqlx::query_as::<_, Tag>(
            "SELECT id, name, store_id FROM tags WHERE store_id = $1 ORDER BY id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// A tag with linked items cannot be deleted.
    pub async fn delete_tag(&self, tag_id: i32) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CatalogError::NotFound(format!("Tag {} not found", tag_id)));
        }

        let linked: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM item_tags WHERE tag_id = $1")
                .bind(tag_id)
                .fetch_one(&mut *tx)
                .await?;
        if linked > 0 {
            return Err(CatalogError::HasDependents(format!(
                "Tag {} is linked to {} item(s) and cannot be deleted",
                tag_id, linked
            )));
        }

        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // --- item/tag links ---

    /// Links a tag to an item. Idempotent: linking an already-linked pair
    /// is a no-op. The tag and item must belong to the same store.
    pub async fn link_tag_item(&self, item_id: i32, tag_id: i32) -> Result<Tag, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let (item, tag) = Self::require_pair(&mut tx, item_id, tag_id).await?;
        Self::require_same_store(&item, &tag)?;

        sqlx::query("INSERT INTO item_tags (item_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(item_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(tag)
    }

    /// Removes a tag/item link. Safe to call when the pair is not linked.
    pub async fn unlink_tag_item(
        &self,
        item_id: i32,
        tag_id: i32,
    ) -> Result<(Item, Tag), CatalogError> {
        let mut tx = self.pool.begin().await?;
        let (item, tag) = Self::require_pair(&mut tx, item_id, tag_id).await?;
        Self::require_same_store(&item, &tag)?;

        sqlx::query("DELETE FROM item_tags WHERE item_id = $1 AND tag_id = $2")
            .bind(item_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((item, tag))
    }

    pub async fn list_item_tag_pairs(&self) -> Result<Vec<TagItemPair>, CatalogError> {
        Ok(sqlx::query_as::<_, TagItemPair>(
            "SELECT it.item_id, i.name AS item_name, it.tag_id, t.name AS tag_name \
             FROM item_tags it \
             JOIN items i ON i.id = it.item_id \
             JOIN tags t ON t.id = it.tag_id \
             ORDER BY it.item_id, it.tag_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    // --- helpers ---

    async fn require_store(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        store_id: i32,
    ) -> Result<(), CatalogError> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Store {} not found", store_id)))?;
        Ok(())
    }

    async fn require_pair(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        item_id: i32,
        tag_id: i32,
    ) -> Result<(Item, Tag), CatalogError> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, price, store_id FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("Item {} not found", item_id)))?;

        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, store_id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Tag {} not found", tag_id)))?;

        Ok((item, tag))
    }

    fn require_same_store(item: &Item, tag: &Tag) -> Result<(), CatalogError> {
        if item.store_id != tag.store_id {
            return Err(CatalogError::InvalidRelation(format!(
                "Item {} belongs to store {} but tag {} belongs to store {}",
                item.id, item.store_id, tag.id, tag.store_id
            )));
        }
        Ok(())
    }
}
