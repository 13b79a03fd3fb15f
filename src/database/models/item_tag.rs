use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the item/tag join relation, with names resolved for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagItemPair {
    pub item_id: i32,
    pub item_name: String,
    pub tag_id: i32,
    pub tag_name: String,
}
