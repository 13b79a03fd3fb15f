pub mod item;
pub mod item_tag;
pub mod store;
pub mod tag;
pub mod user;

pub use item::Item;
pub use item_tag::TagItemPair;
pub use store::Store;
pub use tag::Tag;
pub use user::User;
