pub mod auth;
pub mod items;
pub mod stores;
pub mod tags;
