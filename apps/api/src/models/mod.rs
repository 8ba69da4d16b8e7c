pub mod chat;
pub mod grocery;
pub mod inventory;
pub mod recipe;
pub mod user;
