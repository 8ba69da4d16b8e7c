pub mod build;
pub mod handlers;
