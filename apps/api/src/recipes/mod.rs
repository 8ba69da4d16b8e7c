pub mod handlers;
pub mod normalize;
pub mod pantry;
pub mod search;
