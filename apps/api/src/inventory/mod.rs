pub mod expiry;
pub mod handlers;
pub mod reconcile;
pub mod sync;
