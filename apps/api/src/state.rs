use std::sync::Arc;

use crate::config::Config;
use crate::intent::IntentService;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Intent classification and extraction. `LlmIntentService` in production.
    pub intents: Arc<dyn IntentService>,
    pub config: Config,
}
