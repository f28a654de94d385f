use std::sync::Arc;

use crate::assets::AssetStore;
use crate::completion::Completer;
use crate::forms::FormStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion backend. Production: `CompletionClient`.
    pub completer: Arc<dyn Completer>,
    pub forms: Arc<FormStore>,
    pub assets: AssetStore,
}
