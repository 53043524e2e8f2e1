//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::Registry;

/// Shared application state
pub struct AppState {
    /// Registry（ルームごとのセッション管理）
    pub registry: Arc<Registry>,
}
