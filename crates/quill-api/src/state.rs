use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use quill_db::Database;

use crate::config::AuthConfig;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub auth: AuthConfig,
}

impl AppStateInner {
    pub fn new(db: Database, auth: AuthConfig) -> AppState {
        Arc::new(Self { db, auth })
    }
}

/// Runs a store operation off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("blocking task failed"))
        })?
}
