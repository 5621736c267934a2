use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::{ContentKind, Database, DbError, HistoryDraft, HistoryItem, HistoryPage};
use crate::error::{AppError, AppResult};
use crate::services::history_store::HistoryStore;
use crate::services::preferences::PreferencesStore;
use crate::utils::sub_categories::{sub_categories, SubCategory};

/// Everything the screens share for the lifetime of the process.
pub struct AppState {
    pub config: AppConfig,
    pub history: HistoryStore,
    pub preferences: PreferencesStore,
    /// Set when the history database could not be opened at startup. The
    /// rest of the app keeps working; history calls fail until restart.
    pub startup_error: Option<String>,
}

impl AppState {
    pub async fn bootstrap(data_dir: &Path, config: AppConfig) -> Self {
        let db = Arc::new(Database::in_dir(data_dir, &config));
        let init_db = Arc::clone(&db);
        let startup_error = match tokio::task::spawn_blocking(move || init_db.initialize()).await {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(err) => Some(DbError::from(err).to_string()),
        };
        if let Some(err) = &startup_error {
            warn!("history unavailable, continuing without it: {err}");
        } else {
            info!("app ready");
        }

        Self {
            history: HistoryStore::new(db, &config),
            preferences: PreferencesStore::new(data_dir, &config),
            config,
            startup_error,
        }
    }

    pub fn history_available(&self) -> bool {
        self.startup_error.is_none()
    }

    /// Wipes preferences and history. Both are attempted even when one
    /// fails, so an unavailable history database still leaves the
    /// preferences cleared.
    pub async fn clear_all_data(&self) -> AppResult<usize> {
        let prefs = self.preferences.clear();
        let history = self.history.clear().await;
        match (prefs, history) {
            (Ok(()), Ok(deleted)) => Ok(deleted),
            (Err(err), Ok(_)) => Err(err.into()),
            (Ok(()), Err(err)) => Err(err.into()),
            (Err(prefs_err), Err(history_err)) => Err(AppError::Internal(format!(
                "failed to clear preferences: {prefs_err}; {history_err}"
            ))),
        }
    }
}

pub async fn save_history(state: &AppState, draft: HistoryDraft) -> Result<(), String> {
    state.history.save(draft).await.map_err(|err| err.to_string())
}

pub async fn list_history(state: &AppState) -> Result<Vec<HistoryItem>, String> {
    state.history.list().await.map_err(|err| err.to_string())
}

pub async fn list_history_page(
    state: &AppState,
    limit: i64,
    offset: i64,
) -> Result<HistoryPage, String> {
    state
        .history
        .list_page(limit, offset)
        .await
        .map_err(|err| err.to_string())
}

pub async fn clear_history(state: &AppState) -> Result<usize, String> {
    state.history.clear().await.map_err(|err| err.to_string())
}

pub async fn clear_all_data(state: &AppState) -> Result<usize, String> {
    state.clear_all_data().await.map_err(|err| err.to_string())
}

pub fn sub_categories_for(kind: &str) -> Vec<SubCategory> {
    sub_categories(ContentKind::from_tag(kind)).to_vec()
}
