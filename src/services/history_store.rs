use std::sync::Arc;

use chrono::Utc;

use crate::config::AppConfig;
use crate::db::{Database, DbError, HistoryDraft, HistoryItem, HistoryPage};

/// Async access to the history table. Each call runs its SQLite work on the
/// blocking pool against the shared [`Database`].
#[derive(Clone)]
pub struct HistoryStore {
    db: Arc<Database>,
    list_limit: i64,
}

impl HistoryStore {
    pub fn new(db: Arc<Database>, config: &AppConfig) -> Self {
        Self {
            db,
            list_limit: config.history_list_limit.max(1),
        }
    }

    pub fn list_limit(&self) -> i64 {
        self.list_limit
    }

    /// Shared database owner, for internal maintenance only.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub async fn save(&self, draft: HistoryDraft) -> Result<(), DbError> {
        let item = draft.normalize(Utc::now());
        self.run(move |db| db.insert_history_item(&item).map(|_| ()))
            .await
    }

    pub async fn list(&self) -> Result<Vec<HistoryItem>, DbError> {
        let limit = self.list_limit;
        self.run(move |db| db.list_history(limit)).await
    }

    pub async fn list_page(&self, limit: i64, offset: i64) -> Result<HistoryPage, DbError> {
        self.run(move |db| db.list_history_page(limit, offset)).await
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        self.run(|db| db.count_history()).await
    }

    pub async fn clear(&self) -> Result<usize, DbError> {
        self.run(|db| db.delete_all_history()).await
    }

    async fn run<T, F>(&self, op: F) -> Result<T, DbError>
    where
        F: FnOnce(&Database) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(db.as_ref())).await?
    }
}
