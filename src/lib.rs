pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod utils;

use std::path::Path;

use tracing_subscriber::EnvFilter;

pub use commands::AppState;
pub use config::AppConfig;
pub use db::{ContentKind, Database, DbError, HistoryDraft, HistoryItem, HistoryPage, SchemaState};
pub use error::{AppError, AppResult};
pub use services::history_store::HistoryStore;

/// Installs the process-wide log subscriber. `RUST_LOG` overrides the
/// default `info` level; calling it again is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

/// App startup: logging, then the history database under `data_dir`.
pub async fn run(data_dir: &Path, config: AppConfig) -> AppState {
    init_tracing();
    AppState::bootstrap(data_dir, config).await
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn run_starts_with_history_ready() {
        let dir = env::temp_dir().join(format!("funbox-run-{}", Uuid::new_v4()));
        init_tracing();
        let state = run(&dir, AppConfig::default()).await;
        assert!(state.history_available());
        assert_eq!(state.history.database().state(), SchemaState::Ready);
        assert_eq!(state.history.list_limit(), 100);

        let _ = fs::remove_dir_all(&dir);
    }
}
