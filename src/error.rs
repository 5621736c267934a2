use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] crate::db::DbError),
    #[error("preferences error: {0}")]
    Preferences(#[from] crate::services::preferences::PreferencesError),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;
