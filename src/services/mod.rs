pub mod generation;
pub mod history_store;
pub mod preferences;
