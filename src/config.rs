use serde::Deserialize;

pub const DEFAULT_DATABASE_FILE_NAME: &str = "FunBoxAIDatabase.db";
pub const DEFAULT_HISTORY_LIST_LIMIT: i64 = 100;
pub const DEFAULT_TEMPLATE_INDEX_MIN: i64 = 1;
pub const DEFAULT_TEMPLATE_INDEX_MAX: i64 = 5;

/// Tunables for the persistence core. Every field has a default, so a
/// partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_file_name: String,
    pub history_list_limit: i64,
    pub template_index_min: i64,
    pub template_index_max: i64,
    pub preferences_file_name: String,
    pub api_key_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file_name: DEFAULT_DATABASE_FILE_NAME.to_string(),
            history_list_limit: DEFAULT_HISTORY_LIST_LIMIT,
            template_index_min: DEFAULT_TEMPLATE_INDEX_MIN,
            template_index_max: DEFAULT_TEMPLATE_INDEX_MAX,
            preferences_file_name: "preferences.json".to_string(),
            api_key_file_name: "api_key".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = AppConfig::from_json_str(r#"{ "history_list_limit": 25 }"#).expect("parse");
        assert_eq!(config.history_list_limit, 25);
        assert_eq!(config.database_file_name, DEFAULT_DATABASE_FILE_NAME);
        assert_eq!(config.template_index_max, 5);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(AppConfig::from_json_str(r#"{ "history_list_limit": "lots" }"#).is_err());
    }
}
