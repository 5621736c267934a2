use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::db::{ContentKind, DbError, HistoryDraft};
use crate::error::AppResult;
use crate::services::history_store::HistoryStore;

/// Markers the generation client puts in captions when it falls back to a
/// friendly failure message instead of real content.
const ERROR_MARKERS: [&str; 19] = [
    "Oops! Something went wrong",
    "Failed to process AI response",
    "API key not configured",
    "Network error",
    "API quota exceeded",
    "Failed to parse AI response",
    "Please check your API key",
    "Please try again later",
    "Failed to generate",
    "Error:",
    "❌",
    "🚨",
    "💥",
    "😅",
    "🔄",
    "🔑",
    "🌐",
    "⏳",
    "📝",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: Option<ContentKind>,
    pub prompt: Option<String>,
    pub sub_category: Option<String>,
    pub image_base64: Option<String>,
}

impl GenerationRequest {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }

    fn kind(&self) -> ContentKind {
        self.kind.unwrap_or(ContentKind::Unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub caption: String,
    pub template_index: i64,
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Remote content generator. Implementations own the network protocol,
/// credentials and retries.
pub trait GenerationClient: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = AppResult<GenerationResult>> + Send;
}

#[derive(Debug)]
pub struct GenerationOutcome {
    pub result: GenerationResult,
    pub saved: bool,
    pub save_error: Option<DbError>,
}

pub fn is_error_response(caption: &str) -> bool {
    caption.trim().is_empty() || ERROR_MARKERS.iter().any(|marker| caption.contains(marker))
}

/// Clamps into the configured template range; zero or missing picks the
/// first template.
pub fn clamp_template_index(value: i64, config: &AppConfig) -> i64 {
    let min = config.template_index_min;
    let max = config.template_index_max.max(min);
    if value == 0 {
        return min;
    }
    value.clamp(min, max)
}

/// Couples a generation client with the history store: generated content is
/// always returned, and only accepted results are persisted.
pub struct HistoryRecorder<C> {
    client: C,
    history: HistoryStore,
    config: AppConfig,
}

impl<C: GenerationClient> HistoryRecorder<C> {
    pub fn new(client: C, history: HistoryStore, config: AppConfig) -> Self {
        Self {
            client,
            history,
            config,
        }
    }

    pub async fn generate_and_record(
        &self,
        request: GenerationRequest,
    ) -> AppResult<GenerationOutcome> {
        let mut result = self.client.generate(&request).await?;
        result.template_index = clamp_template_index(result.template_index, &self.config);
        if result.kind == ContentKind::Unknown {
            result.kind = request.kind();
        }

        if is_error_response(&result.caption) {
            debug!(kind = %result.kind, "generation returned an error caption, not saving");
            return Ok(GenerationOutcome {
                result,
                saved: false,
                save_error: None,
            });
        }

        let mut draft = HistoryDraft::new(result.kind, result.caption.clone())
            .with_template_index(result.template_index);
        if let Some(sub_category) = request.sub_category.clone() {
            draft = draft.with_sub_category(sub_category);
        }
        if let Some(image) = result.image_data.clone().or(request.image_base64) {
            draft = draft.with_image_data(image);
        }

        match self.history.save(draft).await {
            Ok(()) => Ok(GenerationOutcome {
                result,
                saved: true,
                save_error: None,
            }),
            Err(err) => {
                warn!("generated {} but failed to save it: {err}", result.kind);
                Ok(GenerationOutcome {
                    result,
                    saved: false,
                    save_error: Some(err),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::db::Database;
    use crate::error::AppError;

    struct ScriptedClient {
        caption: String,
        template_index: i64,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedClient {
        fn new(caption: &str, template_index: i64) -> Self {
            Self {
                caption: caption.to_string(),
                template_index,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerationClient for ScriptedClient {
        async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResult> {
            self.seen.lock().expect("seen lock").push(request.clone());
            Ok(GenerationResult {
                kind: request.kind(),
                caption: self.caption.clone(),
                template_index: self.template_index,
                image_data: None,
            })
        }
    }

    struct FailingClient;

    impl GenerationClient for FailingClient {
        async fn generate(&self, _request: &GenerationRequest) -> AppResult<GenerationResult> {
            Err(AppError::Generation("offline".to_string()))
        }
    }

    fn ready_store() -> HistoryStore {
        let db = Arc::new(Database::in_memory());
        db.initialize().expect("db init");
        HistoryStore::new(db, &AppConfig::default())
    }

    #[test]
    fn detects_error_captions() {
        assert!(is_error_response(""));
        assert!(is_error_response("Oops! Something went wrong 😅"));
        assert!(is_error_response("Error: quota"));
        assert!(!is_error_response("Why don't skeletons fight? They lack the guts."));
    }

    #[test]
    fn clamps_template_index_into_range() {
        let config = AppConfig::default();
        assert_eq!(clamp_template_index(0, &config), 1);
        assert_eq!(clamp_template_index(-4, &config), 1);
        assert_eq!(clamp_template_index(3, &config), 3);
        assert_eq!(clamp_template_index(42, &config), 5);
    }

    #[tokio::test]
    async fn accepted_result_is_saved_with_sub_category() {
        let store = ready_store();
        let recorder = HistoryRecorder::new(
            ScriptedClient::new("I'm reading a book on anti-gravity.", 9),
            store.clone(),
            AppConfig::default(),
        );

        let outcome = recorder
            .generate_and_record(GenerationRequest::new(ContentKind::Joke).with_sub_category("dad"))
            .await
            .expect("generate");
        assert!(outcome.saved);
        assert_eq!(outcome.result.template_index, 5);

        let items = store.list().await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ContentKind::Joke);
        assert_eq!(items[0].sub_category.as_deref(), Some("dad"));
        assert_eq!(items[0].template_index, 5);
    }

    #[tokio::test]
    async fn error_caption_is_returned_but_not_saved() {
        let store = ready_store();
        let client = ScriptedClient::new("Oops! Something went wrong 😅", 1);
        let recorder = HistoryRecorder::new(client, store.clone(), AppConfig::default());

        let outcome = recorder
            .generate_and_record(GenerationRequest::new(ContentKind::Riddle))
            .await
            .expect("generate");
        assert!(!outcome.saved);
        assert!(outcome.save_error.is_none());
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_generated_content() {
        let store = HistoryStore::new(Arc::new(Database::in_memory()), &AppConfig::default());
        let recorder = HistoryRecorder::new(
            ScriptedClient::new("Honey never spoils.", 2),
            store,
            AppConfig::default(),
        );

        let outcome = recorder
            .generate_and_record(GenerationRequest::new(ContentKind::Fact))
            .await
            .expect("generate");
        assert_eq!(outcome.result.caption, "Honey never spoils.");
        assert!(!outcome.saved);
        assert!(matches!(
            outcome.save_error,
            Some(DbError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn uploaded_meme_image_is_kept_in_history() {
        let store = ready_store();
        let recorder = HistoryRecorder::new(
            ScriptedClient::new("Me after one line of CSS", 4),
            store.clone(),
            AppConfig::default(),
        );

        recorder
            .generate_and_record(GenerationRequest::new(ContentKind::Meme).with_image("aGVsbG8="))
            .await
            .expect("generate");
        let items = store.list().await.expect("list");
        assert_eq!(items[0].image_data.as_deref(), Some("aGVsbG8="));
    }

    #[tokio::test]
    async fn client_failure_propagates() {
        let recorder = HistoryRecorder::new(FailingClient, ready_store(), AppConfig::default());
        let result = recorder
            .generate_and_record(GenerationRequest::new(ContentKind::Story))
            .await;
        assert!(matches!(result, Err(AppError::Generation(_))));
    }
}
