use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Kind of generated content a history row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Joke,
    Riddle,
    Story,
    Fact,
    Pickup,
    Meme,
    Unknown,
}

impl ContentKind {
    pub const GENERATED: [ContentKind; 6] = [
        ContentKind::Joke,
        ContentKind::Riddle,
        ContentKind::Story,
        ContentKind::Fact,
        ContentKind::Pickup,
        ContentKind::Meme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Joke => "joke",
            ContentKind::Riddle => "riddle",
            ContentKind::Story => "story",
            ContentKind::Fact => "fact",
            ContentKind::Pickup => "pickup",
            ContentKind::Meme => "meme",
            ContentKind::Unknown => "unknown",
        }
    }

    /// Maps any tag onto a kind, substituting `Unknown` for blank or
    /// unrecognised input instead of rejecting it.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(ContentKind::Unknown)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentKind(pub String);

impl fmt::Display for UnknownContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content kind: {}", self.0)
    }
}

impl std::error::Error for UnknownContentKind {}

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "joke" => Ok(ContentKind::Joke),
            "riddle" => Ok(ContentKind::Riddle),
            "story" => Ok(ContentKind::Story),
            "fact" => Ok(ContentKind::Fact),
            "pickup" => Ok(ContentKind::Pickup),
            "meme" => Ok(ContentKind::Meme),
            "unknown" => Ok(ContentKind::Unknown),
            _ => Err(UnknownContentKind(value.to_string())),
        }
    }
}

/// A persisted history row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub sub_category: Option<String>,
    pub content: String,
    pub template_index: i64,
    pub created_at: String,
    pub image_data: Option<String>,
}

/// Loosely filled input from a screen. Every field may be missing; see
/// [`HistoryDraft::normalize`] for the substitutions applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryDraft {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sub_category: Option<String>,
    pub content: Option<String>,
    pub template_index: Option<i64>,
    pub created_at: Option<String>,
    pub image_data: Option<String>,
}

/// A fully defaulted row ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryItem {
    pub kind: ContentKind,
    pub sub_category: Option<String>,
    pub content: String,
    pub template_index: i64,
    pub created_at: String,
    pub image_data: Option<String>,
}

impl HistoryDraft {
    pub fn new(kind: ContentKind, content: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    pub fn with_template_index(mut self, template_index: i64) -> Self {
        self.template_index = Some(template_index);
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn with_image_data(mut self, image_data: impl Into<String>) -> Self {
        self.image_data = Some(image_data.into());
        self
    }

    pub fn normalize(self, now: DateTime<Utc>) -> NewHistoryItem {
        NewHistoryItem {
            kind: self
                .kind
                .as_deref()
                .map(ContentKind::from_tag)
                .unwrap_or(ContentKind::Unknown),
            sub_category: non_empty(self.sub_category),
            content: self.content.unwrap_or_default(),
            template_index: self.template_index.unwrap_or(0),
            created_at: non_empty(self.created_at).unwrap_or_else(|| iso_timestamp(now)),
            image_data: non_empty(self.image_data),
        }
    }
}

/// Formats a timestamp the way JavaScript's `toISOString` does, which keeps
/// lexical order equal to chronological order.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
