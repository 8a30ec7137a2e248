//! Snippet and comment models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::slug::slugify_or;

/// Maximum length of a snippet title or comment author, in characters.
pub const MAX_TITLE_CHARS: usize = 255;
/// Maximum length of a snippet body or comment text, in characters.
pub const MAX_BODY_CHARS: usize = 65_535;
/// Slug used when a title has no URL-safe characters.
pub const FALLBACK_SNIPPET_SLUG: &str = "kode";

/// A shared code snippet with its engagement ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    #[serde(default)]
    pub judul: String,
    #[serde(default)]
    pub kode: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub copy_count: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub copied_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snippet {
    pub fn new(id: i64, judul: String, kode: String) -> Self {
        let slug = slugify_or(&judul, FALLBACK_SNIPPET_SLUG);
        Self {
            id,
            judul,
            kode,
            timestamp: id,
            copy_count: 0,
            likes: 0,
            comments: Vec::new(),
            liked_by: Vec::new(),
            copied_by: Vec::new(),
            slug: Some(slug),
            extra: Map::new(),
        }
    }

    /// Stored slug, or one derived from the title for records that predate slugs.
    pub fn slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.is_empty() => slug.clone(),
            _ => slugify_or(&self.judul, FALLBACK_SNIPPET_SLUG),
        }
    }
}

/// A comment attached to a snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for creating a new snippet.
///
/// Fields are optional so that a missing field is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSnippetRequest {
    #[serde(default)]
    pub judul: Option<String>,
    #[serde(default)]
    pub kode: Option<String>,
}

/// Request body for adding a comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}
