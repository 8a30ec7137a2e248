//! The persisted root document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{FileRecord, Snippet};

/// The single JSON document holding every snippet and uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub kode: Vec<Snippet>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    /// Top-level keys this service does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn snippet(&self, id: i64) -> Option<&Snippet> {
        self.kode.iter().find(|s| s.id == id)
    }

    pub fn snippet_mut(&mut self, id: i64) -> Option<&mut Snippet> {
        self.kode.iter_mut().find(|s| s.id == id)
    }

    pub fn file(&self, id: i64) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn file_mut(&mut self, id: i64) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    /// Largest id used anywhere in the document, comments included.
    pub fn max_id(&self) -> i64 {
        let snippets = self
            .kode
            .iter()
            .flat_map(|s| std::iter::once(s.id).chain(s.comments.iter().map(|c| c.id)));
        let files = self.files.iter().map(|f| f.id);
        snippets.chain(files).max().unwrap_or(0)
    }
}
