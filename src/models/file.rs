//! Uploaded file model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::slug::slugify_or;

/// Slug used when a file name has no URL-safe characters.
pub const FALLBACK_FILE_SLUG: &str = "file";

/// Metadata for an uploaded file.
///
/// The bytes live in the blob store under `filename`, or inline as base64 in `file` for
/// records written before uploads went to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: i64,
    /// Name of the stored blob
    #[serde(default)]
    pub filename: String,
    /// Name the client uploaded the file under
    #[serde(default)]
    pub originalname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judul: Option<String>,
    /// Relative storage location, e.g. `uploads/<filename>`
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Inline base64 content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileRecord {
    /// Title used for slugs: the optional `judul`, else the original file name.
    pub fn display_name(&self) -> &str {
        match self.judul.as_deref() {
            Some(judul) if !judul.trim().is_empty() => judul,
            _ if !self.originalname.is_empty() => &self.originalname,
            _ => &self.filename,
        }
    }

    /// Name offered to clients when the file is downloaded.
    pub fn download_name(&self) -> &str {
        if self.originalname.is_empty() {
            &self.filename
        } else {
            &self.originalname
        }
    }

    /// Stored slug, or one derived from the display name for older records.
    pub fn slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.is_empty() => slug.clone(),
            _ => slugify_or(self.display_name(), FALLBACK_FILE_SLUG),
        }
    }
}

/// A validated upload ready to be recorded.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub originalname: String,
    pub judul: Option<String>,
    pub path: String,
    pub size: u64,
    pub mimetype: Option<String>,
}

impl NewFile {
    pub fn into_record(self, id: i64) -> FileRecord {
        let mut record = FileRecord {
            id,
            filename: self.filename,
            originalname: self.originalname,
            judul: self.judul,
            path: self.path,
            size: self.size,
            mimetype: self.mimetype,
            file: None,
            timestamp: id,
            likes: 0,
            liked_by: Vec::new(),
            download_count: 0,
            slug: None,
            extra: Map::new(),
        };
        record.slug = Some(slugify_or(record.display_name(), FALLBACK_FILE_SLUG));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(judul: Option<&str>) -> NewFile {
        NewFile {
            filename: "abc-report.pdf".to_string(),
            originalname: "Report Q1.pdf".to_string(),
            judul: judul.map(str::to_string),
            path: "uploads/abc-report.pdf".to_string(),
            size: 12,
            mimetype: Some("application/pdf".to_string()),
        }
    }

    #[test]
    fn test_slug_prefers_title() {
        let record = upload(Some("Quarterly Numbers")).into_record(7);
        assert_eq!(record.slug.as_deref(), Some("quarterly-numbers"));
        assert_eq!(record.timestamp, 7);
    }

    #[test]
    fn test_slug_falls_back_to_original_name() {
        let record = upload(Some("   ")).into_record(7);
        assert_eq!(record.slug(), "report-q1pdf");
    }

    #[test]
    fn test_slug_never_empty() {
        let mut new_file = upload(Some("你好世界"));
        new_file.originalname = "!!!".to_string();
        let record = new_file.into_record(7);
        assert_eq!(record.slug.as_deref(), Some("file"));
        assert_eq!(record.slug(), "file");
    }

    #[test]
    fn test_inline_payload_record_loads() {
        let raw = serde_json::json!({
            "id": 1, "originalname": "a.txt", "file": "aGVsbG8=", "size": 5, "timestamp": 1
        });
        let record: FileRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.filename, "");
        assert_eq!(record.file.as_deref(), Some("aGVsbG8="));
        assert_eq!(record.slug(), "atxt");
        assert_eq!(record.download_name(), "a.txt");
    }
}
