//! Interaction ledger over the stored document.
//!
//! Every operation follows the same shape: load the document, find the record by id,
//! apply the rule, save the document.

use std::sync::Arc;

use serde_json::Map;

use crate::errors::AppError;
use crate::ids::IdGenerator;
use crate::models::{
    Comment, Document, FileRecord, NewFile, Snippet, MAX_BODY_CHARS, MAX_TITLE_CHARS,
};
use crate::storage::{BlobRemoval, BlobStore};

/// The two record collections in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Kode,
    Files,
}

impl Collection {
    /// Path segment used in share URLs.
    pub fn segment(&self) -> &'static str {
        match self {
            Collection::Kode => "kode",
            Collection::Files => "files",
        }
    }

    fn not_found(&self, id: i64) -> AppError {
        match self {
            Collection::Kode => AppError::NotFound(format!("Snippet {} not found", id)),
            Collection::Files => AppError::NotFound(format!("File {} not found", id)),
        }
    }
}

/// Repository for snippets, files and their likes, copies, downloads and comments.
pub struct Repository {
    store: Arc<super::DocumentStore>,
    blobs: BlobStore,
    ids: IdGenerator,
}

impl Repository {
    /// Build the repository, seeding the id generator past every id already stored.
    pub async fn open(store: Arc<super::DocumentStore>, blobs: BlobStore) -> Result<Self, AppError> {
        let floor = store.read(|doc| Ok(doc.max_id())).await?;
        Ok(Self {
            store,
            blobs,
            ids: IdGenerator::seeded(floor),
        })
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    // ==================== SNIPPET OPERATIONS ====================

    /// List all snippets in stored order.
    pub async fn list_snippets(&self) -> Result<Vec<Snippet>, AppError> {
        self.store.read(|doc| Ok(doc.kode.clone())).await
    }

    /// Get a snippet by id.
    pub async fn get_snippet(&self, id: i64) -> Result<Snippet, AppError> {
        self.store
            .read(|doc| {
                doc.snippet(id)
                    .cloned()
                    .ok_or_else(|| Collection::Kode.not_found(id))
            })
            .await
    }

    /// Get a snippet only if both id and slug match.
    pub async fn get_snippet_by_slug(&self, id: i64, slug: &str) -> Result<Snippet, AppError> {
        let snippet = self.get_snippet(id).await?;
        if snippet.slug() != slug {
            return Err(Collection::Kode.not_found(id));
        }
        Ok(snippet)
    }

    /// Create a new snippet with zeroed counters.
    pub async fn create_snippet(&self, judul: &str, kode: &str) -> Result<Snippet, AppError> {
        let judul = require_text("judul", judul, MAX_TITLE_CHARS)?;
        let kode = require_text("kode", kode, MAX_BODY_CHARS)?;

        self.store
            .mutate(|doc| {
                let snippet = Snippet::new(self.ids.next_id(), judul, kode);
                doc.kode.push(snippet.clone());
                Ok(snippet)
            })
            .await
    }

    /// Delete a snippet.
    pub async fn delete_snippet(&self, id: i64) -> Result<(), AppError> {
        self.store
            .mutate(|doc| {
                let index = doc
                    .kode
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or_else(|| Collection::Kode.not_found(id))?;
                doc.kode.remove(index);
                Ok(())
            })
            .await
    }

    /// Record a copy by `client`; each client counts once.
    pub async fn record_copy(&self, id: i64, client: &str) -> Result<u64, AppError> {
        self.store
            .mutate(|doc| {
                let snippet = doc
                    .snippet_mut(id)
                    .ok_or_else(|| Collection::Kode.not_found(id))?;
                if snippet.copied_by.iter().any(|c| c == client) {
                    return Err(AppError::AlreadyDone(
                        "You have already copied this snippet".to_string(),
                    ));
                }
                snippet.copy_count += 1;
                snippet.copied_by.push(client.to_string());
                Ok(snippet.copy_count)
            })
            .await
    }

    /// Append a comment to a snippet.
    pub async fn add_comment(
        &self,
        snippet_id: i64,
        author: &str,
        text: &str,
    ) -> Result<Comment, AppError> {
        let author = require_text("author", author, MAX_TITLE_CHARS)?;
        let text = require_text("text", text, MAX_BODY_CHARS)?;

        self.store
            .mutate(|doc| {
                let snippet = doc
                    .snippet_mut(snippet_id)
                    .ok_or_else(|| Collection::Kode.not_found(snippet_id))?;
                let id = self.ids.next_id();
                let comment = Comment {
                    id,
                    author,
                    text,
                    timestamp: id,
                    extra: Map::new(),
                };
                snippet.comments.push(comment.clone());
                Ok(comment)
            })
            .await
    }

    /// List a snippet's comments in the order they were added.
    pub async fn list_comments(&self, snippet_id: i64) -> Result<Vec<Comment>, AppError> {
        self.store
            .read(|doc| {
                doc.snippet(snippet_id)
                    .map(|s| s.comments.clone())
                    .ok_or_else(|| Collection::Kode.not_found(snippet_id))
            })
            .await
    }

    // ==================== FILE OPERATIONS ====================

    /// List all file records in stored order.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>, AppError> {
        self.store.read(|doc| Ok(doc.files.clone())).await
    }

    /// Get a file record by id.
    pub async fn get_file(&self, id: i64) -> Result<FileRecord, AppError> {
        self.store
            .read(|doc| {
                doc.file(id)
                    .cloned()
                    .ok_or_else(|| Collection::Files.not_found(id))
            })
            .await
    }

    /// Get a file record only if both id and slug match.
    pub async fn get_file_by_slug(&self, id: i64, slug: &str) -> Result<FileRecord, AppError> {
        let file = self.get_file(id).await?;
        if file.slug() != slug {
            return Err(Collection::Files.not_found(id));
        }
        Ok(file)
    }

    /// Record an already stored upload.
    pub async fn create_file(&self, upload: NewFile) -> Result<FileRecord, AppError> {
        self.store
            .mutate(|doc| {
                let record = upload.into_record(self.ids.next_id());
                doc.files.push(record.clone());
                Ok(record)
            })
            .await
    }

    /// Delete a file record, then its blob.
    ///
    /// A blob that is already gone is tolerated; any other blob error is returned after
    /// the record has been removed.
    pub async fn delete_file(&self, id: i64) -> Result<FileRecord, AppError> {
        let removed = self
            .store
            .mutate(|doc| {
                let index = doc
                    .files
                    .iter()
                    .position(|f| f.id == id)
                    .ok_or_else(|| Collection::Files.not_found(id))?;
                Ok(doc.files.remove(index))
            })
            .await?;

        if removed.filename.is_empty() {
            return Ok(removed);
        }
        if self.blobs.remove(&removed.filename).await? == BlobRemoval::AlreadyAbsent {
            tracing::info!("File {} deleted without a stored blob", id);
        }
        Ok(removed)
    }

    /// Count a download. Downloads are not deduplicated by client.
    pub async fn record_download(&self, id: i64) -> Result<u64, AppError> {
        self.store
            .mutate(|doc| {
                let file = doc
                    .file_mut(id)
                    .ok_or_else(|| Collection::Files.not_found(id))?;
                file.download_count += 1;
                Ok(file.download_count)
            })
            .await
    }

    // ==================== SHARED OPERATIONS ====================

    /// Record a like by `client` on a snippet or file; each client counts once.
    pub async fn record_like(
        &self,
        collection: Collection,
        id: i64,
        client: &str,
    ) -> Result<u64, AppError> {
        self.store
            .mutate(|doc| {
                let (likes, liked_by) = ledger_mut(doc, collection, id)?;
                if liked_by.iter().any(|c| c == client) {
                    return Err(AppError::AlreadyDone(match collection {
                        Collection::Kode => "You have already liked this snippet".to_string(),
                        Collection::Files => "You have already liked this file".to_string(),
                    }));
                }
                *likes += 1;
                liked_by.push(client.to_string());
                Ok(*likes)
            })
            .await
    }

    /// Compose `<base_url>/<collection>/<id>/<slug>` for a record.
    pub async fn share_url(
        &self,
        collection: Collection,
        id: i64,
        base_url: &str,
    ) -> Result<String, AppError> {
        let slug = self
            .store
            .read(|doc| {
                let slug = match collection {
                    Collection::Kode => doc.snippet(id).map(Snippet::slug),
                    Collection::Files => doc.file(id).map(FileRecord::slug),
                };
                slug.ok_or_else(|| collection.not_found(id))
            })
            .await?;

        Ok(format!(
            "{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            collection.segment(),
            id,
            slug
        ))
    }
}

/// Borrow the like counter and like set of a record.
fn ledger_mut(
    doc: &mut Document,
    collection: Collection,
    id: i64,
) -> Result<(&mut u64, &mut Vec<String>), AppError> {
    let ledger = match collection {
        Collection::Kode => doc
            .snippet_mut(id)
            .map(|s| (&mut s.likes, &mut s.liked_by)),
        Collection::Files => doc.file_mut(id).map(|f| (&mut f.likes, &mut f.liked_by)),
    };
    ledger.ok_or_else(|| collection.not_found(id))
}

/// Validate a required text field: non-blank and at most `max_chars` characters.
fn require_text(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocumentStore;
    use tempfile::TempDir;

    struct Fixture {
        repo: Repository,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            DocumentStore::open(&dir.path().join("data.json"))
                .await
                .unwrap(),
        );
        let blobs = BlobStore::new(dir.path().join("uploads"));
        let repo = Repository::open(store, blobs).await.unwrap();
        Fixture { repo, _dir: dir }
    }

    async fn upload(repo: &Repository, name: &str, data: &[u8]) -> FileRecord {
        let stored = BlobStore::stored_name(name);
        let size = repo.blobs().save(&stored, data).await.unwrap();
        repo.create_file(NewFile {
            filename: stored.clone(),
            originalname: name.to_string(),
            judul: None,
            path: format!("uploads/{}", stored),
            size,
            mimetype: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_snippet_initializes_ledger() {
        let f = fixture().await;
        let snippet = f.repo.create_snippet("Test", "print(1)").await.unwrap();

        assert_eq!(snippet.timestamp, snippet.id);
        assert_eq!(snippet.copy_count, 0);
        assert_eq!(snippet.likes, 0);
        assert!(snippet.comments.is_empty());
        assert!(snippet.liked_by.is_empty());
        assert!(snippet.copied_by.is_empty());
        assert_eq!(snippet.slug.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_create_snippet_validation() {
        let f = fixture().await;
        assert!(matches!(
            f.repo.create_snippet("", "x").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.repo.create_snippet("title", "   ").await,
            Err(AppError::Validation(_))
        ));
        let long_title = "a".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(
            f.repo.create_snippet(&long_title, "x").await,
            Err(AppError::Validation(_))
        ));
        assert!(f.repo.list_snippets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_unique_for_rapid_creates() {
        let f = fixture().await;
        let mut ids = Vec::new();
        for i in 0..20 {
            ids.push(f.repo.create_snippet(&format!("s{i}"), "x").await.unwrap().id);
        }
        let mut sorted = ids.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_like_is_deduplicated_per_client() {
        let f = fixture().await;
        let id = f.repo.create_snippet("Test", "x").await.unwrap().id;

        assert_eq!(
            f.repo.record_like(Collection::Kode, id, "10.0.0.1").await.unwrap(),
            1
        );
        assert!(matches!(
            f.repo.record_like(Collection::Kode, id, "10.0.0.1").await,
            Err(AppError::AlreadyDone(_))
        ));
        assert_eq!(
            f.repo.record_like(Collection::Kode, id, "10.0.0.2").await.unwrap(),
            2
        );

        let snippet = f.repo.get_snippet(id).await.unwrap();
        assert_eq!(snippet.likes, 2);
        assert_eq!(snippet.likes as usize, snippet.liked_by.len());
    }

    #[tokio::test]
    async fn test_copy_is_deduplicated_per_client() {
        let f = fixture().await;
        let id = f.repo.create_snippet("Test", "x").await.unwrap().id;

        assert_eq!(f.repo.record_copy(id, "a").await.unwrap(), 1);
        assert!(matches!(
            f.repo.record_copy(id, "a").await,
            Err(AppError::AlreadyDone(_))
        ));

        let snippet = f.repo.get_snippet(id).await.unwrap();
        assert_eq!(snippet.copy_count, 1);
        assert_eq!(snippet.copied_by, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let f = fixture().await;
        assert!(matches!(
            f.repo.record_like(Collection::Files, 1, "a").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.repo.record_copy(1, "a").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.repo.list_comments(1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.repo.delete_snippet(1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.repo.share_url(Collection::Kode, 1, "http://h").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_keep_insertion_order() {
        let f = fixture().await;
        let id = f.repo.create_snippet("Test", "x").await.unwrap().id;

        let first = f.repo.add_comment(id, "ana", "first").await.unwrap();
        let second = f.repo.add_comment(id, "budi", "second").await.unwrap();
        assert!(second.id > first.id);

        let comments = f.repo.list_comments(id).await.unwrap();
        assert_eq!(comments, vec![first, second]);

        assert!(matches!(
            f.repo.add_comment(id, "", "text").await,
            Err(AppError::Validation(_))
        ));
        let long_text = "x".repeat(MAX_BODY_CHARS + 1);
        assert!(matches!(
            f.repo.add_comment(id, "ana", &long_text).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(f.repo.list_comments(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_share_url() {
        let f = fixture().await;
        f.repo
            .store
            .mutate(|doc| {
                doc.kode.push(Snippet::new(42, "Hello World!".into(), "x".into()));
                Ok(())
            })
            .await
            .unwrap();

        let url = f
            .repo
            .share_url(Collection::Kode, 42, "http://localhost:3000/")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:3000/kode/42/hello-world");

        assert!(f.repo.get_snippet_by_slug(42, "hello-world").await.is_ok());
        assert!(matches!(
            f.repo.get_snippet_by_slug(42, "other").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_snippet_removes_it() {
        let f = fixture().await;
        let id = f.repo.create_snippet("Test", "x").await.unwrap().id;
        f.repo.delete_snippet(id).await.unwrap();

        assert!(f.repo.list_snippets().await.unwrap().is_empty());
        assert!(matches!(
            f.repo.get_snippet(id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_ledger() {
        let f = fixture().await;
        let file = upload(&f.repo, "Report.txt", b"abc").await;
        assert_eq!(file.size, 3);
        assert_eq!(file.slug.as_deref(), Some("reporttxt"));

        assert_eq!(f.repo.record_download(file.id).await.unwrap(), 1);
        assert_eq!(f.repo.record_download(file.id).await.unwrap(), 2);
        assert_eq!(
            f.repo.record_like(Collection::Files, file.id, "a").await.unwrap(),
            1
        );

        let url = f
            .repo
            .share_url(Collection::Files, file.id, "https://kode.example")
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("https://kode.example/files/{}/reporttxt", file.id)
        );
    }

    #[tokio::test]
    async fn test_delete_file_tolerates_missing_blob() {
        let f = fixture().await;
        let kept = upload(&f.repo, "a.txt", b"a").await;
        let orphan = upload(&f.repo, "b.txt", b"b").await;
        f.repo.blobs().remove(&orphan.filename).await.unwrap();

        f.repo.delete_file(kept.id).await.unwrap();
        assert_eq!(f.repo.blobs().read(&kept.filename).await.unwrap(), None);

        f.repo.delete_file(orphan.id).await.unwrap();
        assert!(f.repo.list_files().await.unwrap().is_empty());
        assert!(matches!(
            f.repo.delete_file(orphan.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let f = fixture().await;
        let id = f.repo.create_snippet("Race", "x").await.unwrap().id;
        let repo = Arc::new(f.repo);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.record_like(Collection::Kode, id, &format!("10.0.0.{i}"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snippet = repo.get_snippet(id).await.unwrap();
        assert_eq!(snippet.likes, 16);
        assert_eq!(snippet.liked_by.len(), 16);
    }

    #[tokio::test]
    async fn test_id_generator_seeded_from_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let far_future = chrono::Utc::now().timestamp_millis() + 3_600_000;
        std::fs::write(
            &path,
            format!(
                r#"{{"kode":[{{"id":{far_future},"judul":"t","kode":"k","timestamp":{far_future}}}],"files":[]}}"#
            ),
        )
        .unwrap();

        let store = Arc::new(DocumentStore::open(&path).await.unwrap());
        let repo = Repository::open(store, BlobStore::new(dir.path().join("uploads")))
            .await
            .unwrap();
        let created = repo.create_snippet("next", "k").await.unwrap();
        assert_eq!(created.id, far_future + 1);

        // Legacy record without ledger fields gains them on first interaction.
        assert_eq!(repo.record_like(Collection::Kode, far_future, "a").await.unwrap(), 1);
    }
}
