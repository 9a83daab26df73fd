//! Filesystem backend
//!
//! Serves a directory tree as a flat, `/`-keyed namespace. Listing is
//! re-walked on every page request and filtered past the cursor, which keeps
//! pagination idempotent for a given cursor at the cost of re-reading
//! directory entries. ACL mutations are not supported on this backend.

use crate::error::{Result, StoreSweepError};
use crate::storage::{join_key, ListOptions, ListPage, ObjectMeta, ObjectRef, StorageBackend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Storage backend over a local directory tree.
pub struct FsBackend {
    config_id: String,
    binding_id: String,
    root: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root`.
    pub fn new(
        config_id: impl Into<String>,
        binding_id: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            binding_id: binding_id.into(),
            root: root.into(),
        }
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |p, seg| p.join(seg))
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn config_id(&self) -> &str {
        &self.config_id
    }

    fn binding_id(&self) -> &str {
        &self.binding_id
    }

    async fn list(&self, path: &str, options: &ListOptions) -> Result<ListPage> {
        let root = self.root.clone();
        let prefix = path.trim_matches('/').to_string();
        let options = options.clone();
        let binding = self.describe();

        tokio::task::spawn_blocking(move || {
            list_dir(&root, &prefix, &options)
                .map_err(|e| StoreSweepError::listing(binding, prefix.clone(), e.to_string()))
        })
        .await?
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta> {
        let path = self.key_to_path(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(meta_for(&meta)),
            Ok(_) => Err(StoreSweepError::NotFound(key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreSweepError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreSweepError::io(path, e)),
        }
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.key_to_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreSweepError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreSweepError::io(path, e)),
        }
    }
}

fn meta_for(meta: &std::fs::Metadata) -> ObjectMeta {
    ObjectMeta {
        size: Some(meta.len()),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        etag: None,
        content_type: None,
    }
}

/// Walk one page of `root`/`prefix`, sorted by key, starting past the cursor.
fn list_dir(root: &Path, prefix: &str, options: &ListOptions) -> std::io::Result<ListPage> {
    let base = prefix
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |p, seg| p.join(seg));

    if !base.exists() {
        return Ok(ListPage::default());
    }

    let mut keys: Vec<(String, std::fs::Metadata)> = Vec::new();
    let mut subdirectories: Vec<String> = Vec::new();

    if options.recursive {
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(key) = relative_key(root, entry.path()) {
                keys.push((key, entry.metadata().map_err(std::io::Error::other)?));
            }
        }
    } else {
        for entry in std::fs::read_dir(&base)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                subdirectories.push(join_key(prefix, &name));
            } else if file_type.is_file() {
                keys.push((join_key(prefix, &name), entry.metadata()?));
            }
        }
    }

    keys.sort_by(|a, b| a.0.cmp(&b.0));
    subdirectories.sort();

    // Resume strictly past the cursor key; the walk order is stable so the
    // same cursor always yields the same page.
    let after = options.cursor.as_deref().unwrap_or("");
    let remaining: Vec<_> = keys.into_iter().filter(|(k, _)| k.as_str() > after).collect();

    let has_more = remaining.len() > options.page_size_limit;
    let items: Vec<ObjectRef> = remaining
        .into_iter()
        .take(options.page_size_limit)
        .map(|(key, meta)| ObjectRef {
            meta: meta_for(&meta),
            key,
        })
        .collect();

    let cursor = if has_more {
        items.last().map(|i| i.key.clone())
    } else {
        None
    };

    Ok(ListPage {
        items,
        // Subdirectories are reported once, with the first page.
        subdirectories: if options.cursor.is_none() {
            subdirectories
        } else {
            Vec::new()
        },
        cursor,
    })
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, FsBackend) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bravo").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/c.txt"), b"charlie").unwrap();
        std::fs::write(dir.path().join("docs/d.txt"), b"delta").unwrap();
        let backend = FsBackend::new("test", "files", dir.path());
        (dir, backend)
    }

    #[tokio::test]
    async fn test_shallow_listing_separates_subdirectories() {
        let (_dir, backend) = fixture();
        let page = backend.list("", &ListOptions::default()).await.unwrap();

        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b.txt"]);
        assert_eq!(page.subdirectories, vec!["docs"]);
        assert_eq!(page.continuation(), None);
    }

    #[tokio::test]
    async fn test_recursive_listing_flattens() {
        let (_dir, backend) = fixture();
        let options = ListOptions {
            recursive: true,
            ..ListOptions::default()
        };
        let page = backend.list("", &options).await.unwrap();

        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b.txt", "docs/c.txt", "docs/d.txt"]);
    }

    #[tokio::test]
    async fn test_pagination_visits_every_key_once() {
        let (_dir, backend) = fixture();
        let mut options = ListOptions {
            recursive: true,
            page_size_limit: 3,
            cursor: None,
        };

        let first = backend.list("", &options).await.unwrap();
        assert_eq!(first.items.len(), 3);
        let token = first.continuation().unwrap().to_string();

        options.cursor = Some(token);
        let second = backend.list("", &options).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].key, "docs/d.txt");
        assert_eq!(second.continuation(), None);
    }

    #[tokio::test]
    async fn test_head_and_fetch() {
        let (_dir, backend) = fixture();

        let meta = backend.head("docs/c.txt").await.unwrap();
        assert_eq!(meta.size, Some(7));

        let bytes = backend.fetch("docs/c.txt").await.unwrap();
        assert_eq!(bytes, b"charlie");

        let missing = backend.head("docs/zzz.txt").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_set_acl_unsupported() {
        let (_dir, backend) = fixture();
        assert!(!backend.supports_set_acl());

        let err = backend
            .set_acl("a.txt", &"private".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreSweepError::UnsupportedOperation { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_directory_lists_empty() {
        let (_dir, backend) = fixture();
        let page = backend.list("nope", &ListOptions::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.continuation(), None);
    }
}
