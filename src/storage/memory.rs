//! In-memory backend
//!
//! Holds the whole namespace in a sorted map. Used by the test suite and as
//! a scratch binding for local experiments with the engine; it supports the
//! full contract including ACL mutations.

use crate::error::{Result, StoreSweepError};
use crate::storage::{AclSpec, ListOptions, ListPage, ObjectMeta, ObjectRef, StorageBackend};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    meta: ObjectMeta,
    acl: Option<AclSpec>,
}

/// Storage backend over an in-memory sorted map.
pub struct MemoryBackend {
    config_id: String,
    binding_id: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new(config_id: impl Into<String>, binding_id: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            binding_id: binding_id.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Insert or replace an object.
    pub fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data = data.into();
        let meta = ObjectMeta {
            size: Some(data.len() as u64),
            ..ObjectMeta::default()
        };
        self.objects
            .lock()
            .expect("memory store poisoned")
            .insert(key.into(), StoredObject { data, meta, acl: None });
    }

    /// The ACL currently recorded for a key, if any.
    pub fn acl_of(&self, key: &str) -> Option<AclSpec> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(key)
            .and_then(|o| o.acl.clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("memory store poisoned").len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn config_id(&self) -> &str {
        &self.config_id
    }

    fn binding_id(&self) -> &str {
        &self.binding_id
    }

    async fn list(&self, path: &str, options: &ListOptions) -> Result<ListPage> {
        let prefix = normalized_prefix(path);
        let objects = self.objects.lock().expect("memory store poisoned");

        let start = match &options.cursor {
            Some(c) if !c.is_empty() => Bound::Excluded(c.clone()),
            _ => Bound::Unbounded,
        };

        let mut items = Vec::new();
        let mut subdirectories = Vec::new();
        let mut cursor = None;

        for (key, obj) in objects.range::<String, _>((start, Bound::Unbounded)) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                // Keys are iterated in sorted order, so once past the prefix
                // range nothing further can match.
                if key.as_str() > prefix.as_str() && !prefix.is_empty() {
                    break;
                }
                continue;
            };

            if !options.recursive {
                if let Some((dir, _)) = rest.split_once('/') {
                    let sub = format!("{}{}", prefix, dir);
                    if options.cursor.is_none() && subdirectories.last() != Some(&sub) {
                        subdirectories.push(sub);
                    }
                    continue;
                }
            }

            if items.len() == options.page_size_limit {
                cursor = items.last().map(|i: &ObjectRef| i.key.clone());
                break;
            }

            items.push(ObjectRef {
                key: key.clone(),
                meta: obj.meta.clone(),
            });
        }

        Ok(ListPage {
            items,
            subdirectories,
            cursor,
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(key)
            .map(|o| o.meta.clone())
            .ok_or_else(|| StoreSweepError::NotFound(key.to_string()))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StoreSweepError::NotFound(key.to_string()))
    }

    fn supports_set_acl(&self) -> bool {
        true
    }

    async fn set_acl(&self, key: &str, acl: &AclSpec) -> Result<()> {
        let mut objects = self.objects.lock().expect("memory store poisoned");
        match objects.get_mut(key) {
            Some(obj) => {
                obj.acl = Some(acl.clone());
                Ok(())
            }
            None => Err(StoreSweepError::NotFound(key.to_string())),
        }
    }
}

fn normalized_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryBackend {
        let backend = MemoryBackend::new("test", "mem");
        backend.put("a.txt", b"alpha".to_vec());
        backend.put("docs/b.txt", b"bravo".to_vec());
        backend.put("docs/c.txt", b"charlie".to_vec());
        backend.put("docs/deep/d.txt", b"delta".to_vec());
        backend
    }

    #[tokio::test]
    async fn test_shallow_listing() {
        let backend = fixture();
        let page = backend.list("", &ListOptions::default()).await.unwrap();

        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt"]);
        assert_eq!(page.subdirectories, vec!["docs"]);
    }

    #[tokio::test]
    async fn test_prefixed_listing() {
        let backend = fixture();
        let options = ListOptions {
            recursive: true,
            ..ListOptions::default()
        };
        let page = backend.list("docs", &options).await.unwrap();

        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["docs/b.txt", "docs/c.txt", "docs/deep/d.txt"]);
    }

    #[tokio::test]
    async fn test_pagination_threads_cursor() {
        let backend = fixture();
        let mut options = ListOptions {
            recursive: true,
            page_size_limit: 2,
            cursor: None,
        };

        let mut seen = Vec::new();
        loop {
            let page = backend.list("", &options).await.unwrap();
            seen.extend(page.items.iter().map(|i| i.key.clone()));
            match page.continuation() {
                Some(token) => options.cursor = Some(token.to_string()),
                None => break,
            }
        }
        assert_eq!(
            seen,
            vec!["a.txt", "docs/b.txt", "docs/c.txt", "docs/deep/d.txt"]
        );
    }

    #[tokio::test]
    async fn test_set_acl_records_spec() {
        let backend = fixture();
        assert!(backend.supports_set_acl());
        assert_eq!(backend.acl_of("a.txt"), None);

        backend.set_acl("a.txt", &"public-read".into()).await.unwrap();
        assert_eq!(backend.acl_of("a.txt"), Some(AclSpec::new("public-read")));

        let err = backend.set_acl("zzz", &"private".into()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
