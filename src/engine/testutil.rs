//! Scripted collaborators shared by the engine tests.

use crate::compare::Comparer;
use crate::error::{Result, StoreSweepError};
use crate::storage::{
    AclSpec, ListOptions, ListPage, MemoryBackend, ObjectMeta, ObjectRef, StorageBackend,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that serves a fixed sequence of pages keyed by expected cursor.
pub(crate) struct ScriptedBackend {
    config_id: String,
    binding_id: String,
    pages: Vec<(Option<String>, ListPage)>,
    fail_on_request: Option<usize>,
    requests: AtomicUsize,
}

impl ScriptedBackend {
    /// Build a script of pages with the given item counts; the final page
    /// carries no continuation token.
    pub(crate) fn with_page_sizes(config_id: &str, binding_id: &str, sizes: &[usize]) -> Self {
        let mut pages = Vec::new();
        let mut next_key = 0usize;
        for (index, &size) in sizes.iter().enumerate() {
            let items = (0..size)
                .map(|_| {
                    let key = format!("item-{:05}", next_key);
                    next_key += 1;
                    ObjectRef {
                        key,
                        meta: ObjectMeta {
                            size: Some(1),
                            ..ObjectMeta::default()
                        },
                    }
                })
                .collect();
            let expected_cursor = if index == 0 {
                None
            } else {
                Some(format!("cursor-{}", index))
            };
            let cursor = if index + 1 == sizes.len() {
                None
            } else {
                Some(format!("cursor-{}", index + 1))
            };
            pages.push((
                expected_cursor,
                ListPage {
                    items,
                    subdirectories: Vec::new(),
                    cursor,
                },
            ));
        }
        Self {
            config_id: config_id.to_string(),
            binding_id: binding_id.to_string(),
            pages,
            fail_on_request: None,
            requests: AtomicUsize::new(0),
        }
    }

    /// Fail the n-th listing request (0-based) instead of serving a page.
    pub(crate) fn failing_on_request(mut self, request: usize) -> Self {
        self.fail_on_request = Some(request);
        self
    }
}

#[async_trait]
impl StorageBackend for ScriptedBackend {
    fn config_id(&self) -> &str {
        &self.config_id
    }

    fn binding_id(&self) -> &str {
        &self.binding_id
    }

    async fn list(&self, _path: &str, options: &ListOptions) -> Result<ListPage> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_request == Some(request) {
            return Err(StoreSweepError::listing(
                self.describe(),
                "",
                "scripted listing failure",
            ));
        }

        let wanted = options.cursor.as_deref().filter(|c| !c.is_empty());
        self.pages
            .iter()
            .find(|(expected, _)| expected.as_deref() == wanted)
            .map(|(_, page)| page.clone())
            .ok_or_else(|| {
                StoreSweepError::listing(self.describe(), "", "unknown cursor in script")
            })
    }

    async fn head(&self, _key: &str) -> Result<ObjectMeta> {
        Ok(ObjectMeta {
            size: Some(1),
            ..ObjectMeta::default()
        })
    }

    async fn fetch(&self, _key: &str) -> Result<Vec<u8>> {
        Ok(b"x".to_vec())
    }
}

/// Comparer with a fixed verdict.
pub(crate) enum StaticComparer {
    Matches,
    Differs,
    Fails,
}

#[async_trait]
impl Comparer for StaticComparer {
    async fn compare(
        &self,
        key: &str,
        _src: &dyn StorageBackend,
        _dst: &dyn StorageBackend,
    ) -> Result<bool> {
        match self {
            Self::Matches => Ok(true),
            Self::Differs => Ok(false),
            Self::Fails => Err(StoreSweepError::inconclusive(key, "scripted failure")),
        }
    }
}

/// Memory-backed store whose `set_acl` fails for keys containing a marker.
pub(crate) struct FlakyAclBackend {
    inner: MemoryBackend,
    fail_marker: String,
}

impl FlakyAclBackend {
    pub(crate) fn new(config_id: &str, binding_id: &str, fail_marker: &str) -> Self {
        Self {
            inner: MemoryBackend::new(config_id, binding_id),
            fail_marker: fail_marker.to_string(),
        }
    }

    pub(crate) fn put(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.inner.put(key, data);
    }

    pub(crate) fn acl_of(&self, key: &str) -> Option<AclSpec> {
        self.inner.acl_of(key)
    }
}

#[async_trait]
impl StorageBackend for FlakyAclBackend {
    fn config_id(&self) -> &str {
        self.inner.config_id()
    }

    fn binding_id(&self) -> &str {
        self.inner.binding_id()
    }

    async fn list(&self, path: &str, options: &ListOptions) -> Result<ListPage> {
        self.inner.list(path, options).await
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.fetch(key).await
    }

    fn supports_set_acl(&self) -> bool {
        true
    }

    async fn set_acl(&self, key: &str, acl: &AclSpec) -> Result<()> {
        if key.contains(&self.fail_marker) {
            return Err(StoreSweepError::backend(self.describe(), "scripted ACL failure"));
        }
        self.inner.set_acl(key, acl).await
    }
}
