//! Pluggable storage backends
//!
//! Every backend exposes the same contract: cursor-paginated listing,
//! metadata/content reads for comparison, and an optional set-ACL mutation.
//! The engine only ever talks to `dyn StorageBackend`.

mod fs;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use fs::FsBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "s3")]
pub use s3::{S3Backend, S3BindingSettings};

use crate::error::{Result, StoreSweepError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of items per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Options for one listing call.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Flatten nested levels into items instead of stopping at the immediate level
    pub recursive: bool,
    /// Upper bound on items returned per page
    pub page_size_limit: usize,
    /// Continuation token from the previous page, verbatim
    pub cursor: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            page_size_limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

/// One page of a listing.
///
/// Produced by a single `list` call and consumed immediately. A page with no
/// continuation cursor is the final page; its items are still processed.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects in this page, in backend cursor order
    pub items: Vec<ObjectRef>,
    /// Immediate subdirectory names (non-recursive listings only)
    pub subdirectories: Vec<String>,
    /// Opaque continuation token; absent or empty when the listing is exhausted
    pub cursor: Option<String>,
}

impl ListPage {
    /// The continuation token, normalized: `None` if absent or empty.
    ///
    /// The engine never inspects the token's contents, it only threads a
    /// non-empty value back into the next request.
    pub fn continuation(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Reference to one listed object. Identity is the key; two refs from
/// different backends denote the same item iff their keys are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRef {
    /// Object key, relative to the binding root, `/`-separated
    pub key: String,
    /// Backend-reported metadata
    pub meta: ObjectMeta,
}

impl ObjectRef {
    /// Build a ref from a key with empty metadata.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            meta: ObjectMeta::default(),
        }
    }
}

/// Backend-specific object metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Size in bytes, when the backend reports one
    pub size: Option<u64>,
    /// Last-modified timestamp
    pub modified: Option<DateTime<Utc>>,
    /// Content hash / ETag as reported by the backend
    pub etag: Option<String>,
    /// MIME content type, when known
    pub content_type: Option<String>,
}

/// A canned ACL specification applied verbatim by backends that support it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclSpec(String);

impl AclSpec {
    /// Wrap a canned ACL name (e.g. "private", "public-read").
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    /// The raw ACL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AclSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AclSpec {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A configured handle to one storage backend instance.
///
/// `config_id` and `binding_id` are opaque identity strings supplied by
/// configuration; the engine uses them only as map keys and for display.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Identifier of the environment configuration this binding came from
    fn config_id(&self) -> &str;

    /// Identifier of the binding within its configuration
    fn binding_id(&self) -> &str;

    /// List one page of objects under `path`.
    ///
    /// Must be idempotent for a given cursor and must eventually return a
    /// page with no continuation token for a finite namespace.
    async fn list(&self, path: &str, options: &ListOptions) -> Result<ListPage>;

    /// Fetch metadata for a single key.
    async fn head(&self, key: &str) -> Result<ObjectMeta>;

    /// Fetch the full content of a single key.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether this binding can apply ACL mutations at all.
    fn supports_set_acl(&self) -> bool {
        false
    }

    /// Apply an ACL to a single key.
    async fn set_acl(&self, _key: &str, _acl: &AclSpec) -> Result<()> {
        Err(StoreSweepError::unsupported(self.describe(), "set_acl"))
    }

    /// `config/binding` display form used in stats and error messages.
    fn describe(&self) -> String {
        format!("{}/{}", self.config_id(), self.binding_id())
    }
}

/// Join a listing prefix and an entry name into a key.
pub(crate) fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
