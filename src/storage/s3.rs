//! S3-compatible object storage backend
//!
//! Uses the AWS SDK with connection-pooled HTTP requests. Supports AWS S3 and
//! S3-compatible endpoints (MinIO, Ceph, Wasabi). Listing maps directly onto
//! `ListObjectsV2` continuation tokens; ACL repair maps onto `PutObjectAcl`
//! with canned ACLs.

use crate::error::{Result, StoreSweepError};
use crate::storage::{AclSpec, ListOptions, ListPage, ObjectMeta, ObjectRef, StorageBackend};
use async_trait::async_trait;
use aws_sdk_s3::types::ObjectCannedAcl;
use chrono::{DateTime, Utc};

/// Settings for one S3 binding.
#[derive(Debug, Clone)]
pub struct S3BindingSettings {
    /// AWS region (e.g. "us-east-1")
    pub region: String,
    /// Custom endpoint URL for S3-compatible services
    pub endpoint_url: Option<String>,
    /// Bucket name
    pub bucket: String,
    /// Key prefix all keys are resolved under
    pub prefix: Option<String>,
    /// Force path-style access (required by some S3-compatible services)
    pub force_path_style: bool,
    /// Access key ID (optional, falls back to the AWS credential chain)
    pub access_key_id: Option<String>,
    /// Secret access key (optional, falls back to the AWS credential chain)
    pub secret_access_key: Option<String>,
}

impl Default for S3BindingSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_url: None,
            bucket: String::new(),
            prefix: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// Storage backend over one S3 bucket (optionally under a key prefix).
pub struct S3Backend {
    config_id: String,
    binding_id: String,
    settings: S3BindingSettings,
    client: aws_sdk_s3::Client,
}

impl S3Backend {
    /// Build the SDK client and wrap it as a backend.
    pub async fn new(
        config_id: impl Into<String>,
        binding_id: impl Into<String>,
        settings: S3BindingSettings,
    ) -> Result<Self> {
        if settings.bucket.is_empty() {
            return Err(StoreSweepError::config("S3 binding requires a bucket"));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()));

        if let Some(ref endpoint) = settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(ref key_id), Some(ref secret)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            let creds = aws_credential_types::Credentials::new(
                key_id,
                secret,
                None, // session token
                None, // expiry
                "storesweep-static",
            );
            loader = loader.credentials_provider(creds);
        }

        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(builder.build());

        Ok(Self {
            config_id: config_id.into(),
            binding_id: binding_id.into(),
            settings,
            client,
        })
    }

    fn base_prefix(&self) -> &str {
        self.settings
            .prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .unwrap_or("")
    }

    /// Resolve an engine key to the full bucket key.
    fn full_key(&self, key: &str) -> String {
        let base = self.base_prefix();
        if base.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", base, key)
        }
    }

    /// Strip the binding's base prefix back off a bucket key.
    fn relative_key(&self, full: &str) -> String {
        let base = self.base_prefix();
        if base.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(base)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| full.to_string())
    }

    fn listing_prefix(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let base = self.base_prefix();
        match (base.is_empty(), path.is_empty()) {
            (true, true) => String::new(),
            (true, false) => format!("{}/", path),
            (false, true) => format!("{}/", base),
            (false, false) => format!("{}/{}/", base, path),
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn config_id(&self) -> &str {
        &self.config_id
    }

    fn binding_id(&self) -> &str {
        &self.binding_id
    }

    async fn list(&self, path: &str, options: &ListOptions) -> Result<ListPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.settings.bucket)
            .prefix(self.listing_prefix(path))
            .max_keys(options.page_size_limit as i32)
            .set_delimiter((!options.recursive).then(|| "/".to_string()))
            .set_continuation_token(options.cursor.clone().filter(|c| !c.is_empty()))
            .send()
            .await
            .map_err(|e| StoreSweepError::listing(self.describe(), path, e.to_string()))?;

        let items = resp
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = self.relative_key(obj.key()?);
                Some(ObjectRef {
                    key,
                    meta: ObjectMeta {
                        size: obj.size().map(|s| s as u64),
                        modified: obj.last_modified().and_then(to_chrono),
                        etag: obj.e_tag().map(trim_etag),
                        content_type: None,
                    },
                })
            })
            .collect();

        let subdirectories = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .map(|p| self.relative_key(p.trim_end_matches('/')))
            .collect();

        Ok(ListPage {
            items,
            subdirectories,
            cursor: resp.next_continuation_token().map(str::to_string),
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.settings.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_not_found() {
                    StoreSweepError::NotFound(key.to_string())
                } else {
                    StoreSweepError::backend(self.describe(), service.to_string())
                }
            })?;

        Ok(ObjectMeta {
            size: resp.content_length().map(|s| s as u64),
            modified: resp.last_modified().and_then(to_chrono),
            etag: resp.e_tag().map(trim_etag),
            content_type: resp.content_type().map(str::to_string),
        })
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.settings.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    StoreSweepError::NotFound(key.to_string())
                } else {
                    StoreSweepError::backend(self.describe(), service.to_string())
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreSweepError::backend(self.describe(), e.to_string()))?;

        Ok(body.into_bytes().to_vec())
    }

    fn supports_set_acl(&self) -> bool {
        true
    }

    async fn set_acl(&self, key: &str, acl: &AclSpec) -> Result<()> {
        self.client
            .put_object_acl()
            .bucket(&self.settings.bucket)
            .key(self.full_key(key))
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .send()
            .await
            .map_err(|e| StoreSweepError::backend(self.describe(), e.to_string()))?;

        Ok(())
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping_with_prefix() {
        let settings = S3BindingSettings {
            bucket: "assets".to_string(),
            prefix: Some("uploads/".to_string()),
            ..S3BindingSettings::default()
        };
        // Exercise key arithmetic without a client.
        let backend = S3Backend {
            config_id: "prod".to_string(),
            binding_id: "assets".to_string(),
            client: aws_sdk_s3::Client::from_conf(
                aws_sdk_s3::Config::builder()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .region(aws_sdk_s3::config::Region::new("us-east-1"))
                    .build(),
            ),
            settings,
        };

        assert_eq!(backend.full_key("docs/a.txt"), "uploads/docs/a.txt");
        assert_eq!(backend.relative_key("uploads/docs/a.txt"), "docs/a.txt");
        assert_eq!(backend.listing_prefix("docs"), "uploads/docs/");
        assert_eq!(backend.listing_prefix(""), "uploads/");
    }

    #[test]
    fn test_trim_etag() {
        assert_eq!(trim_etag("\"abc123\""), "abc123");
        assert_eq!(trim_etag("abc123"), "abc123");
    }
}
