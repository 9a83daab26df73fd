//! Configuration settings for StoreSweep
//!
//! Defines the CLI surface and the JSON environment configuration format:
//! each file declares one environment with named storage bindings and
//! optional pair exclusions used when planning compare jobs.

use crate::compare::CompareMode;
use crate::error::{Result, StoreSweepError};
use crate::storage::{FsBackend, MemoryBackend, StorageBackend};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// StoreSweep - bulk compare and ACL repair across storage backends
#[derive(Parser, Debug, Clone)]
#[command(name = "storesweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk compare and ACL repair across pluggable storage backends")]
#[command(long_about = r#"
StoreSweep walks cursor-paginated object listings and applies a per-item
action under bounded concurrency: compare objects across bindings and/or
environments, or repair ACLs over one binding at a time.

Examples:
  storesweep -c prod.json -c stage.json compare files       # compare 'files' across envs
  storesweep -c prod.json compare files assets --recursive  # compare two bindings
  storesweep -c prod.json acl uploads files --acl public-read
"#)]
pub struct CliArgs {
    /// Environment configuration file(s), JSON
    #[arg(short = 'c', long = "config", value_name = "PATH", required = true)]
    pub configs: Vec<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compare objects between storage bindings and/or environments
    #[command(name = "compare")]
    Compare {
        /// Storage bindings to compare (every ordered pair is a job)
        #[arg(value_name = "STORAGE", required = true)]
        storage: Vec<String>,

        /// Directory to compare, relative to the binding roots
        #[arg(long, default_value = "", value_name = "DIR")]
        dir: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Comparison predicate
        #[arg(long, value_enum, default_value = "metadata")]
        mode: CompareMode,

        /// Maximum concurrently outstanding comparisons per job
        #[arg(long, default_value = "20", value_name = "NUM")]
        concurrency: usize,

        /// Maximum items per listing page
        #[arg(long, default_value = "5000", value_name = "NUM")]
        page_size: usize,

        /// Seconds between progress reports
        #[arg(long, default_value = "5", value_name = "SECS")]
        report_interval: u64,
    },

    /// Set ACLs for a given directory on the given storage bindings
    #[command(name = "acl")]
    Acl {
        /// Directory to apply ACLs to
        #[arg(value_name = "DIR")]
        dir: String,

        /// Storage bindings to repair (one job per binding)
        #[arg(value_name = "STORAGE", required = true)]
        storage: Vec<String>,

        /// Canned ACL to apply to every listed object
        #[arg(long, default_value = "private", value_name = "ACL")]
        acl: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Maximum concurrently outstanding mutations per job
        #[arg(long, default_value = "20", value_name = "NUM")]
        concurrency: usize,

        /// Maximum items per listing page
        #[arg(long, default_value = "5000", value_name = "NUM")]
        page_size: usize,

        /// Seconds between progress reports
        #[arg(long, default_value = "5", value_name = "SECS")]
        report_interval: u64,
    },
}

/// One environment configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Opaque environment identifier, used in job identities
    pub id: String,
    /// Named storage bindings
    pub bindings: BTreeMap<String, BindingSettings>,
    /// Compare pairs to skip, as `"srcConfig/srcBinding->dstConfig/dstBinding"`
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl EnvConfig {
    /// Load and parse one configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| StoreSweepError::io(path, e))?;
        let config: EnvConfig = serde_json::from_str(&raw).map_err(|e| {
            StoreSweepError::config(format!("{}: {}", path.display(), e))
        })?;
        if config.id.is_empty() {
            return Err(StoreSweepError::config(format!(
                "{}: environment id must not be empty",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Declaration of one storage binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BindingSettings {
    /// Local directory tree
    Fs {
        /// Directory the binding is rooted at
        root: PathBuf,
    },
    /// In-memory scratch store
    Memory,
    /// S3-compatible bucket
    S3 {
        /// Bucket name
        bucket: String,
        /// AWS region
        #[serde(default = "default_region")]
        region: String,
        /// Custom endpoint URL for S3-compatible services
        endpoint: Option<String>,
        /// Key prefix all keys resolve under
        prefix: Option<String>,
        /// Force path-style access
        #[serde(default)]
        path_style: bool,
        /// Static access key id (falls back to the AWS credential chain)
        access_key_id: Option<String>,
        /// Static secret access key
        secret_access_key: Option<String>,
    },
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Instantiate the backend a binding declares.
pub async fn build_backend(
    config_id: &str,
    binding_id: &str,
    settings: &BindingSettings,
) -> Result<Arc<dyn StorageBackend>> {
    match settings {
        BindingSettings::Fs { root } => {
            Ok(Arc::new(FsBackend::new(config_id, binding_id, root.clone())))
        }
        BindingSettings::Memory => Ok(Arc::new(MemoryBackend::new(config_id, binding_id))),
        #[cfg(feature = "s3")]
        BindingSettings::S3 {
            bucket,
            region,
            endpoint,
            prefix,
            path_style,
            access_key_id,
            secret_access_key,
        } => {
            let settings = crate::storage::S3BindingSettings {
                region: region.clone(),
                endpoint_url: endpoint.clone(),
                bucket: bucket.clone(),
                prefix: prefix.clone(),
                force_path_style: *path_style,
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            };
            Ok(Arc::new(
                crate::storage::S3Backend::new(config_id, binding_id, settings).await?,
            ))
        }
        #[cfg(not(feature = "s3"))]
        BindingSettings::S3 { .. } => Err(StoreSweepError::config(format!(
            "binding {}/{} requires the 's3' feature",
            config_id, binding_id
        ))),
    }
}

/// Resolve requested binding names against the loaded environments.
///
/// A plain name selects that binding from every environment that declares
/// it; a `config/binding` reference selects exactly one. A name found in no
/// environment is a configuration error.
pub async fn resolve_bindings(
    configs: &[EnvConfig],
    names: &[String],
) -> Result<Vec<Arc<dyn StorageBackend>>> {
    let mut bindings: Vec<Arc<dyn StorageBackend>> = Vec::new();

    for name in names {
        let mut matched = false;
        for config in configs {
            match name.split_once('/') {
                Some((config_id, binding_id)) => {
                    if config.id != config_id {
                        continue;
                    }
                    let settings = config.bindings.get(binding_id).ok_or_else(|| {
                        StoreSweepError::config(format!(
                            "no binding '{}' in environment '{}'",
                            binding_id, config_id
                        ))
                    })?;
                    bindings.push(build_backend(&config.id, binding_id, settings).await?);
                    matched = true;
                }
                None => {
                    if let Some(settings) = config.bindings.get(name) {
                        bindings.push(build_backend(&config.id, name, settings).await?);
                        matched = true;
                    }
                }
            }
        }
        if !matched {
            return Err(StoreSweepError::config(format!(
                "storage binding '{}' not found in any environment",
                name
            )));
        }
    }

    Ok(bindings)
}

/// Compare pairs to skip, collected from every loaded environment.
#[derive(Debug, Default, Clone)]
pub struct ExclusionRules {
    pairs: HashSet<(String, String)>,
}

impl ExclusionRules {
    /// Parse the exclusion lists of the loaded environments.
    pub fn from_configs(configs: &[EnvConfig]) -> Result<Self> {
        let mut pairs = HashSet::new();
        for config in configs {
            for rule in &config.exclusions {
                pairs.insert(parse_rule(rule)?);
            }
        }
        Ok(Self { pairs })
    }

    /// Whether the ordered (src, dst) pair is excluded from planning.
    pub fn is_excluded(&self, src: &dyn StorageBackend, dst: &dyn StorageBackend) -> bool {
        self.pairs.contains(&(src.describe(), dst.describe()))
    }

    /// Number of configured exclusion pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no exclusions are configured.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn parse_rule(rule: &str) -> Result<(String, String)> {
    let (src, dst) = rule.split_once("->").ok_or_else(|| {
        StoreSweepError::config(format!(
            "invalid exclusion '{}', expected 'config/binding->config/binding'",
            rule
        ))
    })?;
    let src = src.trim();
    let dst = dst.trim();
    if !src.contains('/') || !dst.contains('/') {
        return Err(StoreSweepError::config(format!(
            "invalid exclusion '{}', both sides need a 'config/binding' reference",
            rule
        )));
    }
    Ok((src.to_string(), dst.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "prod",
        "bindings": {
            "files": { "kind": "fs", "root": "/var/files" },
            "scratch": { "kind": "memory" },
            "assets": {
                "kind": "s3",
                "bucket": "prod-assets",
                "prefix": "uploads",
                "path_style": true
            }
        },
        "exclusions": ["prod/files->prod/assets"]
    }"#;

    #[test]
    fn test_parse_environment_config() {
        let config: EnvConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.id, "prod");
        assert_eq!(config.bindings.len(), 3);
        assert!(matches!(
            config.bindings.get("scratch"),
            Some(BindingSettings::Memory)
        ));
        match config.bindings.get("assets") {
            Some(BindingSettings::S3 {
                bucket,
                region,
                path_style,
                ..
            }) => {
                assert_eq!(bucket, "prod-assets");
                assert_eq!(region, "us-east-1");
                assert!(path_style);
            }
            other => panic!("unexpected binding: {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_empty_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"id": "", "bindings": {}}"#).unwrap();
        assert!(EnvConfig::load(&path).is_err());
    }

    #[tokio::test]
    async fn test_resolve_plain_name_across_environments() {
        let mut configs = Vec::new();
        for id in ["prod", "stage"] {
            let mut bindings = BTreeMap::new();
            bindings.insert("files".to_string(), BindingSettings::Memory);
            configs.push(EnvConfig {
                id: id.to_string(),
                bindings,
                exclusions: Vec::new(),
            });
        }

        let resolved = resolve_bindings(&configs, &["files".to_string()])
            .await
            .unwrap();
        let names: Vec<_> = resolved.iter().map(|b| b.describe()).collect();
        assert_eq!(names, vec!["prod/files", "stage/files"]);

        let one = resolve_bindings(&configs, &["stage/files".to_string()])
            .await
            .unwrap();
        assert_eq!(one[0].describe(), "stage/files");

        let err = resolve_bindings(&configs, &["missing".to_string()]).await;
        assert!(err.is_err());
    }

    #[test]
    fn test_exclusion_rules() {
        let config: EnvConfig = serde_json::from_str(SAMPLE).unwrap();
        let rules = ExclusionRules::from_configs(&[config]).unwrap();
        assert_eq!(rules.len(), 1);

        let src = MemoryBackend::new("prod", "files");
        let dst = MemoryBackend::new("prod", "assets");
        assert!(rules.is_excluded(&src, &dst));
        assert!(!rules.is_excluded(&dst, &src));
    }

    #[test]
    fn test_exclusion_parse_errors() {
        assert!(parse_rule("prod/files->stage/files").is_ok());
        assert!(parse_rule("prod/files").is_err());
        assert!(parse_rule("files->assets").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::try_parse_from([
            "storesweep",
            "-c",
            "prod.json",
            "compare",
            "files",
            "assets",
        ])
        .unwrap();

        match args.command {
            Commands::Compare {
                storage,
                concurrency,
                page_size,
                mode,
                report_interval,
                recursive,
                ..
            } => {
                assert_eq!(storage, vec!["files", "assets"]);
                assert_eq!(concurrency, 20);
                assert_eq!(page_size, 5000);
                assert_eq!(report_interval, 5);
                assert_eq!(mode, CompareMode::Metadata);
                assert!(!recursive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_acl_command() {
        let args = CliArgs::try_parse_from([
            "storesweep",
            "-c",
            "prod.json",
            "acl",
            "uploads",
            "files",
            "--acl",
            "public-read",
            "--recursive",
        ])
        .unwrap();

        match args.command {
            Commands::Acl { dir, storage, acl, recursive, .. } => {
                assert_eq!(dir, "uploads");
                assert_eq!(storage, vec!["files"]);
                assert_eq!(acl, "public-read");
                assert!(recursive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
