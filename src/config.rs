//! Configuration module for longshore
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (LONGSHORE_*)
//! 3. Project config (longshore.toml in the working directory)
//! 4. User config (~/.config/longshore/config.toml)
//! 5. Built-in defaults (lowest priority)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LongshoreError, LongshoreResult};
use crate::inventory::ListingFallback;

/// Remote store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    /// Whether a failed initial listing stops the run or degrades it to a
    /// full re-upload. Defaults to stopping.
    #[serde(default)]
    pub on_listing_failure: ListingFallback,
}

/// Deploy defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Manifest consulted when --version is not passed.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Rendered as `Cache-Control: max-age=<n>` on every upload.
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            cache_seconds: default_cache_seconds(),
        }
    }
}

fn default_manifest() -> String {
    "package.json".to_string()
}

fn default_cache_seconds() -> u64 {
    86400
}

fn default_environments() -> BTreeMap<String, String> {
    [
        ("rc", "staging"),
        ("master", "qa"),
        ("qa", "qa"),
        ("production", "production"),
        ("demo", "demo"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_links() -> BTreeMap<String, String> {
    [
        ("rc", "_STAGING"),
        ("qa", "_QA"),
        ("production", "_LATEST"),
        ("demo", "_DEMO"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_content_types() -> BTreeMap<String, String> {
    [
        ("css", "text/css"),
        ("js", "application/javascript"),
        ("js.map", "application/javascript"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    /// Branch-or-name to environment prefix. Keys map, values pass through.
    #[serde(default = "default_environments")]
    pub environments: BTreeMap<String, String>,

    /// Link alias to destination prefix. Keys map, values pass through.
    #[serde(default = "default_links")]
    pub links: BTreeMap<String, String>,

    /// File suffix to content type; longest matching suffix wins.
    #[serde(default = "default_content_types")]
    pub content_types: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            deploy: DeployConfig::default(),
            environments: default_environments(),
            links: default_links(),
            content_types: default_content_types(),
        }
    }
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> LongshoreResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> LongshoreResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| LongshoreError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .split('.')
                    .last()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                ConfigWarning {
                    key: key.clone(),
                    file: path.to_path_buf(),
                    line: find_line_number(&content, &key),
                    suggestion: suggest_key(&key),
                }
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from project config, user config, or defaults.
    ///
    /// A config file that exists but fails to parse is fatal; only absence
    /// falls through to the next layer.
    pub fn load_or_default(project_root: &Path) -> LongshoreResult<Self> {
        let (config, _warnings) = Self::load_or_default_with_warnings(project_root)?;
        Ok(config)
    }

    /// Same as [`Config::load_or_default`], keeping unknown-key warnings.
    pub fn load_or_default_with_warnings(
        project_root: &Path,
    ) -> LongshoreResult<(Self, Vec<ConfigWarning>)> {
        let project_config = project_root.join("longshore.toml");
        if project_config.exists() {
            let (config, warnings) = Self::load_with_warnings(&project_config)?;
            return Ok((config.with_env_overrides(), warnings));
        }

        if let Some(user_config_dir) = dirs_config_dir() {
            let user_config = user_config_dir.join("longshore/config.toml");
            if user_config.exists() {
                let (config, warnings) = Self::load_with_warnings(&user_config)?;
                return Ok((config.with_env_overrides(), warnings));
            }
        }

        Ok((Self::default().with_env_overrides(), Vec::new()))
    }

    /// Apply environment variable overrides (LONGSHORE_* prefix)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bucket) = std::env::var("LONGSHORE_BUCKET") {
            if !bucket.is_empty() {
                self.store.bucket = Some(bucket);
            }
        }

        if let Ok(endpoint) = std::env::var("LONGSHORE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.store.endpoint = Some(endpoint);
            }
        }

        if let Ok(token) = std::env::var("LONGSHORE_TOKEN") {
            if !token.is_empty() {
                self.store.token = Some(token);
            }
        }

        if let Ok(manifest) = std::env::var("LONGSHORE_MANIFEST") {
            if !manifest.is_empty() {
                self.deploy.manifest = manifest;
            }
        }

        if let Ok(value) = std::env::var("LONGSHORE_CACHE_TIME") {
            if let Ok(seconds) = value.parse::<u64>() {
                self.deploy.cache_seconds = seconds;
            }
        }

        self
    }

    /// Environment prefix for `requested`: a table key maps to its value, a
    /// table value passes through unchanged, anything else is fatal.
    pub fn resolve_environment(&self, requested: &str) -> LongshoreResult<String> {
        resolve_in_table(&self.environments, requested).ok_or_else(|| {
            LongshoreError::UnknownEnvironment {
                name: requested.to_string(),
            }
        })
    }

    /// Destination prefix for a link alias, with the same key-then-value
    /// rule as environments.
    pub fn resolve_link(&self, alias: &str) -> LongshoreResult<String> {
        resolve_in_table(&self.links, alias).ok_or_else(|| LongshoreError::UnknownLinkAlias {
            alias: alias.to_string(),
        })
    }
}

fn resolve_in_table(table: &BTreeMap<String, String>, requested: &str) -> Option<String> {
    if let Some(mapped) = table.get(requested) {
        return Some(mapped.clone());
    }
    if table.values().any(|value| value == requested) {
        return Some(requested.to_string());
    }
    None
}

/// Get XDG config directory
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "store",
        "bucket",
        "endpoint",
        "token",
        "on_listing_failure",
        "deploy",
        "manifest",
        "cache_seconds",
        "environments",
        "links",
        "content_types",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
