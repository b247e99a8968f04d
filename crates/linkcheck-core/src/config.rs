use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Global user configuration loaded from `~/.linkcheck/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub repositories: BTreeMap<String, String>,

    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialEntry>,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Resource limits governing the concurrency model: how many class files
/// may be parsed concurrently, and how many archives may be held open at
/// once before the LRU evicts the least-recently-used one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_parsers", rename = "max-parsers")]
    pub max_parsers: u32,
    #[serde(default = "default_max_open_archives", rename = "max-open-archives")]
    pub max_open_archives: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_parsers: default_max_parsers(),
            max_open_archives: default_max_open_archives(),
        }
    }
}

fn default_max_parsers() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

fn default_max_open_archives() -> u32 {
    32
}

/// Credential entry for a named Maven repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "token-cmd")]
    pub token_cmd: Option<String>,
}

/// Local artifact cache configuration from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default, rename = "max-size")]
    pub max_size: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            max_size: None,
        }
    }
}

fn default_cache_dir() -> String {
    "~/.linkcheck/cache".to_string()
}

impl GlobalConfig {
    /// Load the global configuration from `~/.linkcheck/config.toml`, or
    /// return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                linkcheck_util::errors::LinkcheckError::Generic {
                    message: format!("Failed to read global config: {e}"),
                }
            })?;
            toml::from_str(&content).map_err(|e| {
                linkcheck_util::errors::LinkcheckError::Generic {
                    message: format!("Failed to parse global config: {e}"),
                }
                .into()
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the linkcheck data directory (`~/.linkcheck/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".linkcheck")
}
