//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a TOML file (`--config <FILE>`, or `config.toml` in the platform config dir)
//! 3. `DUPFIND_*` environment variables (`DUPFIND_ALGO=blake3`, `DUPFIND_MIN_SIZE=1MB`)
//! 4. command-line flags ([`Config::merge_cli`])
//!
//! ```toml
//! algo = "xxh3"
//! workers = 8
//! min_size = "4KiB"
//! exclude_ext = ["jpg", "png"]
//! exclude_dir = "node_modules,target"
//! format = "json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cli::{parse_size, split_list, Cli};
use crate::error::ConfigError;
use crate::fingerprint::{default_workers, FingerprintConfig};
use crate::output::OutputFormat;
use crate::scanner::WalkerConfig;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hash algorithm name, validated by [`Config::fingerprint_config`].
    pub algo: String,
    pub workers: usize,
    /// Minimum file size in bytes; accepts size strings in files and env.
    #[serde(deserialize_with = "deserialize_size")]
    pub min_size: u64,
    #[serde(
        deserialize_with = "deserialize_opt_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_size: Option<u64>,
    /// Extensions to skip; a comma-separated string is also accepted.
    #[serde(deserialize_with = "deserialize_list")]
    pub exclude_ext: Vec<String>,
    #[serde(deserialize_with = "deserialize_list")]
    pub exclude_dir: Vec<String>,
    #[serde(deserialize_with = "deserialize_list")]
    pub ignore: Vec<String>,
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algo: "sha256".to_string(),
            workers: default_workers(),
            min_size: 1,
            max_size: None,
            exclude_ext: Vec::new(),
            exclude_dir: Vec::new(),
            ignore: Vec::new(),
            follow_symlinks: false,
            skip_hidden: false,
            format: OutputFormat::Plain,
        }
    }
}

impl Config {
    /// Load defaults, config file and environment.
    ///
    /// An explicit `path` must exist; the platform default is used only if present.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the file is missing or any layer fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::Invalid(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            log::debug!("Loading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        let config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        Ok(config)
    }

    /// Load defaults overlaid with a single TOML file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the file cannot be parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        Ok(config)
    }

    /// Save the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Platform-specific configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupfind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded layers.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(algo) = &cli.algo {
            self.algo.clone_from(algo);
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        self.exclude_ext.extend(split_list(&cli.exclude_ext));
        self.exclude_dir.extend(split_list(&cli.exclude_dir));
        self.ignore.extend(cli.ignore_patterns.iter().cloned());
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        if let Some(format) = cli.format {
            self.format = format;
        }
    }

    /// Validated engine settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownAlgorithm`] or [`ConfigError::ZeroWorkers`].
    pub fn fingerprint_config(&self) -> Result<FingerprintConfig, ConfigError> {
        FingerprintConfig::new(&self.algo, self.workers)
    }

    /// Walker settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSize`] if `min_size` exceeds `max_size`.
    pub fn walker_config(&self) -> Result<WalkerConfig, ConfigError> {
        if let Some(max) = self.max_size.filter(|max| *max < self.min_size) {
            return Err(ConfigError::InvalidSize {
                input: max.to_string(),
                reason: format!("max-size is below min-size ({})", self.min_size),
            });
        }
        Ok(WalkerConfig {
            min_size: self.min_size,
            max_size: self.max_size,
            exclude_exts: self.exclude_ext.clone(),
            exclude_dirs: self.exclude_dir.clone(),
            ignore_patterns: self.ignore.clone(),
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

impl RawSize {
    fn resolve<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Bytes(n) => Ok(n),
            Self::Text(s) => parse_size(&s).map_err(E::custom),
        }
    }
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    RawSize::deserialize(deserializer)?.resolve()
}

fn deserialize_opt_size<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Option::<RawSize>::deserialize(deserializer)?
        .map(RawSize::resolve)
        .transpose()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList {
    Many(Vec<String>),
    One(String),
}

fn deserialize_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = match RawList::deserialize(deserializer)? {
        RawList::Many(values) => values,
        RawList::One(value) => vec![value],
    };
    Ok(split_list(&values))
}
