//! Configuration file support for cortex-seed.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `CORTEX_SEED_`, sections joined
//!    with `__`, e.g. `CORTEX_SEED_API__BASE_URL`)
//! 3. Local config file (./cortex-seed.toml)
//! 4. XDG config file (~/.config/cortex-seed/config.toml)
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [api]
//! base_url = "http://localhost:8080/api/v1"
//! timeout_secs = 30
//!
//! [dataset]
//! path = "data.json"
//! content_dir = "lesson_content"  # optional, defaults next to the dataset
//! asset_dir = "images"            # optional, no images when unset
//!
//! [seed]
//! concurrency = 1
//! register_admin = true
//! dry_run = false
//!
//! [admin]
//! activation_token = "..."  # or use CORTEX_SEED_ADMIN__ACTIVATION_TOKEN
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use cortex_seed::gateway::DEFAULT_BASE_URL;
use cortex_seed::seed::DEFAULT_CONCURRENCY;
use directories::ProjectDirs;
use serde::Deserialize;

/// Name of the project-local config file.
const LOCAL_CONFIG_FILE: &str = "cortex-seed.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API settings.
    pub api: ApiConfig,
    /// Where the dataset and its files live.
    pub dataset: DatasetConfig,
    /// Default seeding options.
    pub seed: SeedConfig,
    /// Admin bootstrap settings.
    pub admin: AdminConfig,
}

/// Backend API settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL, including the `/api/v1` prefix.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Dataset locations.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to `data.json`.
    pub path: PathBuf,
    /// Directory that `content_file` entries resolve against.
    pub content_dir: Option<PathBuf>,
    /// Folder of resource images.
    pub asset_dir: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.json"),
            content_dir: None,
            asset_dir: None,
        }
    }
}

/// Default seeding options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Maximum in-flight items per kind.
    pub concurrency: usize,
    /// Register the admin account before authenticating.
    pub register_admin: bool,
    /// List and match only.
    pub dry_run: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            register_admin: true,
            dry_run: false,
        }
    }
}

/// Admin bootstrap settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Token from the activation email, used right after registration.
    pub activation_token: Option<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/cortex-seed/config.toml)
    /// 3. Local config file (./cortex-seed.toml)
    /// 4. Environment variables with CORTEX_SEED_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            tracing::debug!("Loading config from ./{}", LOCAL_CONFIG_FILE);
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., CORTEX_SEED_API__BASE_URL -> api.base_url
        builder = builder.add_source(
            Environment::with_prefix("CORTEX_SEED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Request timeout as a duration, never zero.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cortex-seed").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.dataset.path, PathBuf::from("data.json"));
        assert!(config.dataset.content_dir.is_none());
        assert!(config.dataset.asset_dir.is_none());
        assert_eq!(config.seed.concurrency, 1);
        assert!(config.seed.register_admin);
        assert!(!config.seed.dry_run);
        assert!(config.admin.activation_token.is_none());
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [api]
            base_url = "https://cortex.example.com/api/v1"
            timeout_secs = 5

            [dataset]
            path = "seed/data.json"
            content_dir = "seed/lessons"
            asset_dir = "seed/images"

            [seed]
            concurrency = 4
            register_admin = false
            dry_run = true

            [admin]
            activation_token = "tok"
        "#,
        );

        assert_eq!(config.api.base_url, "https://cortex.example.com/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.dataset.path, PathBuf::from("seed/data.json"));
        assert_eq!(
            config.dataset.content_dir,
            Some(PathBuf::from("seed/lessons"))
        );
        assert_eq!(config.dataset.asset_dir, Some(PathBuf::from("seed/images")));
        assert_eq!(config.seed.concurrency, 4);
        assert!(!config.seed.register_admin);
        assert!(config.seed.dry_run);
        assert_eq!(config.admin.activation_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_config_builder_partial_override() {
        let config = from_toml(
            r#"
            [seed]
            concurrency = 8
        "#,
        );

        assert_eq!(config.seed.concurrency, 8);
        assert!(config.seed.register_admin);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_merging_order() {
        let base = r#"
            [api]
            base_url = "http://base/api/v1"
            timeout_secs = 10
        "#;
        let local = r#"
            [api]
            base_url = "http://local/api/v1"
        "#;

        let config: Config = ConfigBuilder::builder()
            .add_source(config::File::from_str(base, FileFormat::Toml))
            .add_source(config::File::from_str(local, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api.base_url, "http://local/api/v1");
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = from_toml(
            r#"
            [api]
            timeout_secs = 0
        "#,
        );
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[seed\nconcurrency = 1", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml(
            r#"
            [seed]
            concurrency = 2
            unknown_field = "ignored"
        "#,
        );
        assert_eq!(config.seed.concurrency, 2);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("cortex-seed"));
    }
}
