//! Configuration file parser for `feedrelay.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`,
//! which serves the built-in registry on `0.0.0.0:8080`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{FetchOptions, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_FEED_SIZE};
use crate::registry::{FeedFormat, Platform, Registry};
use crate::util::{validate_feed_url, UrlValidationError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid URL for topic '{topic}' on platform '{platform}': {source}")]
    InvalidUrl {
        platform: String,
        topic: String,
        source: UrlValidationError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level relay configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server listens on.
    pub bind: SocketAddr,

    /// Deadline for one upstream fetch, in seconds. 0 = no deadline.
    pub fetch_timeout_secs: u64,

    /// Maximum upstream body size in bytes.
    pub max_feed_bytes: usize,

    /// Whether the compiled-in platforms (`g1`, `bbc`) are registered.
    pub builtin_platforms: bool,

    /// Additional platforms. A name matching a built-in replaces it.
    pub platforms: BTreeMap<String, PlatformConfig>,
}

/// `[platforms.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub format: FeedFormat,
    pub topics: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            max_feed_bytes: DEFAULT_MAX_FEED_SIZE,
            builtin_platforms: true,
            platforms: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "bind",
        "fetch_timeout_secs",
        "max_feed_bytes",
        "builtin_platforms",
        "platforms",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            bind = %config.bind,
            platforms = config.platforms.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Limits for the upstream fetcher.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: (self.fetch_timeout_secs > 0)
                .then(|| Duration::from_secs(self.fetch_timeout_secs)),
            max_bytes: self.max_feed_bytes,
        }
    }

    /// Builds the immutable registry: built-ins (if enabled), then the
    /// configured platforms on top.
    ///
    /// Empty URLs are kept (they resolve as "Topic not found"); every other
    /// URL must be an absolute http(s) URL.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = if self.builtin_platforms {
            Registry::builtin()
        } else {
            Registry::new()
        };

        for (name, platform) in &self.platforms {
            for (topic, url) in platform.topics.iter().filter(|(_, url)| !url.is_empty()) {
                validate_feed_url(url).map_err(|source| ConfigError::InvalidUrl {
                    platform: name.clone(),
                    topic: topic.clone(),
                    source,
                })?;
            }

            let replaced = registry.insert(
                name.clone(),
                Platform {
                    format: platform.format,
                    topics: platform.topics.clone(),
                },
            );
            if replaced.is_some() {
                tracing::info!(platform = %name, "Configured platform replaces built-in definition");
            }
        }

        Ok(registry)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedrelay_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feedrelay.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.max_feed_bytes, 10 * 1024 * 1024);
        assert!(config.builtin_platforms);
        assert!(config.platforms.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedrelay_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let path = write_config("empty", "");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "bind = \"127.0.0.1:9090\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.fetch_timeout_secs, 30); // default
        assert!(config.builtin_platforms); // default
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
bind = "127.0.0.1:3000"
fetch_timeout_secs = 5
max_feed_bytes = 2048
builtin_platforms = false

[platforms.regions]
format = "rss"

[platforms.regions.topics]
sp = "https://g1.globo.com/dynamo/sp/sao-paulo/rss2.xml"
rj = "https://g1.globo.com/dynamo/rj/rio-de-janeiro/rss2.xml"

[platforms.bbc]
format = "atom"

[platforms.bbc.topics]
brasil = "http://www.bbc.co.uk/portuguese/topicos/brasil/index.xml"
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.max_feed_bytes, 2048);
        assert!(!config.builtin_platforms);
        assert_eq!(config.platforms.len(), 2);
        assert_eq!(config.platforms["regions"].format, FeedFormat::Rss);
        assert_eq!(config.platforms["regions"].topics.len(), 2);
        assert_eq!(config.platforms["bbc"].format, FeedFormat::Atom);
        cleanup(&path);
    }

    #[test]
    fn test_platform_format_defaults_to_rss() {
        let path = write_config(
            "format_default",
            "[platforms.local.topics]\nnews = \"http://localhost:9000/news.xml\"\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.platforms["local"].format, FeedFormat::Rss);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "bind = \"127.0.0.1:8080\"\ntotally_fake_key = 42\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind.port(), 8080);
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "fetch_timeout_secs = \"soon\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_format_returns_error() {
        let path = write_config("badformat", "[platforms.x]\nformat = \"json\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        cleanup(&path);
    }

    // File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_fetch_options() {
        let config = Config {
            fetch_timeout_secs: 7,
            max_feed_bytes: 100,
            ..Config::default()
        };
        let options = config.fetch_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(7)));
        assert_eq!(options.max_bytes, 100);

        let no_deadline = Config {
            fetch_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(no_deadline.fetch_options().timeout, None);
    }

    #[test]
    fn test_registry_defaults_to_builtin() {
        let registry = Config::default().registry().unwrap();
        assert_eq!(registry, Registry::builtin());
    }

    #[test]
    fn test_registry_adds_configured_platform() {
        let mut config = Config::default();
        config.platforms.insert(
            "regions".into(),
            PlatformConfig {
                format: FeedFormat::Rss,
                topics: BTreeMap::from([(
                    "sp".to_string(),
                    "https://g1.globo.com/dynamo/sp/sao-paulo/rss2.xml".to_string(),
                )]),
            },
        );

        let registry = config.registry().unwrap();
        assert!(registry.resolve("g1", "brasil").is_ok());
        assert_eq!(
            registry.resolve("regions", "sp").unwrap().url,
            "https://g1.globo.com/dynamo/sp/sao-paulo/rss2.xml"
        );
    }

    #[test]
    fn test_registry_without_builtins() {
        let config = Config {
            builtin_platforms: false,
            ..Config::default()
        };
        let registry = config.registry().unwrap();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("g1", "brasil"),
            Err(RegistryError::PlatformNotFound)
        );
    }

    #[test]
    fn test_registry_rejects_invalid_url() {
        let mut config = Config::default();
        config.platforms.insert(
            "broken".into(),
            PlatformConfig {
                format: FeedFormat::Atom,
                topics: BTreeMap::from([("local".to_string(), "file:///etc/passwd".to_string())]),
            },
        );

        match config.registry() {
            Err(ConfigError::InvalidUrl { platform, topic, .. }) => {
                assert_eq!(platform, "broken");
                assert_eq!(topic, "local");
            }
            other => panic!("Expected InvalidUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/feedrelay.example.toml"));
        let config = Config::load(path).unwrap();
        let registry = config.registry().unwrap();
        assert!(registry.resolve("g1", "brasil").is_ok());
        assert!(registry.resolve("regions", "sp").is_ok());
        assert_eq!(
            registry.resolve("regions", "ac"),
            Err(RegistryError::TopicNotFound)
        );
    }

    #[test]
    fn test_registry_keeps_empty_url_as_unresolvable() {
        let mut config = Config::default();
        config.platforms.insert(
            "regions".into(),
            PlatformConfig {
                format: FeedFormat::Rss,
                topics: BTreeMap::from([("ac".to_string(), String::new())]),
            },
        );

        let registry = config.registry().unwrap();
        assert_eq!(
            registry.resolve("regions", "ac"),
            Err(RegistryError::TopicNotFound)
        );
    }
}
