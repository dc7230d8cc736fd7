//! Topic registry: the immutable platform → topic → feed URL table.
//!
//! A [`Registry`] is built once at startup (from the compiled-in defaults
//! and the configuration file) and shared read-only by every request.
//! Resolution is two-stage: the platform name selects a [`Platform`], then
//! the topic name selects a URL inside it. The two failure modes are kept
//! distinct so the HTTP layer can report which half of the path was wrong.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Lookup failures. The `Display` text is what clients see in the 404 body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Platform not found")]
    PlatformNotFound,
    #[error("Topic not found")]
    TopicNotFound,
}

// ============================================================================
// Types
// ============================================================================

/// XML schema an upstream platform publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    /// RSS 2.0 `<rss><channel><item>` documents.
    #[default]
    Rss,
    /// Atom `<feed><entry>` documents.
    Atom,
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFormat::Rss => f.write_str("rss"),
            FeedFormat::Atom => f.write_str("atom"),
        }
    }
}

/// One upstream content source and its topic table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platform {
    pub format: FeedFormat,
    pub topics: BTreeMap<String, String>,
}

impl Platform {
    pub fn new(format: FeedFormat) -> Self {
        Self {
            format,
            topics: BTreeMap::new(),
        }
    }

    /// Adds a topic, builder style.
    pub fn with_topic(mut self, topic: impl Into<String>, url: impl Into<String>) -> Self {
        self.topics.insert(topic.into(), url.into());
        self
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTopic<'a> {
    pub url: &'a str,
    pub format: FeedFormat,
}

/// Process-wide platform registry.
///
/// Platforms are an open set: adding one never touches [`Registry::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    platforms: BTreeMap<String, Platform>,
}

const G1_TOPICS: &[(&str, &str)] = &[
    ("brasil", "https://g1.globo.com/dynamo/brasil/rss2.xml"),
    ("carros", "https://g1.globo.com/dynamo/carros/rss2.xml"),
    (
        "ciencia-e-saude",
        "https://g1.globo.com/dynamo/ciencia-e-saude/rss2.xml",
    ),
    (
        "concursos-e-emprego",
        "https://g1.globo.com/dynamo/concursos-e-emprego/rss2.xml",
    ),
];

const BBC_TOPICS: &[(&str, &str)] = &[
    (
        "brasil",
        "http://www.bbc.co.uk/portuguese/topicos/brasil/index.xml",
    ),
    (
        "america_latina",
        "http://www.bbc.co.uk/portuguese/topicos/america_latina/index.xml",
    ),
    (
        "internacional",
        "http://www.bbc.co.uk/portuguese/topicos/internacional/index.xml",
    ),
];

impl Registry {
    /// An empty registry; every lookup fails with `PlatformNotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in platforms (`g1` as RSS, `bbc` as Atom).
    pub fn builtin() -> Self {
        Self::new()
            .with_platform("g1", static_platform(FeedFormat::Rss, G1_TOPICS))
            .with_platform("bbc", static_platform(FeedFormat::Atom, BBC_TOPICS))
    }

    /// Adds or replaces a platform, builder style.
    pub fn with_platform(mut self, name: impl Into<String>, platform: Platform) -> Self {
        self.insert(name, platform);
        self
    }

    /// Adds or replaces a platform. Returns the platform it displaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, platform: Platform) -> Option<Platform> {
        self.platforms.insert(name.into(), platform)
    }

    /// Resolves `(platform, topic)` to its upstream URL and format.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::PlatformNotFound`] if `platform` is not registered
    /// - [`RegistryError::TopicNotFound`] if the platform exists but `topic`
    ///   is absent or mapped to an empty URL
    pub fn resolve(&self, platform: &str, topic: &str) -> Result<ResolvedTopic<'_>, RegistryError> {
        let entry = self.platform(platform)?;

        match entry.topics.get(topic) {
            Some(url) if !url.is_empty() => Ok(ResolvedTopic {
                url: url.as_str(),
                format: entry.format,
            }),
            _ => Err(RegistryError::TopicNotFound),
        }
    }

    /// Looks up a platform by name.
    pub fn platform(&self, name: &str) -> Result<&Platform, RegistryError> {
        self.platforms
            .get(name)
            .ok_or(RegistryError::PlatformNotFound)
    }

    /// Resolvable topic names of a platform, sorted. Empty-URL entries are skipped.
    pub fn topics(&self, platform: &str) -> Result<Vec<&str>, RegistryError> {
        Ok(self
            .platform(platform)?
            .topics
            .iter()
            .filter(|(_, url)| !url.is_empty())
            .map(|(topic, _)| topic.as_str())
            .collect())
    }

    /// Iterates platforms in name order.
    pub fn platforms(&self) -> impl Iterator<Item = (&str, &Platform)> {
        self.platforms.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

fn static_platform(format: FeedFormat, topics: &[(&str, &str)]) -> Platform {
    topics
        .iter()
        .fold(Platform::new(format), |p, (topic, url)| p.with_topic(*topic, *url))
}

// ============================================================================
// Tests
// ============================================================================
