//! Resolver configuration

use anyhow::{Context, Result};
use rv_entity::LanguageVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language and feature switches consulted by the resolver
///
/// Every key is optional in the TOML form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// When off, every lookup behaves as if access control were ignored
    pub enable_access_control: bool,

    /// Ask lazy loaders for single names before falling back to full loads
    pub named_lazy_member_loading: bool,

    /// Language mode used for version-specific availability
    pub effective_language_version: LanguageVersion,

    /// Tie-break policy of shadow removal
    pub shadowing: ShadowingPolicy,

    /// Record referenced names per source file
    pub enable_dependency_tracking: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enable_access_control: true,
            named_lazy_member_loading: true,
            effective_language_version: LanguageVersion::default(),
            shadowing: ShadowingPolicy::default(),
            enable_dependency_tracking: true,
        }
    }
}

/// Configurable precedence rules of shadow removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowingPolicy {
    /// A member declared on a concrete type hides a same-signature member
    /// declared in a protocol or protocol extension
    pub prefer_concrete_over_protocol: bool,
}

impl Default for ShadowingPolicy {
    fn default() -> Self {
        Self {
            prefer_concrete_over_protocol: true,
        }
    }
}

impl ResolverConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a key has the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse resolver configuration")
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolver config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid resolver config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = ResolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert!(config.enable_access_control);
        assert_eq!(config.effective_language_version, LanguageVersion::new(5, 0));
    }

    #[test]
    fn test_parse_overrides() {
        let config = ResolverConfig::from_toml_str(
            r#"
            enable_access_control = false
            named_lazy_member_loading = false

            [effective_language_version]
            major = 4
            minor = 2

            [shadowing]
            prefer_concrete_over_protocol = false
            "#,
        )
        .unwrap();

        assert!(!config.enable_access_control);
        assert!(!config.named_lazy_member_loading);
        assert!(config.enable_dependency_tracking);
        assert_eq!(config.effective_language_version, LanguageVersion::new(4, 2));
        assert!(!config.shadowing.prefer_concrete_over_protocol);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(ResolverConfig::from_toml_str("enable_access_control = 3").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolver.toml");
        std::fs::write(&path, "enable_dependency_tracking = false\n").unwrap();

        let config = ResolverConfig::from_file(&path).unwrap();
        assert!(!config.enable_dependency_tracking);

        let missing = ResolverConfig::from_file(&dir.path().join("missing.toml"));
        assert!(missing.unwrap_err().to_string().contains("Failed to read resolver config"));
    }
}
