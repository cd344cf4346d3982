//! Engine configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [cache]
//! initial_capacity = 64
//!
//! [members]
//! default_filter = "PUBLIC|INSTANCE|STATIC"
//!
//! [constructors]
//! non_public = false
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use mirror_types::MemberFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid value
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Root configuration (`mirror.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// `[cache]`
    pub cache: CacheConfig,
    /// `[members]`
    pub members: MembersConfig,
    /// `[constructors]`
    pub constructors: ConstructorConfig,
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Pre-sized capacity of a cache's key map
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
        }
    }
}

/// `[members]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembersConfig {
    /// Pipe-separated filter names
    pub default_filter: String,
}

impl Default for MembersConfig {
    fn default() -> Self {
        Self {
            default_filter: MemberFilter::DEFAULT.to_string(),
        }
    }
}

/// `[constructors]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorConfig {
    /// Resolver considers non-public constructors
    pub non_public: bool,
}

impl MirrorConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: MirrorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match MemberFilter::from_combined_str(&self.members.default_filter) {
            None => Err(ConfigError::Validation(format!(
                "unknown member filter: {}",
                self.members.default_filter
            ))),
            Some(filter) if filter.is_empty() => Err(ConfigError::Validation(
                "member filter selects nothing".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Parsed `[members] default_filter`
    pub fn default_filter(&self) -> MemberFilter {
        MemberFilter::from_combined_str(&self.members.default_filter).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MirrorConfig::from_str("").unwrap();
        assert_eq!(config, MirrorConfig::default());
        assert_eq!(config.cache.initial_capacity, 64);
        assert_eq!(config.default_filter(), MemberFilter::DEFAULT);
        assert!(!config.constructors.non_public);
    }

    #[test]
    fn test_partial_sections() {
        let config = MirrorConfig::from_str(
            r#"
[members]
default_filter = "PUBLIC|NON_PUBLIC|INSTANCE"

[constructors]
non_public = true
"#,
        )
        .unwrap();
        assert_eq!(
            config.default_filter(),
            MemberFilter::PUBLIC | MemberFilter::NON_PUBLIC | MemberFilter::INSTANCE
        );
        assert!(config.constructors.non_public);
        assert_eq!(config.cache.initial_capacity, 64);
    }

    #[test]
    fn test_invalid_filter() {
        let err = MirrorConfig::from_str("[members]\ndefault_filter = \"PUBLIC|SHINY\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = MirrorConfig::from_str("[members]\ndefault_filter = \"NONE\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = MirrorConfig::from_str("[cache]\ninitial_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
