// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire constants and runtime configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire-format constants shared by writer and reader
//! - **Level 2 (Dynamic)**: [`Config`] with derivation and decoding limits,
//!   loadable from YAML
//!
//! # Example YAML
//!
//! ```yaml
//! derive:
//!   inline_by_value_threshold: 16
//! codec:
//!   max_collection_len: 65536
//!   max_string_len: 1048576
//!   max_depth: 32
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

// =======================================================================
// Wire format
// =======================================================================

/// Size of an out-of-line reference stored in a record header slot.
pub const REFERENCE_SIZE: u32 = 4;

/// Offset meaning "the wire carries no data for this field".
pub const MISSING_FIELD_OFFSET: u32 = 0xFFFF_FFFF;

/// Inline composites at or below this size sit in the record header.
pub const DEFAULT_INLINE_BY_VALUE_THRESHOLD: u32 = 8;

/// Upper bound on a decoded list/map element count.
pub const DEFAULT_MAX_COLLECTION_LEN: u32 = 1 << 24;

/// Upper bound on a decoded string/byte-string length.
pub const DEFAULT_MAX_STRING_LEN: u32 = 1 << 28;

/// Upper bound on record/container nesting while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Pre-allocation cap for decoded collections (the count field is untrusted).
pub const PREALLOC_LIMIT: usize = 4096;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Schema derivation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    /// Largest inline composite stored by value in a record header.
    pub inline_by_value_threshold: u32,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            inline_by_value_threshold: DEFAULT_INLINE_BY_VALUE_THRESHOLD,
        }
    }
}

/// Decoding limits. Every length or count read from a stream is checked
/// against these before anything is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub max_collection_len: u32,
    pub max_string_len: u32,
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub derive: DeriveConfig,
    pub codec: CodecConfig,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_depth == 0 {
            return Err(ConfigError::Invalid("codec.max_depth must be > 0".into()));
        }
        Ok(())
    }
}
