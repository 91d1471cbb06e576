//! Load and save options
//!
//! Options can be built in code or parsed from a TOML engine configuration:
//!
//! ```toml
//! [load]
//! recurse = true
//! resolve_casing = false
//! path_style = "unix"
//!
//! [save]
//! recurse = true
//! path_style = "windows"
//! ```
//!
//! Missing tables and keys fall back to their defaults.

use crate::{Error, Result};
use filemodel_fs::PathStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Options for loading a model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Parse every referenced child file instead of leaving stubs
    #[serde(default = "default_true")]
    pub recurse: bool,

    /// Find the on-disk casing of referenced paths
    #[serde(default)]
    pub resolve_casing: bool,

    /// Separator style relative paths are declared in
    #[serde(default)]
    pub path_style: PathStyle,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            recurse: true,
            resolve_casing: false,
            path_style: PathStyle::host(),
        }
    }
}

impl LoadOptions {
    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn resolve_casing(mut self, resolve_casing: bool) -> Self {
        self.resolve_casing = resolve_casing;
        self
    }

    pub fn path_style(mut self, path_style: PathStyle) -> Self {
        self.path_style = path_style;
        self
    }
}

/// Options for saving a model tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Save every file-backed descendant, not only the root
    #[serde(default)]
    pub recurse: bool,

    /// Separator style for relative references written out
    #[serde(default)]
    pub path_style: PathStyle,
}

impl SaveOptions {
    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn path_style(mut self, path_style: PathStyle) -> Self {
        self.path_style = path_style;
        self
    }
}

/// Engine configuration parsed from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub load: LoadOptions,

    #[serde(default)]
    pub save: SaveOptions,
}

impl EngineConfig {
    /// Parse a configuration from TOML content.
    ///
    /// # Example
    ///
    /// ```
    /// use filemodel_core::EngineConfig;
    ///
    /// let config = EngineConfig::parse(r#"
    /// [load]
    /// recurse = false
    /// "#).unwrap();
    ///
    /// assert!(!config.load.recurse);
    /// assert!(!config.save.recurse);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| filemodel_fs::Error::io(path, e))?;
        tracing::debug!(path = %path.display(), "Loading engine config");
        Self::parse(&content).map_err(|e| match e {
            Error::TomlDe(source) => Error::Fs(filemodel_fs::Error::ConfigParse {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: source.to_string(),
            }),
            other => other,
        })
    }
}
