//! Format-agnostic raw data loading and saving
//!
//! Raw data is the flat key/value structure exchanged between the model
//! engine and concrete file formats. The codec is picked from the file
//! extension.

use crate::io::{self, WriteOutcome};
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Flat key/value structure read from or written to a model file.
///
/// Keys are kept sorted, which makes written output deterministic.
pub type RawData = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Toml,
    Json,
    Yaml,
}

impl Codec {
    fn for_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

/// Format-agnostic raw data store.
///
/// Format is detected from file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStore;

impl RawStore {
    pub fn new() -> Self {
        Self
    }

    /// Load raw data from a file.
    ///
    /// An empty file yields an empty map. A document whose top level is not
    /// a table/object is rejected.
    pub fn load(&self, path: &Path) -> Result<RawData> {
        let codec = Codec::for_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.parse(path, codec, &content)
    }

    fn parse(&self, path: &Path, codec: Codec, content: &str) -> Result<RawData> {
        if content.trim().is_empty() {
            return Ok(RawData::new());
        }

        let parse_error = |message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            format: codec.name().into(),
            message,
        };

        let value: Value = match codec {
            Codec::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Codec::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Codec::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(RawData::new()),
            other => Err(parse_error(format!(
                "expected a table at the top level, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// Serialize raw data to the text of the format implied by `path`.
    pub fn render(&self, path: &Path, raw: &RawData) -> Result<String> {
        let codec = Codec::for_path(path)?;
        let serialize_error = |message: String| Error::ConfigSerialize {
            path: path.to_path_buf(),
            format: codec.name().into(),
            message,
        };

        match codec {
            Codec::Toml => toml::to_string(raw).map_err(|e| serialize_error(e.to_string())),
            Codec::Json => serde_json::to_string_pretty(raw)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| serialize_error(e.to_string())),
            Codec::Yaml => serde_yaml::to_string(raw).map_err(|e| serialize_error(e.to_string())),
        }
    }

    /// Save raw data to a file.
    ///
    /// Format is determined from file extension. The file is replaced
    /// atomically, and only when the rendered text differs from what is
    /// already there.
    pub fn save(&self, path: &Path, raw: &RawData) -> Result<WriteOutcome> {
        let content = self.render(path, raw)?;
        io::write_if_changed(path, content.as_bytes())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
