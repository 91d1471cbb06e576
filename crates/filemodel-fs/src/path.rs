//! Path style conversion and lexical normalization
//!
//! Files written on one platform may declare relative references using the
//! separators of another. References are converted from their declared
//! style to the host style on the way in, and rendered in a requested style
//! on the way out.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Separator convention of a path string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// Forward slashes, absolute paths start with `/`
    Unix,
    /// Backslashes, absolute paths start with a drive letter or `\\`
    Windows,
}

impl PathStyle {
    /// The convention of the operating system we are running on.
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Get the string representation of the style.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::Windows => "windows",
        }
    }

    fn separator(&self) -> char {
        match self {
            Self::Unix => '/',
            Self::Windows => '\\',
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for PathStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PathStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "windows" => Ok(Self::Windows),
            _ => Err(Error::UnsupportedPathStyle {
                style: s.to_string(),
            }),
        }
    }
}

/// Check whether `path` is absolute when read with the conventions of `style`.
///
/// This is independent of the host: `C:\data` is absolute in Windows style
/// even when running on Linux.
pub fn is_absolute_in_style(path: &str, style: PathStyle) -> bool {
    match style {
        PathStyle::Unix => path.starts_with('/'),
        PathStyle::Windows => {
            let bytes = path.as_bytes();
            let has_drive = bytes.len() >= 3
                && bytes[0].is_ascii_alphabetic()
                && bytes[1] == b':'
                && (bytes[2] == b'\\' || bytes[2] == b'/');
            has_drive || path.starts_with("\\\\") || path.starts_with("//")
        }
    }
}

fn convert_separators(path: &str, from: PathStyle, to: PathStyle) -> String {
    if from == to {
        return path.to_string();
    }
    path.replace(from.separator(), &to.separator().to_string())
}

/// Convert a declared relative path to the host style.
///
/// Absolute paths are returned unchanged.
pub fn convert_path_style(path: &str, declared: PathStyle) -> PathBuf {
    if is_absolute_in_style(path, declared) {
        return PathBuf::from(path);
    }
    PathBuf::from(convert_separators(path, declared, PathStyle::host()))
}

/// Render a host path with the separators of `target`.
pub fn render_path_style(path: &Path, target: PathStyle) -> String {
    let text = path.to_string_lossy();
    if path.is_absolute() {
        return text.into_owned();
    }
    convert_separators(&text, PathStyle::host(), target)
}

/// Lexically normalize a path.
///
/// Drops `.` components and folds `..` into the preceding normal component.
/// A `..` directly under the root of an absolute path is discarded; leading
/// `..` components of a relative path are kept. No filesystem access.
pub fn normalize(path: &Path) -> PathBuf {
    let path = dunce::simplified(path);
    let mut out = PathBuf::new();
    let mut normals = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if normals > 0 {
                    out.pop();
                    normals -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                normals += 1;
            }
        }
    }

    out
}

/// Lexical path of `path` as seen from the directory `base`.
///
/// Both are normalized first. `None` when the two do not share a root, or
/// when `base` climbs above its root with leading `..` components.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = normalize(path);
    let base = normalize(base);
    if path.has_root() != base.has_root() {
        return None;
    }

    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();
    while let (Some(a), Some(b)) = (path_components.peek(), base_components.peek()) {
        if a != b {
            break;
        }
        path_components.next();
        base_components.next();
    }

    let mut out = PathBuf::new();
    for component in base_components {
        match component {
            Component::Normal(_) => out.push(".."),
            _ => return None,
        }
    }
    for component in path_components {
        match component {
            Component::Normal(name) => out.push(name),
            Component::ParentDir => out.push(".."),
            _ => return None,
        }
    }
    Some(out)
}
