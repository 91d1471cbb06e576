//! Case-insensitive path lookup
//!
//! Model files are frequently authored on case-insensitive filesystems, so a
//! reference such as `Sub/Child.CFG` may point at `sub/child.cfg` on disk.
//! The resolver finds the entry that actually exists, one component at a time.

use crate::{Error, Result};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Operating system family, as far as casing behaviour is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OperatingSystem {
    /// Detect the operating system we are running on.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }

    /// Whether the default filesystem of this platform ignores case.
    pub fn is_case_insensitive(&self) -> bool {
        matches!(self, Self::Windows | Self::MacOs)
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Other => std::env::consts::OS,
        };
        write!(f, "{}", name)
    }
}

/// Finds the on-disk spelling of a path whose letter case may be wrong.
#[derive(Debug, Clone, Copy)]
pub struct CasingResolver {
    os: OperatingSystem,
}

impl Default for CasingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CasingResolver {
    /// Create a resolver for the current operating system.
    pub fn new() -> Self {
        Self::for_os(OperatingSystem::current())
    }

    /// Create a resolver that behaves as on `os`.
    pub fn for_os(os: OperatingSystem) -> Self {
        Self { os }
    }

    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    /// Resolve `path` to the casing of the entries that exist on disk.
    ///
    /// Case-insensitive platforms return the input unchanged. Components
    /// past the first one that cannot be matched are kept as given.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        match self.os {
            OperatingSystem::Windows | OperatingSystem::MacOs => Ok(path.to_path_buf()),
            OperatingSystem::Linux => Ok(resolve_component_wise(path)),
            OperatingSystem::Other => Err(Error::UnsupportedCasingPlatform {
                os: self.os.to_string(),
            }),
        }
    }
}

fn resolve_component_wise(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    let mut components = path.components();

    while let Some(component) = components.next() {
        let Component::Normal(name) = component else {
            resolved.push(component.as_os_str());
            continue;
        };

        let candidate = resolved.join(name);
        if candidate.exists() {
            resolved = candidate;
            continue;
        }

        match find_case_insensitive(&resolved, &name.to_string_lossy()) {
            Some(actual) => resolved.push(actual),
            None => {
                tracing::trace!(
                    path = %path.display(),
                    missing = %name.to_string_lossy(),
                    "No case-insensitive match; keeping remainder as given"
                );
                resolved.push(name);
                resolved.extend(components);
                break;
            }
        }
    }

    resolved
}

fn find_case_insensitive(dir: &Path, name: &str) -> Option<OsString> {
    let lookup_dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let wanted = name.to_lowercase();

    let mut matches: Vec<OsString> = fs::read_dir(lookup_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .filter(|entry| entry.to_string_lossy().to_lowercase() == wanted)
        .collect();
    matches.sort();
    matches.into_iter().next()
}
