//! Filesystem leaf components for the filemodel engine
//!
//! Provides content checksums, case-insensitive path lookup, path style
//! conversion, atomic I/O and the raw key/value codec used by file formats.

pub mod casing;
pub mod checksum;
pub mod error;
pub mod io;
pub mod path;
pub mod raw;

pub use casing::{CasingResolver, OperatingSystem};
pub use checksum::{ChecksumSource, Sha256Checksum};
pub use error::{Error, Result};
pub use path::{PathStyle, convert_path_style, normalize, relative_to, render_path_style};
pub use io::WriteOutcome;
pub use raw::{RawData, RawStore};
