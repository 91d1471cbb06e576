//! Path resolution, identity caching and recursive load/save for file-backed
//! model trees
//!
//! This crate turns a hierarchy of configuration files into a typed tree of
//! nodes and writes that tree back out, implementing:
//!
//! - **Path resolution**: a stack of directory frames that interprets the
//!   relative paths found inside each file, with sticky anchors
//! - **Identity caching**: at most one live node per absolute path, refreshed
//!   only when the file's content hash changes
//! - **Arena ownership**: nodes addressed by generational handles, shareable
//!   between several parents
//! - **Two-pass saving**: name generation followed by a write pass that
//!   relocates children together with their parents
//!
//! # Architecture
//!
//! `filemodel-core` sits above the filesystem leaf crate and below the
//! concrete file formats, which plug in through [`FileSchema`] and
//! [`FileModel`]:
//!
//! ```text
//!           file formats (schemas)
//!                    |
//!             filemodel-core
//!                    |
//!              filemodel-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use filemodel_core::{LoadOptions, ModelArena, SaveOptions, load, save_as};
//!
//! let mut models = ModelArena::new();
//! let root = load::<MyFormat>(&mut models, "/m/root.json", &LoadOptions::default())?;
//! save_as(&mut models, root, "/out/root.json", &SaveOptions::default().recurse(true))?;
//! ```

pub mod arena;
pub mod cache;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod options;
pub mod resolver;
pub mod traverse;

pub use arena::{ModelArena, ModelId};
pub use cache::{CacheEntry, ModelCache};
pub use context::{FrameGuard, LoadContext, LoadSettings};
pub use error::{Error, Result};
pub use lifecycle::{
    ChildLoader, generate_names, load, load_with, new_model, save, save_as, save_with, write_tree,
};
pub use model::{AsAny, ChildField, FileBase, FileModel, FileSchema, ModelNode, SerializerConfig};
pub use options::{EngineConfig, LoadOptions, SaveOptions};
pub use resolver::{PathFrame, PathResolver, ResolveMode};
pub use traverse::TreeTraverser;

pub use filemodel_fs::{PathStyle, RawData};
