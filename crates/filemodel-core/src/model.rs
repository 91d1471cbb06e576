//! Node traits implemented by concrete file formats
//!
//! The engine never inspects schema fields itself. A node lists its model
//! children through [`ModelNode::children`], a file-backed node exposes its
//! path state through [`FileModel::base`], and a loadable schema plugs into
//! the lifecycle through the hooks of [`FileSchema`].

use crate::arena::{ModelArena, ModelId};
use crate::lifecycle::ChildLoader;
use crate::options::SaveOptions;
use crate::resolver::ResolveMode;
use crate::Result;
use filemodel_fs::{PathStyle, RawData, RawStore, normalize, relative_to, render_path_style};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

/// Downcasting support for trait objects in the arena.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One model-bearing field of a node.
///
/// Singular fields are listed as zero- or one-element lists so traversal
/// handles them the same way as collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildField {
    pub name: &'static str,
    pub ids: Vec<ModelId>,
}

impl ChildField {
    pub fn one(name: &'static str, id: Option<ModelId>) -> Self {
        Self {
            name,
            ids: id.into_iter().collect(),
        }
    }

    pub fn many(name: &'static str, ids: &[ModelId]) -> Self {
        Self {
            name,
            ids: ids.to_vec(),
        }
    }
}

/// Any node stored in a [`ModelArena`].
pub trait ModelNode: AsAny + fmt::Debug + 'static {
    /// Short type name used in logs.
    fn kind(&self) -> &'static str;

    /// Model children in schema order.
    fn children(&self) -> Vec<ChildField> {
        Vec::new()
    }

    /// The file-backed view of this node, if it has one.
    fn file_model(&self) -> Option<&dyn FileModel> {
        None
    }

    fn file_model_mut(&mut self) -> Option<&mut dyn FileModel> {
        None
    }
}

/// Path state shared by every file-backed node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBase {
    /// Path as declared by the parent, possibly relative
    pub filepath: Option<PathBuf>,
    /// Directory a relative `filepath` is resolved against outside a load
    pub absolute_anchor: Option<PathBuf>,
    /// How relative paths inside this file are interpreted
    pub resolve_mode: ResolveMode,
}

impl FileBase {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: Some(filepath.into()),
            ..Self::default()
        }
    }

    /// Absolute location of the file, if it can be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let filepath = self.filepath.as_ref()?;
        if filepath.is_absolute() {
            return Some(normalize(filepath));
        }
        let anchor = self.absolute_anchor.as_ref()?;
        Some(normalize(&anchor.join(filepath)))
    }

    /// Directory part of the declared path (empty for a bare file name).
    pub fn declared_dir(&self) -> Option<PathBuf> {
        let filepath = self.filepath.as_ref()?;
        Some(filepath.parent().map(Path::to_path_buf).unwrap_or_default())
    }
}

/// Save side of a file-backed node. Object safe.
pub trait FileModel: ModelNode {
    fn base(&self) -> &FileBase;

    fn base_mut(&mut self) -> &mut FileBase;

    /// Default relative file name for a node whose path was never set.
    ///
    /// `None` means the node is not written while its path stays unset.
    fn default_name(&self) -> Option<PathBuf> {
        None
    }

    /// Write this node to `target`, whose directory already exists.
    fn save_raw(&self, target: &Path, models: &ModelArena, config: &SerializerConfig)
    -> Result<()>;
}

/// Load side of a file-backed node.
pub trait FileSchema: FileModel + Default + Sized {
    /// Read the raw key/value data of the file at `path`.
    fn read_raw(path: &Path) -> Result<RawData> {
        Ok(RawStore::new().load(path)?)
    }

    /// Resolve mode for this node's descendants, chosen from its raw data.
    fn resolve_mode(_raw: &RawData) -> ResolveMode {
        ResolveMode::ToParent
    }

    /// Build the node from raw data. Child files are loaded through `loader`,
    /// which already has this file's directory pushed.
    fn from_raw(raw: RawData, loader: &mut ChildLoader<'_>) -> Result<Self>;

    /// Runs after all children are constructed, before the directory frame
    /// is popped.
    fn post_init(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Settings handed to save hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerConfig {
    /// Separator style used when writing relative references
    pub path_style: PathStyle,
    /// Directory the node being written resolves its children against
    pub reference_dir: Option<PathBuf>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            path_style: PathStyle::host(),
            reference_dir: None,
        }
    }
}

impl From<&SaveOptions> for SerializerConfig {
    fn from(options: &SaveOptions) -> Self {
        Self {
            path_style: options.path_style,
            reference_dir: None,
        }
    }
}

impl SerializerConfig {
    /// The same settings, with references written relative to `dir`.
    pub fn with_reference_dir(&self, dir: impl Into<PathBuf>) -> Self {
        Self {
            reference_dir: Some(dir.into()),
            ..self.clone()
        }
    }

    /// Render a path reference in the configured style.
    pub fn render_path(&self, path: &Path) -> String {
        render_path_style(path, self.path_style)
    }

    /// How the node being written refers to the child `id`, rendered for
    /// output.
    ///
    /// A shared child keeps the path of whichever parent declared it first.
    /// When that path does not lead from
    /// [`reference_dir`](Self::reference_dir) to the child's resolved
    /// location, the reference is rebuilt relative to `reference_dir`.
    /// Absolute declarations stay absolute. `None` when the child is gone or
    /// has no path.
    pub fn child_reference(&self, models: &ModelArena, id: ModelId) -> Option<Value> {
        let base = models.file(id).ok()?.base();
        let declared = base.filepath.as_deref()?;

        let reference = match (&self.reference_dir, base.resolved_path()) {
            (Some(dir), Some(target))
                if !declared.is_absolute() && normalize(&dir.join(declared)) != target =>
            {
                relative_to(&target, dir).unwrap_or(target)
            }
            _ => declared.to_path_buf(),
        };
        Some(Value::String(self.render_path(&reference)))
    }

    /// References to every child in `ids` that has a path.
    pub fn child_references(&self, models: &ModelArena, ids: &[ModelId]) -> Value {
        Value::Array(
            ids.iter()
                .filter_map(|&id| self.child_reference(models, id))
                .collect(),
        )
    }

    /// Write raw data with the codec implied by the target's extension.
    pub fn write_raw(&self, target: &Path, raw: &RawData) -> Result<()> {
        RawStore::new().save(target, raw)?;
        Ok(())
    }
}
