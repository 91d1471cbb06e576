//! Load and save orchestration
//!
//! # Loading
//!
//! A requested path is converted to the host style, resolved against the
//! current parent and casing-corrected. If the cache holds a live node for
//! the result and the file content is unchanged, that handle is returned.
//! Once the cache holds anything and the settings do not ask for recursion,
//! new paths become registered stubs that are never read. Otherwise the raw
//! data is read, a handle is reserved and registered, the
//! file's own directory is pushed and the schema builds itself, loading its
//! children through a [`ChildLoader`]. The frame is popped on every exit
//! path, and a failing node is removed from both the arena and the cache.
//!
//! # Saving
//!
//! A recursive save runs two passes over the tree:
//!
//! 1. [`generate_names`] gives every unnamed file-backed node its default
//!    name. It has to finish before the second pass, which needs every path
//!    to place its children.
//! 2. [`write_tree`] pushes each node's directory on the way down. On the way
//!    back up it pops it, records the parent's directory as the node's anchor
//!    and writes the node there, with child references made relative to the
//!    directory that was just popped.
//!
//! A non-recursive save only writes the root.

use crate::arena::{ModelArena, ModelId};
use crate::context::{LoadContext, LoadSettings};
use crate::model::{FileModel, FileSchema, ModelNode, SerializerConfig};
use crate::options::{LoadOptions, SaveOptions};
use crate::resolver::ResolveMode;
use crate::traverse::TreeTraverser;
use crate::{Error, Result};
use filemodel_fs::{RawData, normalize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

/// Loads the children of a node while its directory frame is active.
///
/// Handed to [`FileSchema::from_raw`].
#[derive(Debug)]
pub struct ChildLoader<'a> {
    ctx: &'a mut LoadContext,
    models: &'a mut ModelArena,
}

impl<'a> ChildLoader<'a> {
    pub fn new(ctx: &'a mut LoadContext, models: &'a mut ModelArena) -> Self {
        Self { ctx, models }
    }

    /// Load the file at `path`, relative to the node being built.
    pub fn load<C: FileSchema>(&mut self, path: impl AsRef<Path>) -> Result<ModelId> {
        load_node::<C>(self.ctx, self.models, path.as_ref())
    }

    /// Load the file named by the string at `key`, if there is one.
    pub fn load_optional<C: FileSchema>(
        &mut self,
        raw: &RawData,
        key: &str,
    ) -> Result<Option<ModelId>> {
        match raw.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(path)) => self.load::<C>(path).map(Some),
            Some(other) => Err(Error::invalid(format!(
                "`{key}` must be a file path, found {other}"
            ))),
        }
    }

    /// Load every file named by the list of strings at `key`.
    pub fn load_many<C: FileSchema>(&mut self, raw: &RawData, key: &str) -> Result<Vec<ModelId>> {
        let paths = match raw.get(key) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(paths)) => paths,
            Some(other) => {
                return Err(Error::invalid(format!(
                    "`{key}` must be a list of file paths, found {other}"
                )));
            }
        };

        paths
            .iter()
            .map(|value| match value {
                Value::String(path) => self.load::<C>(path),
                other => Err(Error::invalid(format!(
                    "`{key}` entries must be file paths, found {other}"
                ))),
            })
            .collect()
    }

    /// Store a node that has no file of its own.
    pub fn insert<N: ModelNode>(&mut self, node: N) -> ModelId {
        self.models.insert(node)
    }

    pub fn arena(&self) -> &ModelArena {
        self.models
    }

    pub fn arena_mut(&mut self) -> &mut ModelArena {
        self.models
    }

    pub fn context(&self) -> &LoadContext {
        self.ctx
    }
}

/// Load a model tree rooted at `path` in a fresh context.
pub fn load<T: FileSchema>(
    models: &mut ModelArena,
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<ModelId> {
    let mut ctx = LoadContext::new();
    load_with::<T>(&mut ctx, models, path, options)
}

/// Load a model tree within an existing context.
///
/// The context keeps the settings of the first call that initialized it, so
/// `options` are ignored when nested under another load.
pub fn load_with<T: FileSchema>(
    ctx: &mut LoadContext,
    models: &mut ModelArena,
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<ModelId> {
    ctx.initialize_settings(LoadSettings::from(options));
    load_node::<T>(ctx, models, path.as_ref())
}

/// Create an empty, pathless node.
pub fn new_model<T: FileModel + Default>(models: &mut ModelArena) -> ModelId {
    models.insert(T::default())
}

fn load_node<T: FileSchema>(
    ctx: &mut LoadContext,
    models: &mut ModelArena,
    declared: &Path,
) -> Result<ModelId> {
    let declared = ctx.convert_path_style(declared)?;
    let absolute = normalize(&ctx.resolve(&declared));
    let absolute = ctx.resolve_casing_for(&absolute)?;

    if let Some(id) = ctx.retrieve_or_none(&absolute, models) {
        if !ctx.is_content_changed(&absolute) {
            // A pending node is an ancestor still being built
            if models.is_pending(id) || models.get::<T>(id).is_some() {
                debug!(path = %absolute.display(), %id, "Cache hit");
                return Ok(id);
            }
            return Err(Error::KindMismatch {
                id,
                expected: std::any::type_name::<T>(),
            });
        }
        debug!(path = %absolute.display(), %id, "File content changed; reloading");
    }

    let anchor = ctx.current_parent();
    let filepath = corrected_declaration(&declared, &absolute);

    if !ctx.should_load()? {
        debug!(path = %absolute.display(), "Creating stub without reading");
        let mut stub = T::default();
        assign_base(&mut stub, filepath, anchor, ResolveMode::default());
        let id = models.insert(stub);
        ctx.register_model(&absolute, id);
        return Ok(id);
    }

    if !absolute.is_file() {
        return Err(Error::NotFound { path: absolute });
    }

    let raw = T::read_raw(&absolute).map_err(|e| {
        error!(path = %absolute.display(), error = %e, "Failed to read model");
        e.at_path(&absolute)
    })?;
    let mode = T::resolve_mode(&raw);

    let id = models.reserve();
    ctx.register_model(&absolute, id);
    debug!(path = %absolute.display(), %id, ?mode, "Loading model");

    let dir = absolute.parent().unwrap_or(&absolute).to_path_buf();
    match construct::<T>(ctx, models, &dir, mode, raw) {
        Ok(mut node) => {
            assign_base(&mut node, filepath, anchor, mode);
            models.fill(id, Box::new(node))?;
            Ok(id)
        }
        Err(e) => {
            error!(path = %absolute.display(), error = %e, "Failed to load model");
            models.release(id);
            ctx.forget_model(&absolute);
            Err(e.at_path(&absolute))
        }
    }
}

fn construct<T: FileSchema>(
    ctx: &mut LoadContext,
    models: &mut ModelArena,
    dir: &Path,
    mode: ResolveMode,
    raw: RawData,
) -> Result<T> {
    let mut frame = ctx.enter_frame(dir, mode);
    let mut loader = ChildLoader::new(&mut frame, models);
    let mut node = T::from_raw(raw, &mut loader)?;
    node.post_init()?;
    Ok(node)
}

fn assign_base<T: FileModel>(node: &mut T, filepath: PathBuf, anchor: PathBuf, mode: ResolveMode) {
    let base = node.base_mut();
    base.filepath = Some(filepath);
    base.absolute_anchor = Some(anchor);
    base.resolve_mode = mode;
}

/// The path to remember for a node, given how it was declared and where it
/// was actually found.
///
/// Relative declarations stay relative. When casing correction changed the
/// on-disk components, the corrected components replace the declared ones.
fn corrected_declaration(declared: &Path, absolute: &Path) -> PathBuf {
    if declared.is_absolute() {
        return absolute.to_path_buf();
    }

    let components = declared.components().count();
    let plain = declared
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if plain {
        let mut tail: Vec<Component<'_>> = absolute.components().rev().take(components).collect();
        tail.reverse();
        return tail.into_iter().collect();
    }

    match absolute.file_name() {
        Some(name) => declared.with_file_name(name),
        None => declared.to_path_buf(),
    }
}

/// Save the tree rooted at `root` in a fresh context.
pub fn save(models: &mut ModelArena, root: ModelId, options: &SaveOptions) -> Result<()> {
    let mut ctx = LoadContext::new();
    save_with(&mut ctx, models, root, options)
}

/// Point `root` at `path`, then save it.
pub fn save_as(
    models: &mut ModelArena,
    root: ModelId,
    path: impl Into<PathBuf>,
    options: &SaveOptions,
) -> Result<()> {
    let path = path.into();
    debug!(%root, path = %path.display(), "Saving model under new path");
    models.file_mut(root)?.base_mut().filepath = Some(path);
    save(models, root, options)
}

/// Save the tree rooted at `root` within an existing context.
pub fn save_with(
    ctx: &mut LoadContext,
    models: &mut ModelArena,
    root: ModelId,
    options: &SaveOptions,
) -> Result<()> {
    let config = SerializerConfig::from(options);
    name_node(models.file_mut(root)?);

    if options.recurse {
        generate_names(models, root)?;
        return write_tree(ctx, models, root, &config);
    }

    let file = models.file_mut(root)?;
    if file.base().absolute_anchor.is_none() {
        file.base_mut().absolute_anchor = Some(ctx.current_parent());
    }
    let base = file.base();
    let reference_dir = match base.resolved_path() {
        Some(target) => {
            let dir = target.parent().unwrap_or(&target);
            ctx.enter_frame(dir, base.resolve_mode).current_parent()
        }
        None => ctx.current_parent(),
    };
    write_node(models, root, &config.with_reference_dir(reference_dir))
}

fn name_node(file: &mut dyn FileModel) -> bool {
    if file.base().filepath.is_some() {
        return false;
    }
    match file.default_name() {
        Some(name) => {
            debug!(kind = file.kind(), name = %name.display(), "Generated file name");
            file.base_mut().filepath = Some(name);
            true
        }
        None => false,
    }
}

/// Give every unnamed file-backed node under `root` its default name.
///
/// Returns the number of nodes named.
pub fn generate_names(models: &mut ModelArena, root: ModelId) -> Result<usize> {
    TreeTraverser::new()
        .should_visit(|node: &dyn ModelNode, _| node.file_model().is_some())
        .post_visit(|models: &mut ModelArena, id, named: usize| {
            let file = models.file_mut(id)?;
            Ok(if name_node(file) { named + 1 } else { named })
        })
        .traverse(models, root, 0)
}

/// Write every file-backed node under `root`, children before parents.
///
/// Nodes without a path are skipped. The resolver stack of `ctx` is back at
/// its starting depth when this returns, whether or not a write failed.
pub fn write_tree(
    ctx: &mut LoadContext,
    models: &mut ModelArena,
    root: ModelId,
    config: &SerializerConfig,
) -> Result<()> {
    let start = ctx.frame_depth();
    if let Some(anchor) = models.file(root)?.base().absolute_anchor.clone() {
        ctx.push_frame(&anchor, ResolveMode::ToParent);
    }

    let result = TreeTraverser::<&mut LoadContext>::new()
        .should_visit(|node, _| node.file_model().is_some())
        .pre_visit(|models, id, ctx| {
            let base = models.file(id)?.base();
            if let Some(filepath) = &base.filepath {
                let dir = filepath.parent().unwrap_or_else(|| Path::new(""));
                ctx.push_frame(dir, base.resolve_mode);
            }
            Ok(ctx)
        })
        .post_visit(|models, id, ctx| {
            let reference_dir = ctx.current_parent();
            if models.file(id)?.base().filepath.is_some() {
                ctx.pop_frame();
            }
            let anchor = ctx.current_parent();
            models.file_mut(id)?.base_mut().absolute_anchor = Some(anchor);
            write_node(models, id, &config.with_reference_dir(reference_dir))?;
            Ok(ctx)
        })
        .traverse(models, root, &mut *ctx)
        .map(|_| ());

    ctx.truncate_frames(start);
    result
}

fn write_node(models: &ModelArena, id: ModelId, config: &SerializerConfig) -> Result<()> {
    let file = models.file(id)?;
    let Some(target) = file.base().resolved_path() else {
        debug!(%id, kind = file.kind(), "Skipping model without a path");
        return Ok(());
    };

    filemodel_fs::io::ensure_parent_dir(&target)?;
    debug!(%id, path = %target.display(), "Writing model");
    file.save_raw(&target, models, config).map_err(|e| {
        error!(path = %target.display(), error = %e, "Failed to save model");
        e.at_path(&target)
    })
}
