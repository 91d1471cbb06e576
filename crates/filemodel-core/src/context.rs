//! Per-session load context
//!
//! A [`LoadContext`] is created by the outermost load or save call and passed
//! by `&mut` to every nested one, so all nodes constructed during one session
//! share a single path resolver and model cache. It is dropped when the
//! outermost call returns.

use crate::arena::{ModelArena, ModelId};
use crate::cache::ModelCache;
use crate::options::LoadOptions;
use crate::resolver::{PathResolver, ResolveMode};
use crate::{Error, Result};
use filemodel_fs::{CasingResolver, ChecksumSource, PathStyle, convert_path_style};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Settings fixed for the lifetime of a load context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSettings {
    pub recurse: bool,
    pub resolve_casing: bool,
    pub path_style: PathStyle,
}

impl From<&LoadOptions> for LoadSettings {
    fn from(options: &LoadOptions) -> Self {
        Self {
            recurse: options.recurse,
            resolve_casing: options.resolve_casing,
            path_style: options.path_style,
        }
    }
}

/// Shared state of one load/save session.
#[derive(Debug, Default)]
pub struct LoadContext {
    resolver: PathResolver,
    cache: ModelCache,
    settings: Option<LoadSettings>,
    casing: CasingResolver,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `resolver` instead of one rooted at the working directory.
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Hash file content with `source` for change detection.
    pub fn with_checksum_source(mut self, source: Box<dyn ChecksumSource>) -> Self {
        self.cache = ModelCache::with_source(source);
        self
    }

    pub fn with_casing_resolver(mut self, casing: CasingResolver) -> Self {
        self.casing = casing;
        self
    }

    /// Set the load settings. Only the first call has an effect.
    ///
    /// Returns whether this call set them.
    pub fn initialize_settings(&mut self, settings: LoadSettings) -> bool {
        if self.settings.is_some() {
            tracing::trace!(?settings, "Load settings already initialized; ignoring");
            return false;
        }
        tracing::debug!(?settings, "Initialized load settings");
        self.settings = Some(settings);
        true
    }

    pub fn settings(&self) -> Result<LoadSettings> {
        self.settings.ok_or(Error::NotInitialized)
    }

    /// Resolve `path` against the current parent directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.resolver.resolve(path)
    }

    /// The cached handle for `path`, if it is still live.
    ///
    /// Entries whose node has been dropped from the arena are pruned here.
    pub fn retrieve_or_none(&mut self, path: &Path, models: &ModelArena) -> Option<ModelId> {
        let absolute = self.resolve(path);
        let id = self.cache.lookup(&absolute)?;
        if models.contains(id) {
            return Some(id);
        }
        tracing::debug!(path = %absolute.display(), %id, "Pruning stale cache entry");
        self.cache.forget(&absolute);
        None
    }

    pub fn register_model(&mut self, path: &Path, id: ModelId) {
        let absolute = self.resolve(path);
        self.cache.register(&absolute, id);
    }

    pub fn forget_model(&mut self, path: &Path) {
        let absolute = self.resolve(path);
        self.cache.forget(&absolute);
    }

    pub fn is_content_changed(&self, path: &Path) -> bool {
        self.cache.has_changed(&self.resolve(path))
    }

    pub fn cache_is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Whether a newly requested file should be parsed rather than stubbed.
    pub fn should_load(&self) -> Result<bool> {
        Ok(self.cache.is_empty() || self.settings()?.recurse)
    }

    /// Correct the casing of `path` when the settings ask for it.
    pub fn resolve_casing_for(&self, path: &Path) -> Result<PathBuf> {
        if !self.settings()?.resolve_casing {
            return Ok(path.to_path_buf());
        }
        let resolved = self.casing.resolve(path)?;
        if resolved != path {
            tracing::debug!(from = %path.display(), to = %resolved.display(), "Resolved casing");
        }
        Ok(resolved)
    }

    /// Convert a declared path from the configured style to the host style.
    pub fn convert_path_style(&self, path: &Path) -> Result<PathBuf> {
        let style = self.settings()?.path_style;
        Ok(convert_path_style(&path.to_string_lossy(), style))
    }

    pub fn push_frame(&mut self, dir: &Path, mode: ResolveMode) {
        self.resolver.push_frame(dir, mode);
    }

    pub fn pop_frame(&mut self) {
        self.resolver.pop_frame();
    }

    pub fn current_parent(&self) -> PathBuf {
        self.resolver.current_parent()
    }

    pub fn frame_depth(&self) -> usize {
        self.resolver.depth()
    }

    pub fn truncate_frames(&mut self, depth: usize) {
        self.resolver.truncate(depth);
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Push a frame that is popped when the returned guard drops.
    pub fn enter_frame(&mut self, dir: &Path, mode: ResolveMode) -> FrameGuard<'_> {
        let depth = self.frame_depth();
        self.push_frame(dir, mode);
        FrameGuard { ctx: self, depth }
    }
}

/// Scoped directory frame.
///
/// Dereferences to the [`LoadContext`] so nested work runs inside the frame.
/// Dropping the guard restores the stack to its depth before the push, on
/// success and error paths alike.
#[derive(Debug)]
pub struct FrameGuard<'a> {
    ctx: &'a mut LoadContext,
    depth: usize,
}

impl Deref for FrameGuard<'_> {
    type Target = LoadContext;

    fn deref(&self) -> &LoadContext {
        self.ctx
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut LoadContext {
        self.ctx
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.ctx.truncate_frames(self.depth);
    }
}
