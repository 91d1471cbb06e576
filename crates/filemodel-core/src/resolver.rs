//! Stack-based resolution of relative paths
//!
//! Every file-backed node pushes its own directory while its children are
//! processed, so a relative path found inside a file is interpreted against
//! that file's directory. A node in anchor mode makes its directory sticky for
//! all descendants, no matter how many parent frames are pushed beneath it.

use filemodel_fs::normalize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How relative paths declared inside a node are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Relative to the directory of the file that declares them
    #[default]
    ToParent,
    /// Relative to the directory of the nearest anchor node
    ToAnchor,
}

/// An entry on the resolver stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFrame {
    pub dir: PathBuf,
    pub mode: ResolveMode,
}

/// Turns relative paths into absolute ones given the current nesting.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    frames: Vec<PathFrame>,
    anchors: Vec<PathBuf>,
    root: Option<PathBuf>,
}

impl PathResolver {
    /// Create a resolver that falls back to the process working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver that falls back to `root` instead of the working
    /// directory when no frame is pushed.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// The directory relative paths are currently resolved against.
    ///
    /// Top anchor if any, else the top frame, else the fallback root.
    pub fn current_parent(&self) -> PathBuf {
        if let Some(anchor) = self.anchors.last() {
            return anchor.clone();
        }
        if let Some(frame) = self.frames.last() {
            return frame.dir.clone();
        }
        match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Resolve `path` against the current parent.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        normalize(&self.current_parent().join(path))
    }

    /// Push a frame for `dir`, itself resolved against the current parent.
    pub fn push_frame(&mut self, dir: &Path, mode: ResolveMode) {
        let dir = self.resolve(dir);
        tracing::trace!(dir = %dir.display(), ?mode, depth = self.frames.len() + 1, "Push frame");
        if mode == ResolveMode::ToAnchor {
            self.anchors.push(dir.clone());
        }
        self.frames.push(PathFrame { dir, mode });
    }

    /// Pop the top frame. No-op on an empty stack.
    pub fn pop_frame(&mut self) -> Option<PathFrame> {
        let frame = self.frames.pop()?;
        if frame.mode == ResolveMode::ToAnchor {
            self.anchors.pop();
        }
        tracing::trace!(dir = %frame.dir.display(), depth = self.frames.len(), "Pop frame");
        Some(frame)
    }

    /// Number of frames currently pushed.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pop frames until at most `depth` remain.
    pub fn truncate(&mut self, depth: usize) {
        while self.frames.len() > depth {
            self.pop_frame();
        }
    }

    pub fn frames(&self) -> &[PathFrame] {
        &self.frames
    }
}
