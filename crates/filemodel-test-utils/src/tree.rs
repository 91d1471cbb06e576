//! [`TestTree`] builder for model file fixtures.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a tree of model files.
///
/// # Example
///
/// ```rust
/// use filemodel_test_utils::TestTree;
/// use serde_json::json;
///
/// let tree = TestTree::new();
/// tree.write_json("root.json", &json!({ "child": "sub/child.json" }));
/// tree.write_json("sub/child.json", &json!({ "value": 1 }));
/// tree.assert_file_exists("sub/child.json");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create an empty temporary directory.
    ///
    /// Also installs the captured test logger.
    pub fn new() -> Self {
        crate::logging::init();
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let full_path = self.path(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Write `value` as pretty JSON with a trailing newline, the layout the
    /// raw store produces when saving.
    pub fn write_json(&self, relative: &str, value: &Value) -> PathBuf {
        let mut content = serde_json::to_string_pretty(value).unwrap();
        content.push('\n');
        self.write_file(relative, &content)
    }

    /// Read the file at `relative`.
    ///
    /// # Panics
    /// Panics with the full path if the file cannot be read.
    pub fn read_file(&self, relative: &str) -> String {
        let full_path = self.path(relative);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Parse the file at `relative` as JSON.
    pub fn read_json(&self, relative: &str) -> Value {
        serde_json::from_str(&self.read_file(relative)).unwrap()
    }

    /// Assert that `relative` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `relative` does **not** exist.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `relative` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let file_content = self.read_file(relative);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            self.path(relative).display(),
            content,
            file_content
        );
    }
}
