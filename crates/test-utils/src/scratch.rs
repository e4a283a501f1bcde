//! Scratch files for tests that read job descriptions or sample files.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created; this is test-only code.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create scratch directory"),
        }
    }

    /// Path of `name` inside the directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        let mut file = std::fs::File::create(&path).expect("failed to create scratch file");
        file.write_all(contents.as_bytes())
            .expect("failed to write scratch file");
        path
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}
