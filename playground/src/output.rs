//! Output directory shared by artifacts, emitters and the manifest writer.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ManifestError, Result};

/// The directory a run writes its files into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Creates the directory if needed and pins it to an absolute path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|source| io_error(path, source))?;
        let path = path.canonicalize().map_err(|source| io_error(path, source))?;
        Ok(Self { path })
    }

    /// Wraps a path without touching the filesystem.
    pub fn new_unchecked(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the absolute path of a file inside the directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Writes `contents` to `name`, creating parent directories.
    pub fn write_file(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
        std::fs::write(&path, contents).map_err(|source| io_error(&path, source))?;
        debug!(path = %path.display(), "wrote output file");
        Ok(path)
    }

    /// Returns true when `name` exists in the directory.
    pub fn exists(&self, name: &str) -> bool {
        self.path.join(name).exists()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ManifestError {
    ManifestError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let out = OutputDir::create(temp.path().join("run")).unwrap();

        let path = out.write_file("cl/config.yaml", "a: 1").unwrap();

        assert!(path.is_absolute());
        assert!(out.exists("cl/config.yaml"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a: 1");
    }
}
