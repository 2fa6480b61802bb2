//! Local artifact directory handling

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};

/// A directory of build artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDir {
    path: PathBuf,
}

impl ArtifactDir {
    /// Open a directory to upload from. It must exist and contain something.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let dir = Self::open_existing(path)?;
        let mut entries = std::fs::read_dir(&dir.path)?;
        if entries.next().is_none() {
            return Err(ConfigError::ArtifactDirEmpty(dir.path).into());
        }
        Ok(dir)
    }

    /// Open a directory to download into. It only needs to exist.
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(ConfigError::ArtifactDirMissing(path).into());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Regular files directly inside the directory, sorted by file name
    ///
    /// Subdirectories are not descended into.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            } else {
                debug!(path = %path.display(), "skipping non-file entry");
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}
