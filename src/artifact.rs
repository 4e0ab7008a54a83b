//! Where the rendered summary image lives.

use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

pub const SUMMARY_FILE_NAME: &str = "summary.png";

pub trait ArtifactStore: Send + Sync {
    /// Replace the artifact with `bytes`.
    fn write(&self, bytes: &[u8]) -> Result<()>;

    /// The artifact's bytes, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<Vec<u8>>>;
}

/// One file on disk, typically `<cache_dir>/summary.png`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    path: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn in_cache_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(SUMMARY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(b) => Ok(Some(b)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the artifact in memory; handy for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    bytes: RwLock<Option<Vec<u8>>>,
}

impl ArtifactStore for MemoryArtifactStore {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut slot = self
            .bytes
            .write()
            .map_err(|_| crate::Error::internal("artifact lock poisoned"))?;
        *slot = Some(bytes.to_vec());
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self
            .bytes
            .read()
            .map_err(|_| crate::Error::internal("artifact lock poisoned"))?
            .clone())
    }
}
