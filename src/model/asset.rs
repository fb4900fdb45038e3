//! Asset stores that resolve a relative graph path to bytes.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A read-only store of bundled files, addressed by relative path.
pub trait AssetStore {
    /// Read the whole asset at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset does not exist or cannot be read.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Assets stored under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    /// Create a store rooted at `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Directory assets are resolved against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if path.is_empty() || !contained {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset path must be relative to the store root: {path:?}"),
            ));
        }

        Ok(self.root.join(relative))
    }
}

impl AssetStore for DirAssetStore {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path)?)
    }
}

/// Assets held in memory, mostly for tests and embedded graphs.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    #[must_use]
    pub fn with_asset(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(path.into(), bytes.into());
    }
}

impl AssetStore for MemoryAssetStore {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.assets.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset at {path:?}"))
        })
    }
}
