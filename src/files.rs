//! Derivative file repository collaborator.
//!
//! Physical storage of derivative bytes is out of the engine's hands; the
//! removal path only needs existence checks and best-effort purging.

use std::path::{Path, PathBuf};

use vf_core::Result;

use crate::asset::FileAsset;

/// Storage collaborator for derivative files.
pub trait DerivativeStore: Send + Sync {
    /// Whether a derivative file exists for (asset, key).
    fn exists(&self, asset: &dyn FileAsset, key: &str) -> bool;

    /// Delete the derivative file for (asset, key).
    fn purge(&self, asset: &dyn FileAsset, key: &str) -> Result<()>;
}

/// Filesystem-backed [`DerivativeStore`]: derivatives live under one root
/// directory as `<name>.<key>`.
pub struct FsDerivativeStore {
    root: PathBuf,
}

impl FsDerivativeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, asset: &dyn FileAsset, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", asset.name(), key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DerivativeStore for FsDerivativeStore {
    fn exists(&self, asset: &dyn FileAsset, key: &str) -> bool {
        self.path_for(asset, key).is_file()
    }

    fn purge(&self, asset: &dyn FileAsset, key: &str) -> Result<()> {
        std::fs::remove_file(self.path_for(asset, key))?;
        Ok(())
    }
}
