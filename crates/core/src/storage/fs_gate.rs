//! File system storage gate.

use std::fs;
use std::path::Path;
use tracing::debug;

use super::config::StorageConfig;
use super::error::StorageError;
use super::traits::StorageGate;
use super::types::{AccessGrant, StorageDirs};

/// Storage gate backed by two local directories.
pub struct FsStorageGate {
    config: StorageConfig,
    access: AccessGrant,
}

impl FsStorageGate {
    /// Creates a gate whose access signal starts at `config.access_granted`.
    pub fn new(config: StorageConfig) -> Self {
        let access = AccessGrant::new(config.access_granted);
        Self { config, access }
    }

    /// Creates a gate sharing an externally owned access signal.
    pub fn with_access(config: StorageConfig, access: AccessGrant) -> Self {
        Self { config, access }
    }

    /// Handle to the access signal, for the permission subsystem to update.
    pub fn access(&self) -> AccessGrant {
        self.access.clone()
    }

    fn ensure_dir(path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|e| StorageError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let meta = fs::metadata(path).map_err(|e| StorageError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !meta.is_dir() || meta.permissions().readonly() {
            return Err(StorageError::NotWritable {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl StorageGate for FsStorageGate {
    fn resolve_directories(&self) -> Result<StorageDirs, StorageError> {
        if !self.access.is_granted() {
            return Err(StorageError::AccessDenied);
        }

        Self::ensure_dir(&self.config.temp_dir)?;
        Self::ensure_dir(&self.config.output_dir)?;
        debug!(
            "Resolved storage directories: temp={:?}, output={:?}",
            self.config.temp_dir, self.config.output_dir
        );

        Ok(StorageDirs {
            temp_dir: self.config.temp_dir.clone(),
            output_dir: self.config.output_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gate_in(root: &TempDir) -> FsStorageGate {
        FsStorageGate::new(StorageConfig::with_dirs(
            root.path().join("tmp"),
            root.path().join("out/nested"),
        ))
    }

    #[test]
    fn test_resolve_creates_missing_directories() {
        let root = TempDir::new().unwrap();
        let gate = gate_in(&root);

        let dirs = gate.resolve_directories().unwrap();
        assert!(dirs.temp_dir.is_dir());
        assert!(dirs.output_dir.is_dir());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let root = TempDir::new().unwrap();
        let gate = gate_in(&root);

        let first = gate.resolve_directories().unwrap();
        std::fs::write(first.temp_dir.join("keep.bin"), b"x").unwrap();
        let second = gate.resolve_directories().unwrap();

        assert_eq!(first, second);
        assert!(second.temp_dir.join("keep.bin").exists());
    }

    #[test]
    fn test_resolve_denied_without_access() {
        let root = TempDir::new().unwrap();
        let gate = gate_in(&root);
        gate.access().set(false);

        let result = gate.resolve_directories();
        assert!(matches!(result, Err(StorageError::AccessDenied)));
        // nothing is created when access is denied
        assert!(!root.path().join("tmp").exists());
    }

    #[test]
    fn test_resolve_fails_when_path_is_a_file() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let gate = FsStorageGate::new(StorageConfig::with_dirs(
            blocker,
            root.path().join("out"),
        ));
        assert!(gate.resolve_directories().is_err());
    }
}
