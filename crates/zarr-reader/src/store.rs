//! Key/value access to the files of a chunked store.

use std::path::{Path, PathBuf};

use zarrs_filesystem::FilesystemStore;
use zarrs_storage::{ReadableStorageTraits, StoreKey};

use mesh_common::{MeshError, MeshResult};

/// Read-only access to the records of a chunked store.
///
/// Keys are `/`-separated paths relative to [`ChunkSource::base_location`],
/// e.g. `lon/.zarray` or `lon/3`.
pub trait ChunkSource: Send + Sync {
    /// Root location of the store.
    fn base_location(&self) -> &Path;

    /// Fetch the bytes stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> MeshResult<Option<Vec<u8>>>;
}

/// Chunk source backed by a directory on the local filesystem.
pub struct FilesystemChunkSource {
    root: PathBuf,
    store: FilesystemStore,
}

impl FilesystemChunkSource {
    /// Open the store rooted at `root`. The directory must exist.
    pub fn open(root: impl AsRef<Path>) -> MeshResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(MeshError::not_found(format!(
                "chunked store {} is not a directory",
                root.display()
            )));
        }
        let store = FilesystemStore::new(&root)
            .map_err(|e| MeshError::io(format!("opening {}: {}", root.display(), e)))?;
        Ok(Self { root, store })
    }
}

impl ChunkSource for FilesystemChunkSource {
    fn base_location(&self) -> &Path {
        &self.root
    }

    fn get(&self, key: &str) -> MeshResult<Option<Vec<u8>>> {
        let store_key = StoreKey::new(key)
            .map_err(|e| MeshError::unsupported(format!("invalid key '{}': {}", key, e)))?;
        let bytes = self
            .store
            .get(&store_key)
            .map_err(|e| MeshError::io(format!("reading {}: {}", key, e)))?;
        Ok(bytes.map(|b| b.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilesystemChunkSource::open(dir.path().join("nope"))
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_present_and_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lon")).unwrap();
        std::fs::write(dir.path().join("lon/0"), [1u8, 2, 3]).unwrap();

        let source = FilesystemChunkSource::open(dir.path()).unwrap();
        assert_eq!(source.base_location(), dir.path());
        assert_eq!(source.get("lon/0").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(source.get("lon/1").unwrap(), None);
    }
}
