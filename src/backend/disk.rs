use super::{Backend, BackendError};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::{Path, PathBuf};

/// Persistent backend over a single fjall partition.
///
/// Entries survive process restarts, which makes this the local-storage
/// counterpart to [`MemoryBackend`](super::MemoryBackend). The partition is
/// a plain byte map; all envelope handling stays in the wrapper layer.
pub struct DiskBackend {
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskBackend {
    /// Opens (or creates) a keyspace at `path` with a single `entries`
    /// partition.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition("entries", PartitionCreateOptions::default())?;
        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }

    /// Opens the backend at the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_data_path()?)
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "kvstash", "kvstash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("store"))
    }
}

fn utf8_key(bytes: &[u8]) -> Result<&str, BackendError> {
    std::str::from_utf8(bytes).map_err(|e| BackendError::Store(e.to_string()))
}

impl Backend for DiskBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match self.partition.get(key)? {
            Some(bytes) => Ok(Some(utf8_key(&bytes)?.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.partition.insert(key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.partition.remove(key)?;
        Ok(())
    }

    fn len(&self) -> Result<usize, BackendError> {
        Ok(self.partition.len()?)
    }

    fn key_at(&self, index: usize) -> Result<Option<String>, BackendError> {
        match self.partition.keys().nth(index) {
            Some(key) => {
                let key = key?;
                Ok(Some(utf8_key(&key)?.to_string()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_set_remove() {
        let dir = tempdir().unwrap();
        let backend = DiskBackend::open(dir.path()).unwrap();

        assert_eq!(backend.get("k").unwrap(), None);

        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some("v".to_string()));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_len_and_key_enumeration() {
        let dir = tempdir().unwrap();
        let backend = DiskBackend::open(dir.path()).unwrap();

        backend.set("b", "2").unwrap();
        backend.set("a", "1").unwrap();

        assert_eq!(backend.len().unwrap(), 2);

        let mut keys = Vec::new();
        for index in 0..backend.len().unwrap() {
            keys.push(backend.key_at(index).unwrap().unwrap());
        }
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(backend.key_at(2).unwrap(), None);
    }
}
