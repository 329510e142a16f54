use super::{Backend, BackendError};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory backend over a `BTreeMap`. Enumeration order is lexicographic.
///
/// An optional quota caps the summed length of keys and values, mirroring
/// the size limits of browser-profile storage. Contents live only as long as
/// the process, which makes this the session-scoped counterpart to
/// [`DiskBackend`](super::DiskBackend).
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: None,
        }
    }

    /// Caps total stored bytes (key plus value lengths) at `max_bytes`.
    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(max_bytes),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.write().unwrap();
        if let Some(max_bytes) = self.quota {
            // A replaced value gives its bytes back before the check
            let current_bytes: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if current_bytes + key.len() + value.len() > max_bytes {
                return Err(BackendError::QuotaExceeded {
                    current_bytes,
                    max_bytes,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
        Ok(())
    }

    fn len(&self) -> Result<usize, BackendError> {
        let entries = self.entries.read().unwrap();
        Ok(entries.len())
    }

    fn key_at(&self, index: usize) -> Result<Option<String>, BackendError> {
        let entries = self.entries.read().unwrap();
        Ok(entries.keys().nth(index).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let backend = MemoryBackend::new();

        assert_eq!(backend.get("k").unwrap(), None);

        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some("v".to_string()));

        backend.set("k", "v2").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some("v2".to_string()));

        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);

        // Removing an absent key is not an error
        backend.remove("k").unwrap();
    }

    #[test]
    fn test_len_and_key_at() {
        let backend = MemoryBackend::new();
        backend.set("b", "2").unwrap();
        backend.set("a", "1").unwrap();
        backend.set("c", "3").unwrap();

        assert_eq!(backend.len().unwrap(), 3);
        assert_eq!(backend.key_at(0).unwrap(), Some("a".to_string()));
        assert_eq!(backend.key_at(1).unwrap(), Some("b".to_string()));
        assert_eq!(backend.key_at(2).unwrap(), Some("c".to_string()));
        assert_eq!(backend.key_at(3).unwrap(), None);
    }

    #[test]
    fn test_quota_blocks_oversized_write() {
        let backend = MemoryBackend::with_quota(10);

        backend.set("a", "12345").unwrap();

        let err = backend.set("b", "123456789").unwrap_err();
        match err {
            BackendError::QuotaExceeded {
                current_bytes,
                max_bytes,
            } => {
                assert_eq!(current_bytes, 6);
                assert_eq!(max_bytes, 10);
            }
            other => panic!("expected quota error, got {other:?}"),
        }

        // The rejected write left the store untouched
        assert_eq!(backend.get("b").unwrap(), None);
        assert_eq!(backend.len().unwrap(), 1);
    }

    #[test]
    fn test_quota_accounts_for_replaced_value() {
        let backend = MemoryBackend::with_quota(10);

        backend.set("a", "123456789").unwrap();
        // Same key, smaller value: old bytes are reclaimed first
        backend.set("a", "12").unwrap();
        backend.set("b", "1234").unwrap();

        assert_eq!(backend.get("a").unwrap(), Some("12".to_string()));
        assert_eq!(backend.get("b").unwrap(), Some("1234".to_string()));
    }
}
