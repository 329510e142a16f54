pub mod disk;
pub mod memory;

pub use disk::DiskBackend;
pub use memory::MemoryBackend;

use std::fmt;

/// Error raised by a raw storage backend.
#[derive(Debug)]
pub enum BackendError {
    /// Write rejected because it would exceed the backend's capacity.
    QuotaExceeded {
        /// Bytes already occupied by other entries
        current_bytes: usize,
        /// Maximum backend capacity in bytes
        max_bytes: usize,
    },
    /// The backend cannot be reached at all (e.g. disabled storage).
    Unavailable(String),
    /// Any other backend fault.
    Store(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::QuotaExceeded {
                current_bytes,
                max_bytes,
            } => {
                write!(
                    f,
                    "quota exceeded: {} bytes used of {} bytes maximum",
                    current_bytes, max_bytes
                )
            }
            BackendError::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            BackendError::Store(reason) => write!(f, "storage error: {reason}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<fjall::Error> for BackendError {
    fn from(e: fjall::Error) -> Self {
        BackendError::Store(e.to_string())
    }
}

/// A flat, namespace-unaware mapping from string keys to string values.
///
/// This is the contract the [`Stash`](crate::Stash) wrapper builds on: four
/// primitive operations plus positional key enumeration. Backends provide no
/// expiry or namespacing of their own. Enumeration order is backend-defined
/// and may shift as entries are added or removed, so callers must not rely
/// on stable iteration under concurrent mutation.
pub trait Backend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    fn remove(&self, key: &str) -> Result<(), BackendError>;

    /// Number of entries currently stored.
    fn len(&self) -> Result<usize, BackendError>;

    /// Key at `index` in enumeration order, or `None` past the end.
    fn key_at(&self, index: usize) -> Result<Option<String>, BackendError>;
}
