//! Namespaced, expiring key-value storage over simple flat backends.
//!
//! [`Stash`] wraps any [`Backend`] with key namespacing, per-entry
//! time-to-live, and non-throwing failure semantics. See the `kvstash`
//! binary for the command-line surface.

pub mod backend;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod log;
pub mod stash;

pub use backend::{Backend, BackendError, DiskBackend, MemoryBackend};
pub use config::{AppConfig, StashConfig};
pub use envelope::Envelope;
pub use stash::{EntryInfo, Stash};
