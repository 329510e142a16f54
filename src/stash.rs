use crate::backend::{Backend, BackendError};
use crate::config::StashConfig;
use crate::envelope::Envelope;
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Metadata for a single live entry, as reported by [`Stash::info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Expiry time in milliseconds since the Unix epoch, or `None` when the
    /// entry never expires.
    pub expires_at: Option<i64>,
    /// Length in bytes of the serialized envelope as stored.
    pub size: usize,
}

/// A namespaced, expiring view over a raw [`Backend`].
///
/// Every key is stored under `namespace + ":" + key` so that independent
/// consumers can share one backend without colliding. Values are wrapped in
/// an [`Envelope`] carrying creation and expiry timestamps; expiry is lazy,
/// enforced at the moment an entry is observed rather than by a background
/// sweep. As a consequence the read operations (`get`, `has`, `keys`,
/// `info`) are not side-effect-free: they delete expired or corrupt entries
/// on first observation.
///
/// No operation raises: backend and serialization faults are caught and
/// mapped to the operation's failure value (`false`, `None`, an empty list
/// or a zero count). Diagnostics go through `tracing::warn!` and can be
/// silenced with [`StashConfig::warnings`].
///
/// Multiple instances may share one backend as long as their namespaces do
/// not overlap. The wrapper does not coordinate concurrent writers; it
/// assumes a single logical actor drives each namespace.
pub struct Stash {
    backend: Arc<dyn Backend>,
    prefix: String,
    default_ttl: Option<Duration>,
    warnings: bool,
}

impl Stash {
    /// Wraps `backend` with the given configuration and probes it once for
    /// availability. A failed probe is reported but never fatal; operations
    /// on an unavailable backend degrade individually.
    pub fn new(backend: Arc<dyn Backend>, config: StashConfig) -> Self {
        let prefix = if config.namespace.is_empty() {
            String::new()
        } else {
            format!("{}:", config.namespace)
        };
        let stash = Self {
            backend,
            prefix,
            default_ttl: config.default_ttl,
            warnings: config.warnings,
        };
        stash.probe();
        stash
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        if self.warnings {
            warn!("{message}");
        }
    }

    /// Best-effort write-then-delete availability check.
    fn probe(&self) {
        let probe_key = self.full_key("__kvstash_probe__");
        let res: Result<()> = (|| {
            self.backend.set(&probe_key, "1")?;
            self.backend.remove(&probe_key)?;
            Ok(())
        })();
        if let Err(e) = res {
            self.warn(format_args!("storage backend unavailable: {e}"));
        }
    }

    /// Stores `value` under `key`, returning whether the write took effect.
    ///
    /// A per-call `ttl` overrides the configured default; with neither, the
    /// entry never expires. The expiry deadline is fixed at write time.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let full_key = self.full_key(key);
        let res: Result<()> = (|| {
            let ttl_ms = ttl.or(self.default_ttl).map(|d| d.as_millis() as i64);
            let envelope = Envelope::new(serde_json::to_value(value)?, now_ms(), ttl_ms);
            self.backend.set(&full_key, &envelope.encode()?)?;
            debug!("stored key: {key}");
            Ok(())
        })();
        match res {
            Ok(()) => true,
            Err(e) => {
                if matches!(
                    e.downcast_ref::<BackendError>(),
                    Some(BackendError::QuotaExceeded { .. })
                ) {
                    self.warn(format_args!("quota exceeded while storing '{key}': {e}"));
                } else {
                    self.warn(format_args!("failed to store '{key}': {e}"));
                }
                false
            }
        }
    }

    /// Reads the value stored under `key`.
    ///
    /// Returns `None` for absent, expired, or corrupt entries; expired and
    /// corrupt entries are deleted as a side effect of the read. A
    /// well-formed payload that does not deserialize into `T` is also
    /// `None`, but the entry is kept.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let res: Result<Option<T>> = (|| {
            let Some(raw) = self.backend.get(&full_key)? else {
                debug!("miss for key: {key}");
                return Ok(None);
            };
            let envelope = match Envelope::decode(&raw) {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.warn(format_args!("removing corrupt entry for '{key}': {e}"));
                    self.backend.remove(&full_key)?;
                    return Ok(None);
                }
            };
            if envelope.is_expired(now_ms()) {
                debug!("entry expired for key: {key}");
                self.backend.remove(&full_key)?;
                return Ok(None);
            }
            match serde_json::from_value(envelope.value) {
                Ok(value) => {
                    debug!("hit for key: {key}");
                    Ok(Some(value))
                }
                Err(e) => {
                    self.warn(format_args!(
                        "payload for '{key}' does not match the requested type: {e}"
                    ));
                    Ok(None)
                }
            }
        })();
        match res {
            Ok(value) => value,
            Err(e) => {
                self.warn(format_args!("failed to read '{key}': {e}"));
                None
            }
        }
    }

    /// Whether a live value exists under `key`.
    ///
    /// Defined as `get` returning a value, so it inherits the lazy-deletion
    /// side effects of `get`.
    pub fn has(&self, key: &str) -> bool {
        self.get::<Value>(key).is_some()
    }

    /// Deletes `key` unconditionally, without checking existence first.
    pub fn remove(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.backend.remove(&full_key) {
            Ok(()) => true,
            Err(e) => {
                self.warn(format_args!("failed to remove '{key}': {e}"));
                false
            }
        }
    }

    /// Deletes every key in this namespace, leaving other namespaces
    /// untouched.
    pub fn clear(&self) -> bool {
        let res: Result<()> = (|| {
            // Collect first: deleting while enumerating by index would skip
            // entries as positions shift.
            let matching = self.matching_full_keys()?;
            for full_key in &matching {
                self.backend.remove(full_key)?;
            }
            Ok(())
        })();
        match res {
            Ok(()) => true,
            Err(e) => {
                self.warn(format_args!("failed to clear namespace: {e}"));
                false
            }
        }
    }

    /// Lists the live keys in this namespace, in backend enumeration order,
    /// with the namespace prefix stripped.
    ///
    /// Each candidate is re-validated through `has`, so expired or corrupt
    /// entries encountered here are lazily deleted and excluded.
    pub fn keys(&self) -> Vec<String> {
        let res: Result<Vec<String>> = (|| {
            let mut user_keys = Vec::new();
            for full_key in self.matching_full_keys()? {
                if let Some(user_key) = full_key.strip_prefix(&self.prefix) {
                    user_keys.push(user_key.to_string());
                }
            }
            Ok(user_keys)
        })();
        match res {
            Ok(user_keys) => user_keys.into_iter().filter(|k| self.has(k)).collect(),
            Err(e) => {
                self.warn(format_args!("failed to enumerate keys: {e}"));
                Vec::new()
            }
        }
    }

    /// Approximate bytes occupied by this namespace: the summed lengths of
    /// full keys and raw serialized values.
    ///
    /// Counts every matching entry, expired and corrupt ones included; only
    /// `keys` and `cleanup` look inside the envelopes.
    pub fn size(&self) -> usize {
        let res: Result<usize> = (|| {
            let mut total = 0;
            for full_key in self.matching_full_keys()? {
                if let Some(raw) = self.backend.get(&full_key)? {
                    total += full_key.len() + raw.len();
                }
            }
            Ok(total)
        })();
        match res {
            Ok(total) => total,
            Err(e) => {
                self.warn(format_args!("failed to measure namespace size: {e}"));
                0
            }
        }
    }

    /// Deletes every well-formed, expired entry in this namespace and
    /// returns how many were removed.
    ///
    /// Entries that fail to decode are left in place; only `get` and `info`
    /// discard corrupt data, on access.
    pub fn cleanup(&self) -> usize {
        let res: Result<usize> = (|| {
            let now = now_ms();
            let mut expired = Vec::new();
            for full_key in self.matching_full_keys()? {
                let Some(raw) = self.backend.get(&full_key)? else {
                    continue;
                };
                if let Ok(envelope) = Envelope::decode(&raw) {
                    if envelope.is_expired(now) {
                        expired.push(full_key);
                    }
                }
            }
            for full_key in &expired {
                self.backend.remove(full_key)?;
            }
            debug!("cleanup removed {} expired entries", expired.len());
            Ok(expired.len())
        })();
        match res {
            Ok(removed) => removed,
            Err(e) => {
                self.warn(format_args!("cleanup failed: {e}"));
                0
            }
        }
    }

    /// Metadata for the entry under `key`, or `None` when it is absent,
    /// corrupt, or expired. Expired and corrupt entries are deleted here
    /// just as they are by `get`.
    pub fn info(&self, key: &str) -> Option<EntryInfo> {
        let full_key = self.full_key(key);
        let res: Result<Option<EntryInfo>> = (|| {
            let Some(raw) = self.backend.get(&full_key)? else {
                return Ok(None);
            };
            let envelope = match Envelope::decode(&raw) {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.warn(format_args!("removing corrupt entry for '{key}': {e}"));
                    self.backend.remove(&full_key)?;
                    return Ok(None);
                }
            };
            if envelope.is_expired(now_ms()) {
                debug!("entry expired for key: {key}");
                self.backend.remove(&full_key)?;
                return Ok(None);
            }
            Ok(Some(EntryInfo {
                created_at: envelope.created_at,
                expires_at: envelope.expires_at,
                size: raw.len(),
            }))
        })();
        match res {
            Ok(entry_info) => entry_info,
            Err(e) => {
                self.warn(format_args!("failed to inspect '{key}': {e}"));
                None
            }
        }
    }

    /// Full keys in this namespace, collected in one pass over the
    /// backend's positional enumeration.
    fn matching_full_keys(&self) -> Result<Vec<String>, BackendError> {
        let mut matching = Vec::new();
        let count = self.backend.len()?;
        for index in 0..count {
            let Some(full_key) = self.backend.key_at(index)? else {
                continue;
            };
            if full_key.starts_with(&self.prefix) {
                matching.push(full_key);
            }
        }
        Ok(matching)
    }
}
