use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The record persisted per key: payload plus creation and expiry timestamps.
///
/// Timestamps are milliseconds since the Unix epoch. A missing or null
/// `expires_at` means the entry never expires. `expires_at` is fixed at
/// write time and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub value: Value,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

impl Envelope {
    pub fn new(value: Value, created_at: i64, ttl_ms: Option<i64>) -> Self {
        Self {
            value,
            created_at,
            expires_at: ttl_ms.map(|ttl| created_at + ttl),
        }
    }

    /// An envelope is expired when `now_ms` is strictly past `expires_at`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at, Some(at) if now_ms > at)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes the stored text. Anything that is not a JSON object carrying
    /// at least `value` and `createdAt` is rejected as corrupt.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
