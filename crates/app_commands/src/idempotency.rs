//! Idempotency guard for retry-safe commands
//!
//! A command's identity is the SHA-256 hash of its kind and canonical JSON
//! payload. Before executing, the guard looks the hash up; a hit replays the
//! recorded receipt without touching the domain. The record itself is
//! written by the handler inside the storage commit that applies the
//! command's effect, so the claim and the effect are one atomic unit. When
//! two carriers of the same command both miss the lookup, exactly one
//! commit lands; the other surfaces as a conflict, which the guard resolves
//! by reading back the winner's receipt. Failed executions are never
//! recorded, so a retry after an `Internal` error re-executes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::CommandError;
use crate::ports::IdempotencyStore;

/// Content hash identifying one logical command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandHash(String);

impl CommandHash {
    /// Hashes a command kind together with its serialized payload
    ///
    /// The kind participates in the hash so that two different command
    /// types with coincidentally equal payloads never collide.
    pub fn of<P: Serialize>(kind: &str, payload: &P) -> Result<Self, CommandError> {
        let body = serde_json::to_vec(payload)?;
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update([0u8]);
        hasher.update(&body);
        Ok(CommandHash(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recorded outcome of a successfully committed command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    hash: CommandHash,
    kind: String,
    receipt: serde_json::Value,
    recorded_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(
        hash: CommandHash,
        kind: impl Into<String>,
        receipt: serde_json::Value,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        IdempotencyRecord {
            hash,
            kind: kind.into(),
            receipt,
            recorded_at,
        }
    }

    pub fn hash(&self) -> &CommandHash {
        &self.hash
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn receipt(&self) -> &serde_json::Value {
        &self.receipt
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Wraps command execution with replay detection
pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn IdempotencyStore>) -> Self {
        IdempotencyGuard { store }
    }

    /// Executes `op` unless an identical command has already committed
    ///
    /// `op` receives the command hash and must claim it inside the commit
    /// that applies the effect. When the commit conflicts, the guard checks
    /// whether a record for this hash landed in the meantime; if so, a
    /// concurrent carrier of the same command won and its receipt is
    /// replayed. A conflict with no record is a genuine version race and
    /// propagates to the caller.
    pub async fn execute<P, R, F, Fut>(
        &self,
        kind: &str,
        payload: &P,
        op: F,
    ) -> Result<R, CommandError>
    where
        P: Serialize,
        R: Serialize + DeserializeOwned,
        F: FnOnce(CommandHash) -> Fut,
        Fut: Future<Output = Result<R, CommandError>>,
    {
        let hash = CommandHash::of(kind, payload)?;

        if let Some(existing) = self.store.find(&hash).await? {
            debug!(command = kind, hash = %hash, "Replaying recorded receipt");
            return deserialize_receipt(&existing);
        }

        match op(hash.clone()).await {
            Ok(receipt) => Ok(receipt),
            Err(CommandError::Conflict(message)) => {
                match self.store.find(&hash).await? {
                    Some(winner) => {
                        debug!(command = kind, hash = %hash, "Lost the commit race; adopting recorded receipt");
                        deserialize_receipt(&winner)
                    }
                    None => Err(CommandError::Conflict(message)),
                }
            }
            Err(other) => Err(other),
        }
    }
}

fn deserialize_receipt<R: DeserializeOwned>(
    record: &IdempotencyRecord,
) -> Result<R, CommandError> {
    serde_json::from_value(record.receipt().clone()).map_err(CommandError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        customer: &'static str,
        amount: &'static str,
    }

    #[test]
    fn test_same_payload_hashes_identically() {
        let payload = Payload {
            customer: "CST-1",
            amount: "42.00",
        };
        let a = CommandHash::of("assign_points", &payload).unwrap();
        let b = CommandHash::of("assign_points", &payload).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_kind_participates_in_hash() {
        let payload = json!({ "id": "X" });
        let a = CommandHash::of("assign_points", &payload).unwrap();
        let b = CommandHash::of("redeem_coupon", &payload).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_payload_change_changes_hash() {
        let a = CommandHash::of("assign_points", &json!({ "amount": "10" })).unwrap();
        let b = CommandHash::of("assign_points", &json!({ "amount": "11" })).unwrap();
        assert_ne!(a, b);
    }
}
