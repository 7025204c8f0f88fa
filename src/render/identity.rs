//! Instance identity tokens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token identifying one render invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues a fresh [`InstanceId`] per render call.
///
/// Tokens are random 128-bit UUIDs, so uniqueness holds across the process
/// lifetime with overwhelming probability. The counter only feeds logging.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    issued: AtomicU64,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> InstanceId {
        self.issued.fetch_add(1, Ordering::Relaxed);
        InstanceId(Uuid::new_v4().simple().to_string())
    }

    /// Number of tokens issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
