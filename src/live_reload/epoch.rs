//! Cache-busting epoch for inlined stylesheets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unix-seconds timestamp of the last detected change (or of startup).
#[derive(Debug, Clone)]
pub struct StaticEpoch {
    inner: Arc<AtomicU64>,
}

impl StaticEpoch {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU64::new(now_secs())),
        }
    }

    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Advance to the current time. Never moves backwards.
    pub fn bump(&self) -> u64 {
        let now = now_secs();
        let previous = self.inner.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}

impl Default for StaticEpoch {
    fn default() -> Self {
        Self::new()
    }
}
