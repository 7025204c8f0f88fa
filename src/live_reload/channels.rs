//! Connected push channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::observability::metrics;

/// Identifies one connected push channel.
pub type ChannelId = Uuid;

/// Messages pushed from server to client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMessage {
    Reload,
}

impl PushMessage {
    /// Wire text of the message.
    pub fn as_str(self) -> &'static str {
        match self {
            PushMessage::Reload => "reload",
        }
    }
}

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels that accepted the message.
    pub delivered: usize,
    /// Channels whose buffer was full; a reload is already pending there.
    pub skipped: usize,
    /// Channels found closed and removed.
    pub removed: usize,
}

/// Concurrent set of live push channels.
///
/// Each entry is the sending half of a per-connection queue; the connection
/// task drains the other half into its socket. A closed receiver means the
/// connection is gone.
#[derive(Debug, Clone, Default)]
pub struct ConnectedChannels {
    inner: Arc<DashMap<ChannelId, mpsc::Sender<PushMessage>>>,
}

impl ConnectedChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new channel, returning its id and the receiving half.
    pub fn connect(&self, capacity: usize) -> (ChannelId, mpsc::Receiver<PushMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = self.register(tx);
        (id, rx)
    }

    /// Register an existing sender.
    pub fn register(&self, sender: mpsc::Sender<PushMessage>) -> ChannelId {
        let id = Uuid::new_v4();
        self.inner.insert(id, sender);
        metrics::set_push_channels(self.inner.len());
        tracing::debug!(channel = %id, connected = self.inner.len(), "Push channel connected");
        id
    }

    /// Remove a channel. Returns false if it was already gone.
    pub fn disconnect(&self, id: &ChannelId) -> bool {
        let removed = self.inner.remove(id).is_some();
        if removed {
            metrics::set_push_channels(self.inner.len());
            tracing::debug!(channel = %id, connected = self.inner.len(), "Push channel disconnected");
        }
        removed
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.inner.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Send `message` to every channel.
    ///
    /// Iterates a snapshot so connects and disconnects during the pass never
    /// alias the map; closed channels are removed after the pass.
    pub fn broadcast(&self, message: PushMessage) -> BroadcastReport {
        let snapshot: Vec<(ChannelId, mpsc::Sender<PushMessage>)> = self
            .inner
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        for (id, sender) in snapshot {
            match sender.try_send(message) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => report.skipped += 1,
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }

        for id in dead {
            if self.disconnect(&id) {
                report.removed += 1;
            }
        }

        report
    }
}
