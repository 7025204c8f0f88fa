//! Reload broadcast loop.

use tokio::sync::{broadcast, mpsc};

use crate::live_reload::channels::{BroadcastReport, ConnectedChannels, PushMessage};
use crate::live_reload::epoch::StaticEpoch;
use crate::live_reload::watcher::FileChange;
use crate::observability::metrics;

/// Turns file changes into epoch bumps and reload pushes.
#[derive(Debug, Clone)]
pub struct ReloadBroadcaster {
    channels: ConnectedChannels,
    epoch: StaticEpoch,
}

impl ReloadBroadcaster {
    pub fn new(channels: ConnectedChannels, epoch: StaticEpoch) -> Self {
        Self { channels, epoch }
    }

    /// Handle one change: bump the epoch, then push `reload` to every channel.
    pub fn notify_change(&self, change: &FileChange) -> BroadcastReport {
        let epoch = self.epoch.bump();
        let report = self.channels.broadcast(PushMessage::Reload);

        tracing::info!(
            path = %change.path.display(),
            epoch,
            delivered = report.delivered,
            removed = report.removed,
            "Reloading clients"
        );
        metrics::record_reload(report.delivered, report.removed);
        report
    }

    /// Drain `changes` until the queue closes or shutdown fires.
    pub async fn run(
        self,
        mut changes: mpsc::Receiver<FileChange>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!("Live reload loop starting");
        loop {
            tokio::select! {
                change = changes.recv() => match change {
                    Some(change) => {
                        self.notify_change(&change);
                    }
                    None => {
                        tracing::info!("Watcher closed, live reload loop exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Live reload loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_notify_change_bumps_and_broadcasts() {
        let channels = ConnectedChannels::new();
        let epoch = StaticEpoch::new();
        let (_a, mut rx_a) = channels.connect(4);
        let (b, rx_b) = channels.connect(4);
        drop(rx_b);

        let before = epoch.current();
        let broadcaster = ReloadBroadcaster::new(channels.clone(), epoch.clone());
        let report = broadcaster.notify_change(&FileChange::new("static/site.css"));

        assert!(epoch.current() >= before);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert!(!channels.contains(&b));
        assert_eq!(channels.len(), 1);
        assert_eq!(rx_a.try_recv().unwrap(), PushMessage::Reload);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_loop_delivers_each_change() {
        let channels = ConnectedChannels::new();
        let (_a, mut rx_a) = channels.connect(4);
        let (_b, mut rx_b) = channels.connect(4);

        let (change_tx, change_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let broadcaster = ReloadBroadcaster::new(channels.clone(), StaticEpoch::new());
        let task = tokio::spawn(broadcaster.run(change_rx, shutdown_rx));

        change_tx.send(FileChange::new("src/lib.rs")).await.unwrap();

        for rx in [&mut rx_a, &mut rx_b] {
            let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
            assert_eq!(msg, Some(PushMessage::Reload));
        }
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
