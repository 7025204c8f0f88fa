//! Source and asset watcher for live reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A modified file with a watched extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// True if `path` ends in one of `extensions` (given without the dot).
pub fn has_watched_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// A watcher that monitors source and asset trees for modifications.
pub struct SourceWatcher {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    change_tx: mpsc::Sender<FileChange>,
}

impl SourceWatcher {
    /// Create a new SourceWatcher.
    ///
    /// Returns the watcher and a bounded receiver of file changes.
    pub fn new(
        roots: Vec<PathBuf>,
        extensions: Vec<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<FileChange>) {
        let (change_tx, change_rx) = mpsc::channel(capacity.max(1));

        (
            Self {
                roots,
                extensions,
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to flow. Roots that
    /// do not exist are skipped with a warning.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();
        let extensions = self.extensions.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !event.kind.is_modify() {
                        return;
                    }
                    for path in event.paths {
                        if !has_watched_extension(&path, &extensions) {
                            continue;
                        }
                        tracing::info!(path = %path.display(), "File changed");
                        match tx.try_send(FileChange { path }) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                tracing::trace!("Reload already queued, dropping change");
                            }
                            Err(TrySendError::Closed(_)) => {
                                tracing::debug!("Reload loop gone, ignoring change");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for root in &self.roots {
            if !root.exists() {
                tracing::warn!(path = %root.display(), "Watch root missing, skipping");
                continue;
            }
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::info!(path = %root.display(), "Watching for changes");
        }

        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        ["rs", "css", "html", "js"].map(String::from).to_vec()
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_watched_extension(Path::new("src/main.rs"), &exts()));
        assert!(has_watched_extension(Path::new("static/site.css"), &exts()));
        assert!(!has_watched_extension(Path::new("static/logo.png"), &exts()));
        assert!(!has_watched_extension(Path::new("Makefile"), &exts()));
        assert!(!has_watched_extension(Path::new("notes.RS"), &exts()));
    }

    #[tokio::test]
    async fn test_modification_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("site.css");
        std::fs::write(&css, "a{}").unwrap();

        let (watcher, mut changes) =
            SourceWatcher::new(vec![dir.path().to_path_buf()], exts(), 16);
        let _guard = watcher.run().unwrap();

        // Give the backend a moment to arm before touching the file.
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&css, "a{color:red}").unwrap();

        let change = tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .expect("no change reported")
            .unwrap();
        assert_eq!(change.path.file_name(), css.file_name());
    }
}
