//! Development-mode live reload.
//!
//! # Data Flow
//! ```text
//! filesystem modify event (notify thread)
//!     → watcher.rs (extension filter, bounded queue)
//!     → broadcaster.rs (single long-lived task)
//!         → epoch.rs (bump static epoch)
//!         → channels.rs (snapshot, try_send "reload", drop closed)
//!     → http/websocket.rs (per-connection task writes to the socket)
//! ```
//!
//! # Design Decisions
//! - Runs only in development mode
//! - No acknowledgement, no heartbeat: dead connections are found when a
//!   send fails
//! - A client connecting after a change never sees that change's reload

pub mod broadcaster;
pub mod channels;
pub mod epoch;
pub mod watcher;

pub use broadcaster::ReloadBroadcaster;
pub use channels::{BroadcastReport, ChannelId, ConnectedChannels, PushMessage};
pub use epoch::StaticEpoch;
pub use watcher::{FileChange, SourceWatcher};
