//! Client/server event protocol.
//!
//! # Data Flow
//! ```text
//! POST /api/event { eventName, componentId, args }
//!     → dispatcher.rs (registry lookup by event name)
//!     → handler(EventCall { component_id, args, state })
//!     → EventResult::{Markup | Structured | Value}
//!     → encode: markup body | mapping | { result, newState }
//! ```

pub mod dispatcher;

pub use dispatcher::{
    handler, EventCall, EventDispatcher, EventHandler, EventReply, EventRequest, EventResult,
};
