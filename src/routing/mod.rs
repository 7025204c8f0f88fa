//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (segment-wise pattern match, parameter capture)
//!     → Return: matched Route + PathParams, or NoMatch
//!
//! Route Compilation (at startup):
//!     pattern strings ("/users/<id>")
//!     → compile into Literal/Capture segments
//!     → freeze as immutable Router inside the App
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use matcher::{PathParams, PathPattern, Segment};
pub use router::{Route, RouteHandler, RouteMatch, Router};
