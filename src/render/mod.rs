//! Component rendering subsystem.
//!
//! # Data Flow
//! ```text
//! render(name, props)
//!     → identity.rs (fresh instance token)
//!     → component.rs (invoke render fn with a RenderScope)
//!     → fragment.rs (parse top-level nodes, stamp or wrap)
//!     → Rendered { markup, instance_id, stylesheets }
//! ```
//!
//! # Design Decisions
//! - Every returned fragment has exactly one top-level element carrying
//!   both identity attributes; clients rely on this to target instances
//! - Full re-render every time; there is no diffing

pub mod component;
pub mod fragment;
pub mod identity;

pub use component::{ComponentDefinition, ComponentRenderer, Props, RenderScope, Rendered};
pub use identity::{IdentityRegistry, InstanceId};
