#![forbid(unsafe_code)]

//! Remote form synchronization for rform.
//!
//! # Role in rform
//! `rform-sync` connects a [`LayoutModel`](rform_layout::LayoutModel) to a
//! remote rendering [`Surface`]. It writes the form as one document, routes
//! path-addressed remote edits to typed callbacks, and pushes server-side
//! changes one path at a time.
//!
//! # Primary responsibilities
//! - [`FormBuilder`]: fluent layout building, `update_element` and its
//!   typed wrappers, observable-bound fields.
//! - Sync engine: `show`, `rebuild`, `close`, trigger debounce, value
//!   coercion, panic isolation at the dispatch boundary.
//! - [`MountedForm`]: render/mount/unmount with cleanup scopes.
//! - [`MemorySurface`]: deterministic in-memory surface for hosts and tests.
//! - [`SyncConfig`]: namespace, schema, screen, and environment overrides.

pub mod config;
mod engine;
pub mod error;
pub mod form;
pub mod memory;
pub mod mount;
pub mod registry;
pub mod session;
pub mod surface;

pub use config::SyncConfig;
pub use error::{FormError, Result, SurfaceError};
pub use form::FormBuilder;
pub use memory::{MemorySurface, SurfaceOp};
pub use mount::MountedForm;
pub use registry::{Callback, CloseCallback, TriggerCallback, ValueCallback};
pub use session::SessionState;
pub use surface::{DocumentId, RemoteCallback, Subject, Surface, SubscriptionHandle};
