#![forbid(unsafe_code)]

//! Boundary to the remote rendering surface.
//!
//! The surface owns its own copy of the form document. The engine talks to
//! it only through [`Surface`]: whole-document writes, single-path writes,
//! write permissions, per-path subscriptions, and present/dismiss.
//!
//! # Contract
//!
//! - Delivery is single-threaded, reliable, and in order per path.
//! - Subscribers observe **remote** edits. A surface should not echo the
//!   server's own `write_path` calls back to subscribers; the engine
//!   tolerates echoes but skips re-entrant ones.
//! - One writer (the owning session) per [`DocumentId`]. Concurrent writers
//!   from outside the engine are unsupported.

use std::rc::Rc;

use serde_json::Value;

use crate::error::SurfaceError;

/// The user a form is shown to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subject {
    id: Rc<str>,
}

impl Subject {
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: Rc::from(id.as_ref()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// The `(subject, namespace, schema)` triple naming one remote document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    pub subject: Subject,
    pub namespace: String,
    pub schema: String,
}

impl DocumentId {
    #[must_use]
    pub fn new(subject: Subject, namespace: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            subject,
            namespace: namespace.into(),
            schema: schema.into(),
        }
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.subject, self.namespace, self.schema)
    }
}

/// Opaque handle for one surface subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Callback receiving each remote value pushed to a subscribed path.
pub type RemoteCallback = Box<dyn FnMut(&Value)>;

/// The remote rendering surface.
///
/// Methods take `&self`; implementations use interior mutability so that a
/// subscription callback may call back into the surface.
pub trait Surface {
    /// Replace the whole remote document with `json` (JSON text).
    fn write_document(&self, doc: &DocumentId, json: &str) -> Result<(), SurfaceError>;

    /// Replace the single value at `path`.
    fn write_path(&self, doc: &DocumentId, path: &str, value: &Value) -> Result<(), SurfaceError>;

    /// Grant or revoke remote write permission for `path`.
    fn mark_writable(
        &self,
        doc: &DocumentId,
        path: &str,
        writable: bool,
    ) -> Result<(), SurfaceError>;

    /// Subscribe to remote changes at `path`.
    fn subscribe(
        &self,
        doc: &DocumentId,
        path: &str,
        callback: RemoteCallback,
    ) -> Result<SubscriptionHandle, SurfaceError>;

    /// Release a subscription.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), SurfaceError>;

    /// Render the form for `subject` on screen `screen_id`.
    fn present(&self, subject: &Subject, screen_id: &str) -> Result<(), SurfaceError>;

    /// Hide whatever is rendered for `subject`.
    fn dismiss(&self, subject: &Subject) -> Result<(), SurfaceError>;
}
