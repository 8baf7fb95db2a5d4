#![forbid(unsafe_code)]

//! Error types for the form engine and its surface boundary.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `InvalidState` | Mutation while not shown, or `show` while shown | Returned to caller |
//! | `IndexOutOfRange` | Element index outside the layout | Returned to caller |
//! | `PropertyMismatch` | Kind lacks the property | Returned to caller |
//! | `SurfaceError::SubscriptionDisposed` | Surface already dropped the subscription | Swallowed during teardown |
//! | Panicking callback | User code panicked | Caught and logged at the dispatch boundary |

use rform_layout::{ElementKind, LayoutError, Property};

use crate::session::SessionState;
use crate::surface::SubscriptionHandle;

/// Errors reported by a [`Surface`](crate::surface::Surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The subscription is no longer known to the surface.
    SubscriptionDisposed(SubscriptionHandle),
    /// The remote side refused a write to a path it does not allow.
    NotWritable(String),
    /// Any other transport-level refusal.
    Rejected(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubscriptionDisposed(handle) => {
                write!(f, "subscription {} already disposed", handle.get())
            }
            Self::NotWritable(path) => write!(f, "path not remotely writable: {path}"),
            Self::Rejected(msg) => write!(f, "surface rejected request: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Errors from form operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The session is not in the state the operation requires.
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
    /// Element index outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// The element kind does not carry the property.
    PropertyMismatch {
        index: usize,
        kind: ElementKind,
        property: Property,
    },
    /// A property name did not match any known sub-field.
    UnknownProperty(String),
    /// Any other layout-level failure.
    Layout(LayoutError),
    /// The surface refused a write.
    Surface(SurfaceError),
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidState { expected, actual } => {
                write!(f, "invalid session state: expected {expected}, was {actual}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "element index {index} out of range (len {len})")
            }
            Self::PropertyMismatch {
                index,
                kind,
                property,
            } => write!(f, "element {index} ({kind}) has no '{property}' property"),
            Self::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            Self::Layout(err) => write!(f, "layout error: {err}"),
            Self::Surface(err) => write!(f, "surface error: {err}"),
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SurfaceError> for FormError {
    fn from(err: SurfaceError) -> Self {
        Self::Surface(err)
    }
}

impl FormError {
    /// Attach the element index to a layout error.
    pub(crate) fn from_layout(index: usize, err: LayoutError) -> Self {
        match err {
            LayoutError::PropertyMismatch { kind, property } => Self::PropertyMismatch {
                index,
                kind,
                property,
            },
            LayoutError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
            LayoutError::UnknownProperty(name) => Self::UnknownProperty(name),
            other => Self::Layout(other),
        }
    }
}

/// Result alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;
