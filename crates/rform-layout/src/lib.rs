#![forbid(unsafe_code)]

//! Form layout model for rform.
//!
//! # Role in rform
//! `rform-layout` is pure data. It knows what a form looks like and how it
//! is written on the wire, but nothing about surfaces, sessions, or
//! callbacks.
//!
//! # Primary responsibilities
//! - [`ElementDescriptor`] / [`Element`]: typed element kinds.
//! - [`Property`] / [`PropertyType`]: closed set of mutable sub-fields with
//!   one coercion rule per type tag.
//! - [`FieldValue`]: primitive values and remote coercion.
//! - [`FieldKey`] / [`FieldPath`]: structured addresses and wire paths.
//! - [`LayoutModel`] / [`form_document`]: ordered layout and full document.

pub mod document;
pub mod element;
pub mod key;
pub mod property;
pub mod value;

pub use document::{CloseButton, LayoutModel, form_document};
pub use element::{DropdownItem, DropdownItems, Element, ElementDescriptor, ElementKind};
pub use key::{FieldKey, FieldPath};
pub use property::{Property, PropertyType};
pub use value::{FieldValue, format_number, trigger_count};

/// Errors from layout operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A dropdown was given no items.
    EmptyDropdown,
    /// A property name did not match any known sub-field.
    UnknownProperty(String),
    /// A wire path could not be parsed.
    BadPath(String),
    /// The element kind does not carry the property.
    PropertyMismatch {
        kind: ElementKind,
        property: Property,
    },
    /// Element index outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDropdown => write!(f, "dropdown requires at least one item"),
            Self::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            Self::BadPath(path) => write!(f, "malformed field path: {path}"),
            Self::PropertyMismatch { kind, property } => {
                write!(f, "{kind} element has no '{property}' property")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "element index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
