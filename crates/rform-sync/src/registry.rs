#![forbid(unsafe_code)]

//! Typed callback registry.
//!
//! Maps a [`FieldKey`] to the callback remote edits at that key are routed
//! to. The variant is fixed at registration by the element kind: buttons
//! register [`Callback::Trigger`], inputs register [`Callback::Value`].
//!
//! Registering a key twice keeps the last callback.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rform_layout::{FieldKey, FieldValue};
use tracing::debug;

use crate::form::FormBuilder;
use crate::surface::Subject;

/// Invoked once per consumed trigger.
pub type TriggerCallback = Box<dyn FnMut(&Subject, &FormBuilder)>;

/// Invoked with each coerced remote value.
pub type ValueCallback = Box<dyn FnMut(FieldValue, &Subject, &FormBuilder)>;

/// Invoked after the implicit close button closed the session.
pub type CloseCallback = Box<dyn FnMut(&Subject)>;

pub enum Callback {
    Trigger(TriggerCallback),
    Value(ValueCallback),
}

impl Callback {
    #[must_use]
    pub const fn is_trigger(&self) -> bool {
        matches!(self, Self::Trigger(_))
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Trigger(_) => "Callback::Trigger",
            Self::Value(_) => "Callback::Value",
        })
    }
}

pub(crate) type SharedCallback = Rc<RefCell<Callback>>;

#[derive(Debug, Default)]
pub(crate) struct CallbackRegistry {
    entries: BTreeMap<FieldKey, SharedCallback>,
}

impl CallbackRegistry {
    /// Store `callback` at `key`. Returns true if it replaced another.
    pub fn register(&mut self, key: FieldKey, callback: Callback) -> bool {
        let replaced = self
            .entries
            .insert(key, Rc::new(RefCell::new(callback)))
            .is_some();
        if replaced {
            debug!(path = %key, "callback replaced");
        }
        replaced
    }

    /// Shared handle to the callback at `key`, cloned out so the caller can
    /// invoke it without holding the registry borrowed.
    pub fn get(&self, key: FieldKey) -> Option<SharedCallback> {
        self.entries.get(&key).map(Rc::clone)
    }

    pub fn keys(&self) -> Vec<FieldKey> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rform_layout::Property;

    fn noop_value() -> Callback {
        Callback::Value(Box::new(|_: FieldValue, _: &Subject, _: &FormBuilder| {}))
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = CallbackRegistry::default();
        let key = FieldKey::new(0, Property::OnClick);
        assert!(!registry.register(key, noop_value()));
        assert!(registry.register(
            key,
            Callback::Trigger(Box::new(|_: &Subject, _: &FormBuilder| {}))
        ));

        assert_eq!(registry.len(), 1);
        let callback = registry.get(key).expect("registered");
        assert!(callback.borrow().is_trigger());
    }

    #[test]
    fn keys_are_ordered_by_index() {
        let mut registry = CallbackRegistry::default();
        registry.register(FieldKey::new(4, Property::Value), noop_value());
        registry.register(FieldKey::new(1, Property::Toggled), noop_value());
        let indices: Vec<usize> = registry.keys().iter().map(|k| k.element).collect();
        assert_eq!(indices, vec![1, 4]);
        assert!(registry.get(FieldKey::new(2, Property::Value)).is_none());
    }
}
