#![forbid(unsafe_code)]

//! Layout model and whole-document serialization.
//!
//! # Document schema
//!
//! ```text
//! {
//!   "title": "Settings",
//!   "layout": { "length": 2, "0": { .. }, "1": { .. } },
//!   "closeButton": { "label": "x", "button_visible": true, "onClick": 0 }
//! }
//! ```
//!
//! # Invariants
//!
//! 1. Indices are assigned in insertion order and never reused or reordered.
//! 2. `layout.length` always equals the number of descriptors.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::element::ElementDescriptor;
use crate::key::FieldKey;
use crate::value::FieldValue;
use crate::LayoutError;

/// Ordered, append-only sequence of element descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutModel {
    elements: Vec<ElementDescriptor>,
}

impl LayoutModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor and return its index.
    pub fn push(&mut self, descriptor: ElementDescriptor) -> usize {
        self.elements.push(descriptor);
        self.elements.len() - 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ElementDescriptor> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ElementDescriptor> {
        self.elements.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementDescriptor> {
        self.elements.iter()
    }

    /// Read the value addressed by `key`.
    #[must_use]
    pub fn read(&self, key: FieldKey) -> Option<FieldValue> {
        self.get(key.element)?.get(key.property)
    }

    /// Coerce and store a value at `key`, returning the stored value.
    pub fn write(&mut self, key: FieldKey, value: FieldValue) -> Result<FieldValue, LayoutError> {
        let len = self.len();
        let descriptor = self
            .elements
            .get_mut(key.element)
            .ok_or(LayoutError::IndexOutOfRange {
                index: key.element,
                len,
            })?;
        descriptor.set(key.property, value)
    }

    /// The `layout` object: `length` plus one entry per index.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("length".to_string(), Value::from(self.elements.len()));
        for (index, element) in self.elements.iter().enumerate() {
            obj.insert(index.to_string(), element.to_json());
        }
        Value::Object(obj)
    }
}

/// The implicit close-button descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseButton {
    pub label: String,
    pub button_visible: bool,
    #[serde(rename = "onClick")]
    pub on_click: i64,
}

impl CloseButton {
    #[must_use]
    pub fn new(label: impl Into<String>, visible: bool) -> Self {
        Self {
            label: label.into(),
            button_visible: visible,
            on_click: 0,
        }
    }
}

/// Serialize a complete form document.
#[must_use]
pub fn form_document(title: &str, layout: &LayoutModel, close: &CloseButton) -> Value {
    let mut doc = Map::new();
    doc.insert("title".to_string(), Value::String(title.to_string()));
    doc.insert("layout".to_string(), layout.to_json());
    doc.insert(
        "closeButton".to_string(),
        serde_json::to_value(close).unwrap_or(Value::Null),
    );
    Value::Object(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> LayoutModel {
        let mut layout = LayoutModel::new();
        layout.push(ElementDescriptor::header("Audio"));
        layout.push(ElementDescriptor::toggle("Sound", false));
        layout.push(ElementDescriptor::slider("Volume", 50.0, 0.0, 100.0, 1.0));
        layout
    }

    #[test]
    fn push_assigns_sequential_indices() {
        let mut layout = sample();
        assert_eq!(layout.push(ElementDescriptor::divider()), 3);
        assert_eq!(layout.len(), 4);
    }

    #[test]
    fn read_and_write_by_key() {
        let mut layout = sample();
        let key = FieldKey::new(1, Property::Toggled);
        assert_eq!(layout.read(key), Some(FieldValue::Bool(false)));
        layout.write(key, "x".into()).expect("toggle accepts toggled");
        assert_eq!(layout.read(key), Some(FieldValue::Bool(true)));

        assert_eq!(
            layout.write(FieldKey::new(9, Property::Value), 1.into()),
            Err(LayoutError::IndexOutOfRange { index: 9, len: 3 })
        );
    }

    #[test]
    fn full_document_shape() {
        let layout = sample();
        let doc = form_document("Settings", &layout, &CloseButton::new("x", true));
        assert_eq!(
            doc,
            json!({
                "title": "Settings",
                "layout": {
                    "length": 3,
                    "0": { "header_visible": true, "visible": true, "text": "Audio" },
                    "1": {
                        "toggle_visible": true, "visible": true,
                        "label": "Sound", "toggled": false, "description": "",
                    },
                    "2": {
                        "slider_visible": true, "visible": true,
                        "label": "Volume", "value": 50, "minValue": 0, "maxValue": 100,
                        "step": 1, "description": "",
                    },
                },
                "closeButton": { "label": "x", "button_visible": true, "onClick": 0 },
            })
        );
    }
}
