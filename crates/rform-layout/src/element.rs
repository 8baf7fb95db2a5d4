#![forbid(unsafe_code)]

//! Element descriptors.
//!
//! An [`ElementDescriptor`] is one typed unit of form layout: a shared
//! `visible` flag plus a kind-specific [`Element`] body. Properties are read
//! and written through [`get`](ElementDescriptor::get) and
//! [`set`](ElementDescriptor::set), which only accept the properties the kind
//! actually carries.
//!
//! # Wire shape
//!
//! Every descriptor serializes to a flat JSON object holding
//! `"<kind>_visible": true`, the generic `visible` flag, and the kind fields:
//!
//! ```text
//! { "toggle_visible": true, "visible": true,
//!   "label": "Sound", "toggled": false, "description": "" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::LayoutError;
use crate::property::Property;
use crate::value::{FieldValue, number_to_json};

/// Discriminant of an element descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Header,
    Spacer,
    Divider,
    TextField,
    Toggle,
    Slider,
    Dropdown,
    Button,
}

impl ElementKind {
    /// Name used for the `<kind>_visible` flag.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Spacer => "spacer",
            Self::Divider => "divider",
            Self::TextField => "textField",
            Self::Toggle => "toggle",
            Self::Slider => "slider",
            Self::Dropdown => "dropdown",
            Self::Button => "button",
        }
    }

    /// The sub-field whose remote edits are routed to a kind's callback, if
    /// the kind accepts input at all.
    #[must_use]
    pub const fn input_property(self) -> Option<Property> {
        match self {
            Self::TextField => Some(Property::Text),
            Self::Toggle => Some(Property::Toggled),
            Self::Slider | Self::Dropdown => Some(Property::Value),
            Self::Button => Some(Property::OnClick),
            Self::Header | Self::Spacer | Self::Divider => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One dropdown entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownItem {
    pub label: String,
    /// Defaults to the item's position when left unset.
    pub value: Option<f64>,
    #[serde(default)]
    pub description: String,
}

impl DropdownItem {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl From<&str> for DropdownItem {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for DropdownItem {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

/// Non-empty, ordered dropdown item list with every value resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownItems(Vec<DropdownItem>);

impl DropdownItems {
    /// Build from items; fails on an empty list. Missing values become the
    /// item's position index.
    pub fn new<I, T>(items: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = T>,
        T: Into<DropdownItem>,
    {
        let items: Vec<DropdownItem> = items
            .into_iter()
            .map(Into::into)
            .enumerate()
            .map(|(i, mut item)| {
                item.value.get_or_insert(i as f64);
                item
            })
            .collect();
        if items.is_empty() {
            return Err(LayoutError::EmptyDropdown);
        }
        Ok(Self(items))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DropdownItem] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "label": item.label,
                        "value": number_to_json(item.value.unwrap_or(0.0)),
                        "description": item.description,
                    })
                })
                .collect(),
        )
    }
}

impl TryFrom<Vec<DropdownItem>> for DropdownItems {
    type Error = LayoutError;

    fn try_from(items: Vec<DropdownItem>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

/// Kind-specific body of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Header {
        text: String,
    },
    Spacer,
    Divider,
    TextField {
        label: String,
        text: String,
        description: String,
    },
    Toggle {
        label: String,
        toggled: bool,
        description: String,
    },
    Slider {
        label: String,
        value: f64,
        min_value: f64,
        max_value: f64,
        step: f64,
        description: String,
    },
    Dropdown {
        label: String,
        value: f64,
        description: String,
        items: DropdownItems,
    },
    Button {
        label: String,
        tooltip: String,
        disabled: bool,
        trigger_counter: i64,
    },
}

/// One indexed unit of form layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDescriptor {
    pub visible: bool,
    pub body: Element,
}

impl ElementDescriptor {
    /// A visible descriptor with the given body.
    #[must_use]
    pub fn new(body: Element) -> Self {
        Self {
            visible: true,
            body,
        }
    }

    #[must_use]
    pub fn header(text: impl Into<String>) -> Self {
        Self::new(Element::Header { text: text.into() })
    }

    #[must_use]
    pub fn spacer() -> Self {
        Self::new(Element::Spacer)
    }

    #[must_use]
    pub fn divider() -> Self {
        Self::new(Element::Divider)
    }

    #[must_use]
    pub fn text_field(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Element::TextField {
            label: label.into(),
            text: text.into(),
            description: String::new(),
        })
    }

    #[must_use]
    pub fn toggle(label: impl Into<String>, toggled: bool) -> Self {
        Self::new(Element::Toggle {
            label: label.into(),
            toggled,
            description: String::new(),
        })
    }

    #[must_use]
    pub fn slider(
        label: impl Into<String>,
        value: f64,
        min_value: f64,
        max_value: f64,
        step: f64,
    ) -> Self {
        Self::new(Element::Slider {
            label: label.into(),
            value,
            min_value,
            max_value,
            step,
            description: String::new(),
        })
    }

    #[must_use]
    pub fn dropdown(label: impl Into<String>, items: DropdownItems, value: f64) -> Self {
        Self::new(Element::Dropdown {
            label: label.into(),
            value,
            description: String::new(),
            items,
        })
    }

    #[must_use]
    pub fn button(label: impl Into<String>) -> Self {
        Self::new(Element::Button {
            label: label.into(),
            tooltip: String::new(),
            disabled: false,
            trigger_counter: 0,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self.body {
            Element::Header { .. } => ElementKind::Header,
            Element::Spacer => ElementKind::Spacer,
            Element::Divider => ElementKind::Divider,
            Element::TextField { .. } => ElementKind::TextField,
            Element::Toggle { .. } => ElementKind::Toggle,
            Element::Slider { .. } => ElementKind::Slider,
            Element::Dropdown { .. } => ElementKind::Dropdown,
            Element::Button { .. } => ElementKind::Button,
        }
    }

    /// Whether this kind carries `property`.
    #[must_use]
    pub fn supports(&self, property: Property) -> bool {
        self.get(property).is_some()
    }

    /// Current value of `property`, or `None` if the kind lacks it.
    #[must_use]
    pub fn get(&self, property: Property) -> Option<FieldValue> {
        use Property as P;
        if property == P::Visible {
            return Some(FieldValue::Bool(self.visible));
        }
        let value: FieldValue = match (&self.body, property) {
            (Element::Header { text }, P::Text) => text.clone().into(),
            (
                Element::TextField {
                    label,
                    text,
                    description,
                },
                p,
            ) => match p {
                P::Label => label.clone().into(),
                P::Text => text.clone().into(),
                P::Description => description.clone().into(),
                _ => return None,
            },
            (
                Element::Toggle {
                    label,
                    toggled,
                    description,
                },
                p,
            ) => match p {
                P::Label => label.clone().into(),
                P::Toggled => (*toggled).into(),
                P::Description => description.clone().into(),
                _ => return None,
            },
            (
                Element::Slider {
                    label,
                    value,
                    min_value,
                    max_value,
                    step,
                    description,
                },
                p,
            ) => match p {
                P::Label => label.clone().into(),
                P::Value => (*value).into(),
                P::MinValue => (*min_value).into(),
                P::MaxValue => (*max_value).into(),
                P::Step => (*step).into(),
                P::Description => description.clone().into(),
                _ => return None,
            },
            (
                Element::Dropdown {
                    label,
                    value,
                    description,
                    ..
                },
                p,
            ) => match p {
                P::Label => label.clone().into(),
                P::Value => (*value).into(),
                P::Description => description.clone().into(),
                _ => return None,
            },
            (
                Element::Button {
                    label,
                    tooltip,
                    disabled,
                    trigger_counter,
                },
                p,
            ) => match p {
                P::Label => label.clone().into(),
                P::Tooltip => tooltip.clone().into(),
                P::Disabled => (*disabled).into(),
                P::OnClick => FieldValue::Number(*trigger_counter as f64),
                _ => return None,
            },
            _ => return None,
        };
        Some(value)
    }

    /// Coerce `value` by the property's type tag and store it.
    ///
    /// Returns the stored (coerced) value, or
    /// [`LayoutError::PropertyMismatch`] if this kind lacks the property.
    pub fn set(
        &mut self,
        property: Property,
        value: FieldValue,
    ) -> Result<FieldValue, LayoutError> {
        use Property as P;
        let kind = self.kind();
        let value = property.coerce(value);
        let mismatch = || LayoutError::PropertyMismatch { kind, property };

        if property == P::Visible {
            self.visible = value.truthy();
            return Ok(value);
        }
        match (&mut self.body, property) {
            (Element::Header { text }, P::Text) => *text = value.to_text(),
            (
                Element::TextField {
                    label,
                    text,
                    description,
                },
                p,
            ) => match p {
                P::Label => *label = value.to_text(),
                P::Text => *text = value.to_text(),
                P::Description => *description = value.to_text(),
                _ => return Err(mismatch()),
            },
            (
                Element::Toggle {
                    label,
                    toggled,
                    description,
                },
                p,
            ) => match p {
                P::Label => *label = value.to_text(),
                P::Toggled => *toggled = value.truthy(),
                P::Description => *description = value.to_text(),
                _ => return Err(mismatch()),
            },
            (
                Element::Slider {
                    label,
                    value: current,
                    min_value,
                    max_value,
                    step,
                    description,
                },
                p,
            ) => match p {
                P::Label => *label = value.to_text(),
                P::Value => *current = value.to_number(),
                P::MinValue => *min_value = value.to_number(),
                P::MaxValue => *max_value = value.to_number(),
                P::Step => *step = value.to_number(),
                P::Description => *description = value.to_text(),
                _ => return Err(mismatch()),
            },
            (
                Element::Dropdown {
                    label,
                    value: current,
                    description,
                    ..
                },
                p,
            ) => match p {
                P::Label => *label = value.to_text(),
                P::Value => *current = value.to_number(),
                P::Description => *description = value.to_text(),
                _ => return Err(mismatch()),
            },
            (
                Element::Button {
                    label,
                    tooltip,
                    disabled,
                    trigger_counter,
                },
                p,
            ) => match p {
                P::Label => *label = value.to_text(),
                P::Tooltip => *tooltip = value.to_text(),
                P::Disabled => *disabled = value.truthy(),
                P::OnClick => *trigger_counter = value.to_number() as i64,
                _ => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        }
        Ok(value)
    }

    /// Serialize to the flat wire object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        let kind = self.kind();
        obj.insert(format!("{}_visible", kind.wire_name()), Value::Bool(true));
        for property in Property::ALL {
            if let Some(value) = self.get(property) {
                obj.insert(property.wire_name().to_string(), value.to_json());
            }
        }
        if let Element::Dropdown { items, .. } = &self.body {
            obj.insert("items".to_string(), items.to_json());
        }
        Value::Object(obj)
    }
}
