#![forbid(unsafe_code)]

//! Mutable element sub-fields and their type tags.
//!
//! Every [`Property`] carries exactly one [`PropertyType`]; the tag decides
//! how an incoming [`FieldValue`] is coerced before it is stored. The
//! mapping is a closed `match`, so adding a property forces a decision about
//! its type.

use std::str::FromStr;

use serde_json::Value;

use crate::LayoutError;
use crate::value::FieldValue;

/// Addressable sub-field of an element descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Visible,
    Disabled,
    Toggled,
    Value,
    MinValue,
    MaxValue,
    Step,
    Text,
    Label,
    Description,
    Tooltip,
    /// Button trigger counter.
    OnClick,
}

/// Storage type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Bool,
    Number,
    Text,
    /// Integer counter used to emulate click events.
    Trigger,
}

impl PropertyType {
    /// Coerce a value into this type. Never fails.
    #[must_use]
    pub fn coerce(self, value: FieldValue) -> FieldValue {
        match self {
            Self::Bool => FieldValue::Bool(value.truthy()),
            Self::Number => FieldValue::Number(value.to_number()),
            Self::Text => match value {
                FieldValue::Text(s) => FieldValue::Text(s),
                other => FieldValue::Text(other.to_text()),
            },
            Self::Trigger => {
                let n = value.to_number();
                FieldValue::Number(if n.is_finite() { n.trunc() } else { 0.0 })
            }
        }
    }

    /// The value to store for a raw client edit. Text keeps exactly what the
    /// client sent; other tags read `"true"`/`"42"` strings first.
    #[must_use]
    pub fn store_remote(self, raw: &Value) -> FieldValue {
        match self {
            Self::Text => self.coerce(FieldValue::from_raw_json(raw)),
            _ => self.coerce(FieldValue::from_remote(raw)),
        }
    }
}

impl Property {
    pub const ALL: [Self; 12] = [
        Self::Visible,
        Self::Disabled,
        Self::Toggled,
        Self::Value,
        Self::MinValue,
        Self::MaxValue,
        Self::Step,
        Self::Text,
        Self::Label,
        Self::Description,
        Self::Tooltip,
        Self::OnClick,
    ];

    /// Type tag of this property.
    #[must_use]
    pub const fn ty(self) -> PropertyType {
        match self {
            Self::Visible | Self::Disabled | Self::Toggled => PropertyType::Bool,
            Self::Value | Self::MinValue | Self::MaxValue | Self::Step => PropertyType::Number,
            Self::Text | Self::Label | Self::Description | Self::Tooltip => PropertyType::Text,
            Self::OnClick => PropertyType::Trigger,
        }
    }

    /// Whether this property is a click-style trigger.
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self.ty(), PropertyType::Trigger)
    }

    /// Name used in wire paths and documents.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Disabled => "disabled",
            Self::Toggled => "toggled",
            Self::Value => "value",
            Self::MinValue => "minValue",
            Self::MaxValue => "maxValue",
            Self::Step => "step",
            Self::Text => "text",
            Self::Label => "label",
            Self::Description => "description",
            Self::Tooltip => "tooltip",
            Self::OnClick => "onClick",
        }
    }

    /// Coerce `value` by this property's type tag.
    #[must_use]
    pub fn coerce(self, value: FieldValue) -> FieldValue {
        self.ty().coerce(value)
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Property {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.wire_name() == s)
            .ok_or_else(|| LayoutError::UnknownProperty(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_round_trip() {
        for p in Property::ALL {
            assert_eq!(p.wire_name().parse::<Property>(), Ok(p));
        }
        assert!("colour".parse::<Property>().is_err());
    }

    #[test]
    fn stored_remote_text_is_verbatim() {
        let text = PropertyType::Text;
        assert_eq!(text.store_remote(&json!("007")), FieldValue::Text("007".into()));
        assert_eq!(text.store_remote(&json!("True ")), FieldValue::Text("True ".into()));
        assert_eq!(text.store_remote(&json!(1e3)), FieldValue::Text("1000".into()));
    }

    #[test]
    fn stored_remote_non_text_reads_strings() {
        assert_eq!(PropertyType::Bool.store_remote(&json!("false")), FieldValue::Bool(false));
        assert_eq!(PropertyType::Bool.store_remote(&json!(" TRUE")), FieldValue::Bool(true));
        assert_eq!(PropertyType::Number.store_remote(&json!("007")), FieldValue::Number(7.0));
        assert_eq!(PropertyType::Number.store_remote(&json!("true")), FieldValue::Number(1.0));
    }

    #[test]
    fn type_tags() {
        assert_eq!(Property::Toggled.ty(), PropertyType::Bool);
        assert_eq!(Property::Step.ty(), PropertyType::Number);
        assert_eq!(Property::Tooltip.ty(), PropertyType::Text);
        assert!(Property::OnClick.is_trigger());
        assert!(!Property::Value.is_trigger());
    }

    #[test]
    fn coercion_per_tag() {
        assert_eq!(Property::Visible.coerce("yes".into()), FieldValue::Bool(true));
        assert_eq!(Property::Disabled.coerce(0.into()), FieldValue::Bool(false));
        assert_eq!(Property::Value.coerce("75".into()), FieldValue::Number(75.0));
        assert_eq!(Property::Label.coerce(3.into()), FieldValue::Text("3".into()));
        assert_eq!(Property::OnClick.coerce(2.7.into()), FieldValue::Number(2.0));
        assert_eq!(Property::OnClick.coerce("x".into()), FieldValue::Number(0.0));
    }
}
