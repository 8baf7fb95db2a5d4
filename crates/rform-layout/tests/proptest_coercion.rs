//! Property-based invariant tests for value coercion.
//!
//! 1. Remote coercion is total and recognizes booleans regardless of case
//!    and surrounding whitespace.
//! 2. Every property's type tag yields a value of that tag's shape.
//! 3. Integral numbers format without a fractional part.
//! 4. Trigger counts never panic and are positive only for positive input.

use proptest::prelude::*;
use rform_layout::{FieldValue, Property, PropertyType, format_number, trigger_count};
use serde_json::json;

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<bool>().prop_map(FieldValue::Bool),
        any::<f64>().prop_map(FieldValue::Number),
        ".{0,16}".prop_map(FieldValue::Text),
    ]
}

proptest! {
    #[test]
    fn remote_booleans_ignore_case_and_padding(
        value in any::<bool>(),
        upper in any::<bool>(),
        left in "[ \t]{0,3}",
        right in "[ \t]{0,3}",
    ) {
        let word = if value { "true" } else { "false" };
        let word = if upper { word.to_ascii_uppercase() } else { word.to_string() };
        let raw = format!("{left}{word}{right}");
        prop_assert_eq!(FieldValue::from_remote(&json!(raw)), FieldValue::Bool(value));
    }

    #[test]
    fn remote_integers_become_numbers(n in -1_000_000i64..1_000_000) {
        prop_assert_eq!(
            FieldValue::from_remote(&json!(n.to_string())),
            FieldValue::Number(n as f64)
        );
    }

    #[test]
    fn remote_coercion_is_total(raw in ".{0,24}") {
        match FieldValue::from_remote(&json!(raw.clone())) {
            FieldValue::Text(text) => prop_assert_eq!(text, raw),
            FieldValue::Number(n) => prop_assert!(n.is_finite()),
            FieldValue::Bool(_) => {}
        }
    }

    #[test]
    fn typed_coercion_matches_tag(value in field_value()) {
        for property in Property::ALL {
            let coerced = property.coerce(value.clone());
            let shape_ok = match property.ty() {
                PropertyType::Bool => matches!(coerced, FieldValue::Bool(_)),
                PropertyType::Number => matches!(coerced, FieldValue::Number(_)),
                PropertyType::Text => matches!(coerced, FieldValue::Text(_)),
                PropertyType::Trigger => {
                    matches!(coerced, FieldValue::Number(n) if n.fract() == 0.0)
                }
            };
            prop_assert!(shape_ok, "{property} produced {coerced:?}");
        }
    }

    #[test]
    fn integral_numbers_format_without_fraction(n in -1_000_000_000i64..1_000_000_000) {
        prop_assert_eq!(format_number(n as f64), n.to_string());
    }

    #[test]
    fn trigger_count_sign_follows_input(n in -1000i64..1000) {
        let count = trigger_count(&json!(n));
        prop_assert_eq!(count, n);
        prop_assert_eq!(trigger_count(&json!(n.to_string())), n);
    }
}
