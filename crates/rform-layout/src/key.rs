#![forbid(unsafe_code)]

//! Structured field addresses.
//!
//! Internally a field is addressed by [`FieldKey`] (element index plus
//! [`Property`]). The wire string is produced only at the surface boundary
//! through [`FieldPath`]'s `Display`, and parsed back with `FromStr`:
//!
//! | Path | Wire string |
//! |------|-------------|
//! | `Element(FieldKey { element: 3, property: Toggled })` | `layout[3].toggled` |
//! | `CloseTrigger` | `closeButton.onClick` |
//! | `Title` | `title` |

use std::str::FromStr;

use crate::LayoutError;
use crate::property::Property;

/// Element index plus sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub element: usize,
    pub property: Property,
}

impl FieldKey {
    #[must_use]
    pub const fn new(element: usize, property: Property) -> Self {
        Self { element, property }
    }

    #[must_use]
    pub const fn path(self) -> FieldPath {
        FieldPath::Element(self)
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layout[{}].{}", self.element, self.property)
    }
}

/// Any addressable value in the form document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Element(FieldKey),
    /// Implicit close-button trigger.
    CloseTrigger,
    Title,
}

impl FieldPath {
    pub const CLOSE_TRIGGER: &'static str = "closeButton.onClick";
    pub const TITLE: &'static str = "title";

    /// Whether values at this path are trigger counters.
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        match self {
            Self::Element(key) => key.property.is_trigger(),
            Self::CloseTrigger => true,
            Self::Title => false,
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element(key) => write!(f, "{key}"),
            Self::CloseTrigger => f.write_str(Self::CLOSE_TRIGGER),
            Self::Title => f.write_str(Self::TITLE),
        }
    }
}

impl From<FieldKey> for FieldPath {
    fn from(key: FieldKey) -> Self {
        Self::Element(key)
    }
}

impl FromStr for FieldPath {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::CLOSE_TRIGGER => return Ok(Self::CloseTrigger),
            Self::TITLE => return Ok(Self::Title),
            _ => {}
        }
        let bad = || LayoutError::BadPath(s.to_string());
        let rest = s.strip_prefix("layout[").ok_or_else(bad)?;
        let (index, property) = rest.split_once("].").ok_or_else(bad)?;
        let element = index.parse::<usize>().map_err(|_| bad())?;
        let property = property.parse::<Property>()?;
        Ok(Self::Element(FieldKey { element, property }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings() {
        assert_eq!(
            FieldKey::new(3, Property::Toggled).path().to_string(),
            "layout[3].toggled"
        );
        assert_eq!(
            FieldKey::new(0, Property::MinValue).to_string(),
            "layout[0].minValue"
        );
        assert_eq!(FieldPath::CloseTrigger.to_string(), "closeButton.onClick");
        assert_eq!(FieldPath::Title.to_string(), "title");
    }

    #[test]
    fn parse_round_trip() {
        for path in [
            FieldPath::Element(FieldKey::new(12, Property::OnClick)),
            FieldPath::CloseTrigger,
            FieldPath::Title,
        ] {
            assert_eq!(path.to_string().parse::<FieldPath>(), Ok(path));
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "layout[x].value".parse::<FieldPath>(),
            Err(LayoutError::BadPath("layout[x].value".into()))
        );
        assert!("layout[1]value".parse::<FieldPath>().is_err());
        assert!("layout[-1].value".parse::<FieldPath>().is_err());
        assert_eq!(
            "layout[1].colour".parse::<FieldPath>(),
            Err(LayoutError::UnknownProperty("colour".into()))
        );
    }

    #[test]
    fn trigger_paths() {
        assert!(FieldPath::CloseTrigger.is_trigger());
        assert!(FieldKey::new(0, Property::OnClick).path().is_trigger());
        assert!(!FieldKey::new(0, Property::Value).path().is_trigger());
    }
}
