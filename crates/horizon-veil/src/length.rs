//! Numeric-or-keyword length values.
//!
//! Overlay configuration accepts lengths the way CSS-facing hosts hand them
//! over: a bare number of pixels, a `"12px"` string, a percentage, or a
//! keyword such as `"auto"`. Only pixel values take part in position math;
//! the rest are carried through for the host's styling.

use std::fmt;
use std::str::FromStr;

/// A length that may or may not be numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    /// A pixel value.
    Px(f64),
    /// A percentage of the containing block.
    Percent(f64),
    /// Any other CSS value (`auto`, `max-content`, `calc(..)`).
    Keyword(String),
}

impl Length {
    /// A pixel length.
    pub fn px(value: f64) -> Self {
        Self::Px(value)
    }

    /// A percentage length.
    pub fn percent(value: f64) -> Self {
        Self::Percent(value)
    }

    /// The pixel value, if this length is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Px(value) => Some(*value),
            Self::Percent(_) | Self::Keyword(_) => None,
        }
    }

    /// Whether this length is a pixel value.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Px(_))
    }
}

/// The numeric value of an optional length, or zero.
pub(crate) fn number_or_zero(length: Option<&Length>) -> f64 {
    length.and_then(Length::as_number).unwrap_or(0.0)
}

impl Default for Length {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::Px(value)
    }
}

impl From<i32> for Length {
    fn from(value: i32) -> Self {
        Self::Px(f64::from(value))
    }
}

impl FromStr for Length {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            if let Ok(value) = percent.trim_end().parse::<f64>() {
                return Ok(Self::Percent(value));
            }
        }
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
        match number.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self::Px(value)),
            _ => Ok(Self::Keyword(trimmed.to_owned())),
        }
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(length) => length,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(value) => write!(f, "{value}px"),
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Keyword(keyword) => f.write_str(keyword),
        }
    }
}

mod serde_impl {
    use super::Length;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    // Pixels serialize as bare numbers; everything else as its CSS text.
    impl Serialize for Length {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Length::Px(value) => serializer.serialize_f64(*value),
                other => serializer.collect_str(other),
            }
        }
    }

    struct LengthVisitor;

    impl Visitor<'_> for LengthVisitor {
        type Value = Length;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a CSS length string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Length, E> {
            Ok(Length::Px(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Length, E> {
            Ok(Length::Px(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Length, E> {
            Ok(Length::Px(value as f64))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Length, E> {
            Ok(Length::from(value))
        }
    }

    impl<'de> Deserialize<'de> for Length {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(LengthVisitor)
        }
    }
}
