//! Derived index values.

use crate::error::{CoreError, CoreResult};
use ciborium::Value as CborValue;
use std::fmt;

/// A value derived from a record that keys one index entry.
///
/// Index entries are addressed by the [`Display`](fmt::Display) form of
/// this value, so `Integer(59)` and `Text("59")` address the same entry.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// Null, or a missing field.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text string.
    Text(String),
}

impl IndexValue {
    /// Converts a projected CBOR value into an index value.
    ///
    /// Arrays, maps and byte strings cannot key an index.
    pub(crate) fn from_cbor(index: &str, value: &CborValue) -> CoreResult<Self> {
        let unsupported = |kind| CoreError::UnsupportedIndexValue {
            index: index.to_string(),
            kind,
        };

        match value {
            CborValue::Null => Ok(Self::Null),
            CborValue::Bool(b) => Ok(Self::Bool(*b)),
            CborValue::Integer(i) => i64::try_from(i128::from(*i))
                .map(Self::Integer)
                .map_err(|_| unsupported("out-of-range integer")),
            CborValue::Float(f) => Ok(Self::Float(*f)),
            CborValue::Text(s) => Ok(Self::Text(s.clone())),
            CborValue::Tag(_, inner) => Self::from_cbor(index, inner),
            CborValue::Bytes(_) => Err(unsupported("byte string")),
            CborValue::Array(_) => Err(unsupported("array")),
            CborValue::Map(_) => Err(unsupported("map")),
            _ => Err(unsupported("unrecognized")),
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for IndexValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for IndexValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for IndexValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for IndexValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for IndexValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<IndexValue>> From<Option<T>> for IndexValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(IndexValue::from(59).to_string(), "59");
        assert_eq!(IndexValue::from(-3i64).to_string(), "-3");
        assert_eq!(IndexValue::from("Lukov").to_string(), "Lukov");
        assert_eq!(IndexValue::from(true).to_string(), "true");
        assert_eq!(IndexValue::from(2.5).to_string(), "2.5");
        assert_eq!(IndexValue::from(None::<u32>).to_string(), "null");
    }

    #[test]
    fn whole_floats_print_like_integers() {
        assert_eq!(IndexValue::from(40.0).to_string(), "40");
    }

    #[test]
    fn cbor_scalars_convert() {
        assert_eq!(
            IndexValue::from_cbor("i", &CborValue::Integer(17.into())).unwrap(),
            IndexValue::Integer(17)
        );
        assert_eq!(
            IndexValue::from_cbor("i", &CborValue::Text("x".into())).unwrap(),
            IndexValue::Text("x".into())
        );
        assert_eq!(
            IndexValue::from_cbor("i", &CborValue::Null).unwrap(),
            IndexValue::Null
        );
    }

    #[test]
    fn cbor_containers_rejected() {
        let result = IndexValue::from_cbor("tags", &CborValue::Array(vec![]));
        assert!(matches!(
            result,
            Err(CoreError::UnsupportedIndexValue { kind: "array", .. })
        ));
    }
}
