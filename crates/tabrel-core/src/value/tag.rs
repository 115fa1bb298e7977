use crate::value::Value;

///
/// ValueTag
///
/// Stable one-byte discriminant shared by hashing and signature encoding.
/// Signed and unsigned integers share one tag so their canonical forms agree.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ValueTag {
    Null,
    Bool,
    Integer,
    Float,
    Text,
    Blob,
}

impl ValueTag {
    pub(crate) const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) | Value::Uint(_) => Self::Integer,
            Value::Float(_) => Self::Float,
            Value::Text(_) => Self::Text,
            Value::Blob(_) => Self::Blob,
        }
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Bool => 0x01,
            Self::Integer => 0x02,
            Self::Float => 0x03,
            Self::Text => 0x04,
            Self::Blob => 0x05,
        }
    }

    // Ordering rank across families; integers and floats share the numeric rank.
    pub(crate) const fn family_rank(self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool => 1,
            Self::Integer | Self::Float => 2,
            Self::Text => 3,
            Self::Blob => 4,
        }
    }
}
