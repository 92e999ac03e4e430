use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The payload of a scalar value token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(Arc<str>),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int64(i) => Some(*i),
            ScalarValue::Uint64(u) => (*u).try_into().ok(),
            ScalarValue::Null
            | ScalarValue::Boolean(_)
            | ScalarValue::Float64(_)
            | ScalarValue::String(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ScalarValue::Uint64(u) => Some(*u),
            ScalarValue::Int64(i) => (*i).try_into().ok(),
            ScalarValue::Null
            | ScalarValue::Boolean(_)
            | ScalarValue::Float64(_)
            | ScalarValue::String(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Textual rendition of the scalar, as a plain token source reports it.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            ScalarValue::Null => Cow::Borrowed("null"),
            ScalarValue::Boolean(true) => Cow::Borrowed("true"),
            ScalarValue::Boolean(false) => Cow::Borrowed("false"),
            ScalarValue::Int64(i) => Cow::Owned(i.to_string()),
            ScalarValue::Uint64(u) => Cow::Owned(u.to_string()),
            ScalarValue::Float64(f) => Cow::Owned(f.to_string()),
            ScalarValue::String(s) => Cow::Borrowed(s.as_ref()),
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Uint64(l), Self::Uint64(r)) => l == r,
            // Signedness is a representation detail, not a value difference.
            (Self::Int64(l), Self::Uint64(r)) | (Self::Uint64(r), Self::Int64(l)) => {
                u64::try_from(*l).map(|l| l == *r).unwrap_or(false)
            }
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::String(l), Self::String(r)) => l == r,
            _ => false,
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<u64> for ScalarValue {
    fn from(value: u64) -> Self {
        ScalarValue::Uint64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(Arc::from(value))
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(Arc::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::ScalarValue;

    #[test]
    fn numeric_equality_ignores_representation() {
        assert_eq!(ScalarValue::Int64(7), ScalarValue::Uint64(7));
        assert_eq!(ScalarValue::Uint64(7), ScalarValue::Int64(7));
        assert_ne!(ScalarValue::Int64(-1), ScalarValue::Uint64(u64::MAX));
        assert_ne!(ScalarValue::Int64(7), ScalarValue::Float64(7.0));
    }

    #[test]
    fn renders_scalars_as_plain_text() {
        assert_eq!(ScalarValue::Null.render(), "null");
        assert_eq!(ScalarValue::Boolean(true).render(), "true");
        assert_eq!(ScalarValue::Int64(-3).render(), "-3");
        assert_eq!(ScalarValue::from("abc").render(), "abc");
    }
}
