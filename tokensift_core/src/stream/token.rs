use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::value::ScalarValue;

/// One self-contained event of a structured token stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName(Arc<str>),
    Scalar(ScalarValue),
}

/// The shape of a [`Token`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    Scalar,
}

impl Token {
    pub fn name(name: &str) -> Self {
        Token::PropertyName(Arc::from(name))
    }

    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        Token::Scalar(value.into())
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::PropertyName(_) => TokenKind::PropertyName,
            Token::Scalar(_) => TokenKind::Scalar,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Token::Scalar(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Token::Scalar(ScalarValue::Null))
    }

    pub fn is_struct_start(&self) -> bool {
        matches!(self, Token::StartObject | Token::StartArray)
    }

    pub fn is_struct_end(&self) -> bool {
        matches!(self, Token::EndObject | Token::EndArray)
    }

    /// Textual payload of the token: the property name or the rendered
    /// scalar. Structural markers have none.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Token::PropertyName(name) => Some(Cow::Borrowed(name.as_ref())),
            Token::Scalar(value) => Some(value.render()),
            _ => None,
        }
    }
}

impl From<ScalarValue> for Token {
    fn from(value: ScalarValue) -> Self {
        Token::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, TokenKind};

    #[test]
    fn structural_queries() {
        assert!(Token::StartArray.is_struct_start());
        assert!(Token::EndObject.is_struct_end());
        assert!(Token::scalar(1i64).is_scalar());
        assert!(!Token::name("a").is_scalar());
        assert_eq!(Token::name("a").kind(), TokenKind::PropertyName);
    }

    #[test]
    fn text_payloads() {
        assert_eq!(Token::name("key").text().as_deref(), Some("key"));
        assert_eq!(Token::scalar(5i64).text().as_deref(), Some("5"));
        assert_eq!(Token::StartObject.text(), None);
    }
}
