use std::borrow::Cow;

use super::error::TokenStreamError;
use super::token::Token;
use super::value::ScalarValue;

/// An opaque forward cursor over a token stream.
///
/// This is the upstream seam of the filtering cursor. Implementations must
/// satisfy two properties:
/// - `next_token` advances by exactly one token and returns `None` only at
///   the end of the stream; every later call also returns `None`.
/// - `current_token` reports the token the last `next_token` call produced,
///   without advancing.
pub trait TokenSource {
    /// Advance to the next token, or `None` at the end of the stream.
    fn next_token(&mut self) -> Result<Option<Token>, TokenStreamError>;

    /// The token this source is currently positioned at.
    fn current_token(&self) -> Option<&Token>;

    /// If positioned at a start marker, consume tokens through the matching
    /// end marker. A no-op at any other position.
    fn skip_children(&mut self) -> Result<(), TokenStreamError>;

    /// Textual form of the current token's payload, if it has one.
    fn text(&self) -> Option<Cow<'_, str>> {
        self.current_token().and_then(Token::text)
    }

    fn text_len(&self) -> Option<usize> {
        self.text().map(|text| text.len())
    }

    /// Whether `text` is backed by characters the source already holds,
    /// rather than synthesized on demand.
    fn has_text_characters(&self) -> bool {
        false
    }

    /// String rendition of the current token if it is a name or a non-null
    /// scalar.
    fn value_as_string(&self) -> Option<String> {
        match self.current_token() {
            Some(Token::Scalar(ScalarValue::Null)) | None => None,
            Some(token) => token.text().map(Cow::into_owned),
        }
    }
}

/// An in-memory [`TokenSource`] backed by a vector of tokens.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    pos: usize,
    current: Option<Token>,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, current: None }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

impl From<Vec<Token>> for TokenBuffer {
    fn from(tokens: Vec<Token>) -> Self {
        TokenBuffer::new(tokens)
    }
}

impl TokenSource for TokenBuffer {
    fn next_token(&mut self) -> Result<Option<Token>, TokenStreamError> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        self.current = token.clone();
        Ok(token)
    }

    fn current_token(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    fn skip_children(&mut self) -> Result<(), TokenStreamError> {
        if !self.current.as_ref().is_some_and(Token::is_struct_start) {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                None => break,
                Some(token) if token.is_struct_start() => depth += 1,
                Some(token) if token.is_struct_end() => depth -= 1,
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn has_text_characters(&self) -> bool {
        matches!(self.current, Some(Token::Scalar(ScalarValue::String(_))))
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenBuffer, TokenSource};
    use crate::stream::json::tokens_from_str;
    use crate::stream::Token;

    #[test]
    fn advances_and_tracks_current() {
        let mut buffer = TokenBuffer::new(tokens_from_str(r#"{"a":1}"#).unwrap());
        assert_eq!(buffer.current_token(), None);
        assert_eq!(buffer.next_token().unwrap(), Some(Token::StartObject));
        assert_eq!(buffer.current_token(), Some(&Token::StartObject));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::name("a")));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::scalar(1i64)));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::EndObject));
        assert_eq!(buffer.next_token().unwrap(), None);
        assert_eq!(buffer.current_token(), None);
        assert!(buffer.is_exhausted());
    }

    #[test]
    fn skips_children_of_the_current_container() {
        let mut buffer =
            TokenBuffer::new(tokens_from_str(r#"{"a":[1,[2,3],{"b":4}],"c":5}"#).unwrap());
        buffer.next_token().unwrap(); // {
        buffer.next_token().unwrap(); // "a"
        buffer.next_token().unwrap(); // [
        buffer.skip_children().unwrap();
        assert_eq!(buffer.current_token(), Some(&Token::EndArray));
        assert_eq!(buffer.next_token().unwrap(), Some(Token::name("c")));
    }

    #[test]
    fn skip_children_elsewhere_is_a_no_op() {
        let mut buffer = TokenBuffer::new(tokens_from_str(r#"{"a":1}"#).unwrap());
        buffer.next_token().unwrap();
        buffer.next_token().unwrap(); // "a"
        buffer.skip_children().unwrap();
        assert_eq!(buffer.current_token(), Some(&Token::name("a")));
    }

    #[test]
    fn textual_accessors_follow_the_current_token() {
        let mut buffer = TokenBuffer::new(tokens_from_str(r#"{"a":"xyz"}"#).unwrap());
        buffer.next_token().unwrap();
        assert_eq!(buffer.text(), None);
        buffer.next_token().unwrap(); // "a"
        assert_eq!(buffer.text().as_deref(), Some("a"));
        assert!(!buffer.has_text_characters());
        buffer.next_token().unwrap(); // "xyz"
        assert_eq!(buffer.text().as_deref(), Some("xyz"));
        assert_eq!(buffer.text_len(), Some(3));
        assert!(buffer.has_text_characters());
        assert_eq!(buffer.value_as_string().as_deref(), Some("xyz"));
    }
}
