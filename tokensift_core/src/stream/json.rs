//! Bridging between JSON documents and token sequences.

use std::sync::Arc;

use serde_json::{Map, Number, Value};

use super::token::Token;
use super::value::ScalarValue;

/// Flatten a JSON value into its token sequence, in document order.
pub fn tokens_from_value(value: &Value) -> Vec<Token> {
    let mut out = Vec::new();
    push_value(value, &mut out);
    out
}

/// Parse a JSON document and flatten it into its token sequence.
pub fn tokens_from_str(input: &str) -> Result<Vec<Token>, serde_json::Error> {
    Ok(tokens_from_value(&serde_json::from_str(input)?))
}

fn push_value(value: &Value, out: &mut Vec<Token>) {
    match value {
        Value::Null => out.push(Token::Scalar(ScalarValue::Null)),
        Value::Bool(b) => out.push(Token::Scalar(ScalarValue::Boolean(*b))),
        Value::Number(number) => out.push(Token::Scalar(number_to_scalar(number))),
        Value::String(s) => out.push(Token::Scalar(ScalarValue::String(Arc::from(s.as_str())))),
        Value::Array(items) => {
            out.push(Token::StartArray);
            for item in items {
                push_value(item, out);
            }
            out.push(Token::EndArray);
        }
        Value::Object(members) => {
            out.push(Token::StartObject);
            for (name, member) in members {
                out.push(Token::PropertyName(Arc::from(name.as_str())));
                push_value(member, out);
            }
            out.push(Token::EndObject);
        }
    }
}

fn number_to_scalar(number: &Number) -> ScalarValue {
    if let Some(i) = number.as_i64() {
        ScalarValue::Int64(i)
    } else if let Some(u) = number.as_u64() {
        ScalarValue::Uint64(u)
    } else {
        ScalarValue::Float64(number.as_f64().unwrap_or(f64::NAN))
    }
}

/// Reassemble complete JSON values from a token sequence.
///
/// The sequence may hold any number of root values. Returns `None` if the
/// sequence is not prefix-balanced (a name without a value, an unmatched
/// start or end marker) or a float has no JSON representation.
pub fn values_from_tokens(tokens: &[Token]) -> Option<Vec<Value>> {
    enum Frame {
        Array(Vec<Value>),
        Object(Map<String, Value>, Option<String>),
    }

    fn place(stack: &mut [Frame], roots: &mut Vec<Value>, value: Value) -> Option<()> {
        match stack.last_mut() {
            None => roots.push(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object(members, name)) => {
                members.insert(name.take()?, value);
            }
        }
        Some(())
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    for token in tokens {
        match token {
            Token::StartObject => stack.push(Frame::Object(Map::new(), None)),
            Token::StartArray => stack.push(Frame::Array(Vec::new())),
            Token::EndObject => match stack.pop()? {
                Frame::Object(members, None) => {
                    place(&mut stack, &mut roots, Value::Object(members))?;
                }
                _ => return None,
            },
            Token::EndArray => match stack.pop()? {
                Frame::Array(items) => place(&mut stack, &mut roots, Value::Array(items))?,
                Frame::Object(..) => return None,
            },
            Token::PropertyName(name) => match stack.last_mut() {
                Some(Frame::Object(_, pending @ None)) => *pending = Some(name.to_string()),
                _ => return None,
            },
            Token::Scalar(scalar) => {
                place(&mut stack, &mut roots, scalar_to_json(scalar)?)?;
            }
        }
    }
    if stack.is_empty() {
        Some(roots)
    } else {
        None
    }
}

fn scalar_to_json(scalar: &ScalarValue) -> Option<Value> {
    Some(match scalar {
        ScalarValue::Null => Value::Null,
        ScalarValue::Boolean(b) => Value::Bool(*b),
        ScalarValue::Int64(i) => Value::Number((*i).into()),
        ScalarValue::Uint64(u) => Value::Number((*u).into()),
        ScalarValue::Float64(f) => Value::Number(Number::from_f64(*f)?),
        ScalarValue::String(s) => Value::String(s.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use similar_asserts::assert_eq;

    use super::{tokens_from_str, values_from_tokens};
    use crate::stream::Token;

    #[test]
    fn flattens_in_document_order() {
        let tokens = tokens_from_str(r#"{"b":[1,null],"a":true}"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StartObject,
                Token::name("b"),
                Token::StartArray,
                Token::scalar(1i64),
                Token::Scalar(crate::stream::ScalarValue::Null),
                Token::EndArray,
                Token::name("a"),
                Token::scalar(true),
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn reassembles_multiple_roots() {
        let mut tokens = tokens_from_str(r#"{"a":{"b":2}}"#).unwrap();
        tokens.push(Token::scalar(7i64));
        let values = values_from_tokens(&tokens).unwrap();
        assert_eq!(values, vec![json!({"a": {"b": 2}}), json!(7)]);
    }

    #[test]
    fn rejects_unbalanced_sequences() {
        assert_eq!(values_from_tokens(&[Token::StartObject]), None);
        assert_eq!(values_from_tokens(&[Token::EndArray]), None);
        assert_eq!(
            values_from_tokens(&[Token::StartObject, Token::name("a"), Token::EndObject]),
            None
        );
        assert_eq!(values_from_tokens(&[Token::name("a")]), None);
    }
}
