//! The recursive value grammar shared by node, sub-resource and resource bodies.
//!
//! Parsing never fails: a right-hand side that matches no rule is kept as
//! [`Value::Opaque`] so it can be written back unchanged.

use crate::ast::{Color, Dictionary, Value, Vector2, Vector3};
use crate::lexer::{read_quoted, split_once_top_level, split_top_level};

/// Parses the right-hand side of a property assignment.
///
/// Rules, tried in order: `null`/`true`/`false`, quoted string, integer,
/// decimal, typed constructor (`Vector2`, `Vector3`, `Color`, `ExtResource`,
/// `SubResource`, `NodePath`), array, dictionary. Anything else is opaque.
pub fn parse_value(raw: &str) -> Value {
    let text = raw.trim();
    match text {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if text.starts_with('"') {
        return match read_quoted(text) {
            Some((content, end)) if end == text.len() => Value::String(content),
            _ => Value::Opaque(text.to_string()),
        };
    }

    if is_integer_literal(text) {
        // Out of range for i64: the engine reads it as a real.
        return match text.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => text
                .parse::<f64>()
                .map_or_else(|_| Value::Opaque(text.to_string()), Value::Float),
        };
    }

    if let Some(f) = parse_real(text) {
        return Value::Float(f);
    }

    if let Some(value) = parse_constructor(text) {
        return value;
    }

    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return Value::Array(parse_array_body(inner));
    }

    if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        return Value::Dictionary(parse_dictionary_body(inner));
    }

    Value::Opaque(text.to_string())
}

/// ArrayBody ::= [ Value { "," Value } [ "," ] ]
fn parse_array_body(inner: &str) -> Vec<Value> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(inner, ',')
        .into_iter()
        .map(parse_value)
        .collect()
}

/// DictionaryBody ::= [ Value ":" Value { "," Value ":" Value } ]
fn parse_dictionary_body(inner: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    for segment in split_top_level(inner, ',') {
        match split_once_top_level(segment, ':') {
            Some((key, value)) => {
                dict.insert(parse_value(key), parse_value(value));
            }
            None => log::debug!("dropping dictionary entry without ':': {segment}"),
        }
    }
    dict
}

/// Constructor ::= Name "(" Args ")"
fn parse_constructor(text: &str) -> Option<Value> {
    let open = text.find('(')?;
    let inner = text.strip_suffix(')')?.get(open + 1..)?;
    match &text[..open] {
        "Vector2" => match reals(inner)?.as_slice() {
            [x, y] => Some(Value::Vector2(Vector2::new(*x, *y))),
            _ => None,
        },
        "Vector3" => match reals(inner)?.as_slice() {
            [x, y, z] => Some(Value::Vector3(Vector3::new(*x, *y, *z))),
            _ => None,
        },
        "Color" => match reals(inner)?.as_slice() {
            [r, g, b] => Some(Value::Color(Color::rgb(*r, *g, *b))),
            [r, g, b, a] => Some(Value::Color(Color::rgba(*r, *g, *b, *a))),
            _ => None,
        },
        "ExtResource" => single_string_arg(inner).map(Value::ExtResource),
        "SubResource" => single_string_arg(inner).map(Value::SubResource),
        "NodePath" => single_string_arg(inner).map(Value::NodePath),
        _ => None,
    }
}

fn reals(inner: &str) -> Option<Vec<f64>> {
    split_top_level(inner, ',')
        .into_iter()
        .map(|part| {
            if is_integer_literal(part) {
                part.parse::<f64>().ok()
            } else {
                parse_real(part)
            }
        })
        .collect()
}

/// `"id"` in current files, a bare `1` in format 2 files.
fn single_string_arg(inner: &str) -> Option<String> {
    let inner = inner.trim();
    if inner.starts_with('"') {
        return match read_quoted(inner) {
            Some((content, end)) if end == inner.len() => Some(content),
            _ => None,
        };
    }
    if inner.is_empty() || inner.contains([',', '(', ')', '"']) {
        return None;
    }
    Some(inner.to_string())
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// A decimal or exponent literal, or one of the engine's non-finite spellings.
/// Plain integers are rejected so the caller can keep them integral.
pub(crate) fn parse_real(text: &str) -> Option<f64> {
    match text {
        "inf" => return Some(f64::INFINITY),
        "inf_neg" => return Some(f64::NEG_INFINITY),
        "nan" => return Some(f64::NAN),
        _ => {}
    }

    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (mantissa, None),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
        return None;
    }
    if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
        return None;
    }
    if frac_part.is_none() && exponent.is_none() {
        return None;
    }
    if let Some(exp) = exponent {
        let exp_digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
        if exp_digits.is_empty() || !all_digits(exp_digits) {
            return None;
        }
    }
    text.parse().ok()
}
