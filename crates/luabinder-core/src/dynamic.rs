//! Dynamic kind of a stack value.

use std::fmt;

use mlua::Value;

use crate::Object;

/// The kind of a value, with its content for the kinds hosts usually branch on.
///
/// Handlers that accept more than one type read an argument as `Dynamic` and
/// match on it instead of committing to a single accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Nil, or no value at all
    Nil,
    /// Boolean value
    Bool(bool),
    /// Number value (integers are widened)
    Number(f64),
    /// String value (lossily decoded)
    String(String),
    /// Tagged host object, with its tag
    Object(String),
    /// Anything else: tables, functions, threads, foreign userdata
    Other(&'static str),
}

impl Dynamic {
    /// Read the dynamic kind of an engine value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Nil => Dynamic::Nil,
            Value::Boolean(b) => Dynamic::Bool(*b),
            Value::Integer(i) => Dynamic::Number(*i as f64),
            Value::Number(n) => Dynamic::Number(*n),
            Value::String(s) => Dynamic::String(s.to_string_lossy().into()),
            Value::UserData(ud) => match ud.borrow::<Object>() {
                Ok(object) => Dynamic::Object(object.tag().to_owned()),
                Err(_) => Dynamic::Other("userdata"),
            },
            other => Dynamic::Other(other.type_name()),
        }
    }

    /// Get a human-readable name for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Nil => "nil",
            Dynamic::Bool(_) => "boolean",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::Object(_) => "object",
            Dynamic::Other(kind) => *kind,
        }
    }

    /// Check if this is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Dynamic::Nil)
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Nil => write!(f, "nil"),
            Dynamic::Bool(b) => write!(f, "{b}"),
            Dynamic::Number(n) => write!(f, "{}", format_number(*n)),
            Dynamic::String(s) => write!(f, "{s}"),
            Dynamic::Object(tag) => write!(f, "{tag}"),
            Dynamic::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// Significant digits the VM keeps when printing a float.
const FLOAT_DIGITS: i32 = 14;

/// Format a float the way the VM prints one (`%.14g`, then `.0` when the
/// result would read as an integer).
pub(crate) fn format_number(n: f64) -> String {
    let sign = if n.is_sign_negative() { "-" } else { "" };
    let mut text = if n.is_nan() {
        format!("{sign}nan")
    } else if n.is_infinite() {
        format!("{sign}inf")
    } else if n == 0.0 {
        format!("{sign}0")
    } else {
        general(n)
    };
    if text.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        text.push_str(".0");
    }
    text
}

/// `%.14g` for a finite, non-zero float.
fn general(n: f64) -> String {
    // Scientific form fixes the decimal exponent after rounding.
    let scientific = format!("{:.*e}", (FLOAT_DIGITS - 1) as usize, n);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= FLOAT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (FLOAT_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{n:.decimals$}")).to_owned()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
