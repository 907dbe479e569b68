//! String-to-value coercion.
//!
//! Every supported destination is described by a [`Kind`]. [`coerce`] matches
//! on it exhaustively, so adding a kind forces every coercion path to handle
//! it. Typed fields are produced from the resulting [`Value`] by
//! [`ConfigValue`](crate::record::ConfigValue).

use std::fmt;

use thiserror::Error;

/// Destination shapes understood by the coercion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Text,
    Bool,
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    /// Comma separated list of the element kind.
    Sequence(Box<Kind>),
    /// JSON object; the boxed kind is the key kind. Values stay JSON.
    Mapping(Box<Kind>),
}

impl Kind {
    fn is_scalar(&self) -> bool {
        !matches!(self, Kind::Sequence(_) | Kind::Mapping(_))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Text => f.write_str("string"),
            Kind::Bool => f.write_str("bool"),
            Kind::Int { bits } => write!(f, "i{bits}"),
            Kind::Uint { bits } => write!(f, "u{bits}"),
            Kind::Float { bits } => write!(f, "f{bits}"),
            Kind::Sequence(elem) => write!(f, "list of {elem}"),
            Kind::Mapping(key) => write!(f, "map with {key} keys"),
        }
    }
}

/// A coerced value, ready to be stored into a typed field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// 32-bit floats are parsed at 32-bit precision and widened losslessly.
    Float(f64),
    Sequence(Vec<Value>),
    Mapping(Vec<(Value, serde_json::Value)>),
}

impl Value {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::Uint(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Sequence(_) => "list",
            Value::Mapping(_) => "map",
        }
    }
}

#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("unable to parse {kind} from {value:?}: {reason}")]
    Parse {
        kind: Kind,
        value: String,
        reason: String,
    },
    #[error("invalid list element at index {index}: {source}")]
    InvalidElement {
        index: usize,
        #[source]
        source: Box<CoercionError>,
    },
    #[error("unable to unmarshal JSON map: {0}")]
    MalformedMapping(#[source] serde_json::Error),
    #[error("unable to convert map key {key:?}: {source}")]
    MapKey {
        key: String,
        #[source]
        source: Box<CoercionError>,
    },
    #[error("unable to unmarshal map value for key {key:?}: {source}")]
    MapValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported type: {0}")]
    Unsupported(String),
    #[error("expected a {expected} value but got a {found}")]
    Mismatch {
        expected: Kind,
        found: &'static str,
    },
}

fn parse_error(kind: &Kind, value: &str, reason: impl fmt::Display) -> CoercionError {
    CoercionError::Parse {
        kind: kind.clone(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Coerces `raw` into a value of the given kind.
pub fn coerce(kind: &Kind, raw: &str) -> Result<Value, CoercionError> {
    match kind {
        Kind::Text => Ok(Value::Text(raw.to_string())),
        Kind::Bool => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| parse_error(kind, raw, "invalid boolean literal")),
        Kind::Int { bits } => parse_int(raw, *bits)
            .map(Value::Int)
            .map_err(|reason| parse_error(kind, raw, reason)),
        Kind::Uint { bits } => parse_uint(raw, *bits)
            .map(Value::Uint)
            .map_err(|reason| parse_error(kind, raw, reason)),
        Kind::Float { bits } => parse_float(raw, *bits)
            .map(Value::Float)
            .map_err(|reason| parse_error(kind, raw, reason)),
        Kind::Sequence(elem) => coerce_sequence(elem, raw),
        Kind::Mapping(key) => coerce_mapping(key, raw),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_int(raw: &str, bits: u32) -> Result<i64, String> {
    let parsed: i64 = raw.parse().map_err(|e| format!("{e}"))?;
    if bits < 64 {
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        if parsed < min || parsed > max {
            return Err(format!("value out of range for {bits}-bit integer"));
        }
    }
    Ok(parsed)
}

fn parse_uint(raw: &str, bits: u32) -> Result<u64, String> {
    let parsed: u64 = raw.parse().map_err(|e| format!("{e}"))?;
    if bits < 64 && parsed > (1u64 << bits) - 1 {
        return Err(format!("value out of range for {bits}-bit unsigned integer"));
    }
    Ok(parsed)
}

fn parse_float(raw: &str, bits: u32) -> Result<f64, String> {
    let parsed = if bits == 32 {
        raw.parse::<f32>().map(f64::from).map_err(|e| format!("{e}"))?
    } else {
        raw.parse::<f64>().map_err(|e| format!("{e}"))?
    };

    // Overflowing literals parse to infinity instead of failing.
    if parsed.is_infinite() && !is_infinity_literal(raw) {
        return Err(format!("value out of range for {bits}-bit float"));
    }
    Ok(parsed)
}

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw
        .strip_prefix('+')
        .or_else(|| raw.strip_prefix('-'))
        .unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn coerce_sequence(elem: &Kind, raw: &str) -> Result<Value, CoercionError> {
    if raw.trim().is_empty() {
        return Ok(Value::Sequence(Vec::new()));
    }

    raw.split(',')
        .enumerate()
        .map(|(index, item)| {
            coerce(elem, item.trim()).map_err(|source| CoercionError::InvalidElement {
                index,
                source: Box::new(source),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Sequence)
}

fn coerce_mapping(key_kind: &Kind, raw: &str) -> Result<Value, CoercionError> {
    if !key_kind.is_scalar() {
        return Err(CoercionError::Unsupported(format!("map key of type {key_kind}")));
    }

    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(CoercionError::MalformedMapping)?;

    object
        .into_iter()
        .map(|(key, value)| -> Result<_, CoercionError> {
            let coerced = coerce(key_kind, &key).map_err(|source| CoercionError::MapKey {
                key: key.clone(),
                source: Box::new(source),
            })?;
            Ok((coerced, value))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Mapping)
}
