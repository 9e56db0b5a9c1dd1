//! String → typed value conversion.
//!
//! Every decodable field has a [`Kind`]; [`coerce`] is the single dispatch
//! point that turns one cell's text into a [`Value`] of that kind.

pub mod date_parser;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::CoerceCause;
use date_parser::DateParseError;

/// The one day-first layout retried when the permissive parser cannot
/// decide between day-first and month-first.
pub const FALLBACK_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    W32,
    W64,
}

/// Semantic type of a decodable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    Bool,
    /// Calendar time, normalized to UTC.
    Time,
    /// Absent until a non-empty cell fills it.
    Optional(Box<Kind>),
}

impl Kind {
    pub fn optional(inner: Kind) -> Self {
        Kind::Optional(Box::new(inner))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = |w: &IntWidth| match w {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        };
        match self {
            Kind::String => f.write_str("string"),
            Kind::Int(w) => write!(f, "i{}", bits(w)),
            Kind::Uint(w) => write!(f, "u{}", bits(w)),
            Kind::Float(FloatWidth::W32) => f.write_str("f32"),
            Kind::Float(FloatWidth::W64) => f.write_str("f64"),
            Kind::Bool => f.write_str("bool"),
            Kind::Time => f.write_str("time"),
            Kind::Optional(inner) => write!(f, "option<{}>", inner),
        }
    }
}

impl FromStr for Kind {
    type Err = String;

    /// Parses the names produced by `Display`, plus `datetime` for `time`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase();
        if let Some(inner) = norm
            .strip_prefix("option<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(Kind::optional(inner.parse()?));
        }
        Ok(match norm.as_str() {
            "string" | "str" => Kind::String,
            "i8" => Kind::Int(IntWidth::W8),
            "i16" => Kind::Int(IntWidth::W16),
            "i32" => Kind::Int(IntWidth::W32),
            "i64" => Kind::Int(IntWidth::W64),
            "u8" => Kind::Uint(IntWidth::W8),
            "u16" => Kind::Uint(IntWidth::W16),
            "u32" => Kind::Uint(IntWidth::W32),
            "u64" => Kind::Uint(IntWidth::W64),
            "f32" => Kind::Float(FloatWidth::W32),
            "f64" => Kind::Float(FloatWidth::W64),
            "bool" => Kind::Bool,
            "time" | "datetime" => Kind::Time,
            _ => return Err(s.to_string()),
        })
    }
}

/// A coerced cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Unset optional.
    Null,
    Str(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl Value {
    /// The value a freshly allocated field of `kind` holds.
    pub fn zero(kind: &Kind) -> Self {
        match kind {
            Kind::String => Value::Str(String::new()),
            Kind::Int(IntWidth::W8) => Value::I8(0),
            Kind::Int(IntWidth::W16) => Value::I16(0),
            Kind::Int(IntWidth::W32) => Value::I32(0),
            Kind::Int(IntWidth::W64) => Value::I64(0),
            Kind::Uint(IntWidth::W8) => Value::U8(0),
            Kind::Uint(IntWidth::W16) => Value::U16(0),
            Kind::Uint(IntWidth::W32) => Value::U32(0),
            Kind::Uint(IntWidth::W64) => Value::U64(0),
            Kind::Float(FloatWidth::W32) => Value::F32(0.0),
            Kind::Float(FloatWidth::W64) => Value::F64(0.0),
            Kind::Bool => Value::Bool(false),
            Kind::Time => Value::Time(DateTime::<Utc>::default()),
            Kind::Optional(_) => Value::Null,
        }
    }
}

/// Convert one cell to `kind`.
///
/// Returns `Ok(None)` for an empty cell: the field keeps whatever it holds.
/// Optional kinds coerce as their inner kind; wrapping is the slot's job.
pub fn coerce(raw: &str, kind: &Kind) -> Result<Option<Value>, CoerceCause> {
    if raw.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        Kind::String => Value::Str(raw.to_owned()),
        Kind::Int(IntWidth::W8) => Value::I8(raw.parse()?),
        Kind::Int(IntWidth::W16) => Value::I16(raw.parse()?),
        Kind::Int(IntWidth::W32) => Value::I32(raw.parse()?),
        Kind::Int(IntWidth::W64) => Value::I64(raw.parse()?),
        Kind::Uint(IntWidth::W8) => Value::U8(raw.parse()?),
        Kind::Uint(IntWidth::W16) => Value::U16(raw.parse()?),
        Kind::Uint(IntWidth::W32) => Value::U32(raw.parse()?),
        Kind::Uint(IntWidth::W64) => Value::U64(raw.parse()?),
        Kind::Float(FloatWidth::W32) => Value::F32(raw.parse()?),
        Kind::Float(FloatWidth::W64) => Value::F64(raw.parse()?),
        Kind::Bool => Value::Bool(parse_bool(raw)?),
        Kind::Time => Value::Time(parse_time(raw)?),
        Kind::Optional(inner) => return coerce(raw, inner),
    };
    Ok(Some(value))
}

fn parse_bool(raw: &str) -> Result<bool, CoerceCause> {
    const TRUE: &[&str] = &["true", "t", "1"];
    const FALSE: &[&str] = &["false", "f", "0"];

    if TRUE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(true)
    } else if FALSE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(false)
    } else {
        Err(CoerceCause::Bool(raw.to_owned()))
    }
}

/// Strict permissive parse first; only an ambiguous day/month order earns
/// a retry with [`FALLBACK_TIME_FORMAT`].
fn parse_time(raw: &str) -> Result<DateTime<Utc>, CoerceCause> {
    match date_parser::parse_strict(raw) {
        Ok(t) => Ok(t),
        Err(DateParseError::AmbiguousDayMonth) => {
            NaiveDateTime::parse_from_str(raw, FALLBACK_TIME_FORMAT)
                .map(|naive| naive.and_utc())
                .map_err(|_| CoerceCause::Time(raw.to_owned()))
        }
        Err(_) => Err(CoerceCause::Time(raw.to_owned())),
    }
}
