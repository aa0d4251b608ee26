//! Conversion between wire JSON values and the store's value model.
//!
//! The store keeps every number as an exact decimal. Going out, floats are
//! converted from their shortest round-trip text (so `0.1` stays `0.1`) and
//! floats with an integral value are stored as integers. Coming back,
//! decimals without a fractional part become JSON integers and the rest
//! become JSON floats.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A schema-less record: attribute name to value.
pub type Item = BTreeMap<String, AttrValue>;

/// A value as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(Decimal),
    String(String),
    List(Vec<AttrValue>),
    Map(Item),
}

impl AttrValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the decimal payload, if this is a number.
    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            AttrValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(Decimal::from(value))
    }
}

/// Errors raised while encoding wire values for the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Number out of range: {0}")]
    NumberOutOfRange(String),
    #[error("Expected a JSON object")]
    NotAnObject,
}

/// Encode a wire value for the store, recursively.
pub fn encode(value: &Value) -> Result<AttrValue, CodecError> {
    Ok(match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(*b),
        Value::Number(n) => AttrValue::Number(encode_number(n)?),
        Value::String(s) => AttrValue::String(s.clone()),
        Value::Array(values) => {
            AttrValue::List(values.iter().map(encode).collect::<Result<_, _>>()?)
        }
        Value::Object(map) => AttrValue::Map(encode_map(map)?),
    })
}

/// Encode a JSON object into a store item.
pub fn encode_item(value: &Value) -> Result<Item, CodecError> {
    match value {
        Value::Object(map) => encode_map(map),
        _ => Err(CodecError::NotAnObject),
    }
}

fn encode_map(map: &Map<String, Value>) -> Result<Item, CodecError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), encode(v)?)))
        .collect()
}

fn encode_number(n: &Number) -> Result<Decimal, CodecError> {
    if let Some(i) = n.as_i64() {
        return Ok(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Decimal::from(u));
    }

    let out_of_range = || CodecError::NumberOutOfRange(n.to_string());
    let f = n.as_f64().ok_or_else(out_of_range)?;

    if f.fract() == 0.0 {
        // `as` saturates; anything past Decimal::MAX is rejected below.
        return Decimal::try_from_i128_with_scale(f as i128, 0).map_err(|_| out_of_range());
    }

    Decimal::from_str(&f.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{f:e}")))
        .map_err(|_| out_of_range())
}

/// Decode a store value back to its wire form, recursively.
pub fn decode(value: &AttrValue) -> Value {
    match value {
        AttrValue::Null => Value::Null,
        AttrValue::Bool(b) => Value::Bool(*b),
        AttrValue::Number(d) => decode_number(d),
        AttrValue::String(s) => Value::String(s.clone()),
        AttrValue::List(values) => Value::Array(values.iter().map(decode).collect()),
        AttrValue::Map(item) => decode_item(item),
    }
}

/// Decode a whole store item into a JSON object.
pub fn decode_item(item: &Item) -> Value {
    Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), decode(v)))
            .collect(),
    )
}

fn decode_number(d: &Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
        if let Some(u) = d.to_u64() {
            return Value::from(u);
        }
    }

    d.to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
