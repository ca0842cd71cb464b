//! Encodes metadata payloads in PHP `serialize()` format, the representation
//! the CMS reads back from its post-metadata table.

use std::fmt::Write;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value could not be serialized to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("intermediate JSON text is malformed: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// Serializes `value` for a metadata row.
///
/// Returns an empty payload (and logs) if the value cannot be encoded.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> String {
    match try_encode(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Could not encode metadata payload");
            String::new()
        }
    }
}

pub fn try_encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_string(value).map_err(CodecError::Serialize)?;
    encode_json_text(&json)
}

/// Re-encodes JSON text, keeping object key order.
pub fn encode_json_text(json: &str) -> Result<String, CodecError> {
    let value: Value = serde_json::from_str(json).map_err(CodecError::MalformedJson)?;
    let mut out = String::new();
    write_value(&mut out, &value);
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(flag) => {
            let _ = write!(out, "b:{};", u8::from(*flag));
        }
        Value::Number(number) => write_number(out, number),
        Value::String(text) => write_string(out, text),
        Value::Array(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for (index, item) in items.iter().enumerate() {
                let _ = write!(out, "i:{index};");
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Object(entries) => write_object(out, entries),
    }
}

fn write_object(out: &mut String, entries: &Map<String, Value>) {
    let _ = write!(out, "a:{}:{{", entries.len());
    for (key, item) in entries {
        match integer_key(key) {
            Some(index) => {
                let _ = write!(out, "i:{index};");
            }
            None => write_string(out, key),
        }
        write_value(out, item);
    }
    out.push('}');
}

fn write_number(out: &mut String, number: &Number) {
    if let Some(int) = number.as_i64() {
        let _ = write!(out, "i:{int};");
    } else if let Some(uint) = number.as_u64() {
        let _ = write!(out, "i:{uint};");
    } else if let Some(float) = number.as_f64() {
        out.push_str("d:");
        write_float(out, float);
        out.push(';');
    }
}

/// Shortest round-trip digits; exponent form outside 1e-4..1e15, as PHP does.
fn write_float(out: &mut String, float: f64) {
    let scientific = format!("{float:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        out.push_str(&scientific);
        return;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();

    if float == 0.0 || (-4..15).contains(&exponent) {
        let _ = write!(out, "{float}");
        return;
    }

    out.push_str(mantissa);
    if !mantissa.contains('.') {
        out.push_str(".0");
    }
    let _ = write!(out, "E{}{}", if exponent < 0 { '-' } else { '+' }, exponent.abs());
}

fn write_string(out: &mut String, text: &str) {
    // Length is in bytes, not characters.
    let _ = write!(out, "s:{}:\"{}\";", text.len(), text);
}

/// PHP turns decimal-integer string keys into integer keys.
fn integer_key(key: &str) -> Option<i64> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    let canonical = match digits.as_bytes() {
        [b'0'] => !key.starts_with('-'),
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}
