//! typed comparison helpers for condition operands
//!
//! supports:
//! - numbers: decimal text, including scientific notation ("1e3")
//! - booleans: "true"/"false", plus "yes"/"no", "1"/"0", "on"/"off"
//! - dates: "2024-03-01", "01/03/2024" (day first), RFC 3339,
//!   "2024-03-01T09:30:00"

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::eval::EvalError;
use super::types::{parse_decimal, DataType, Value};

const TRUTHY: &[&str] = &["true", "yes", "1", "on"];
const FALSY: &[&str] = &["false", "no", "0", "off"];

/// strict boolean parse: "true" or "false", any case
pub fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// check if value is truthy; unparsable text counts as false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => {
            let text = other.as_text();
            parse_bool(&text).unwrap_or_else(|| {
                let lower = text.trim().to_lowercase();
                TRUTHY.contains(&lower.as_str())
            })
        }
    }
}

pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        other => {
            let lower = other.as_text().trim().to_lowercase();
            if TRUTHY.contains(&lower.as_str()) {
                Some(true)
            } else if FALSY.contains(&lower.as_str()) {
                Some(false)
            } else {
                None
            }
        }
    }
}

pub fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(d) => Some(*d),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// parse a calendar date, dropping any time component
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

fn invalid(value: &Value, data_type: DataType) -> EvalError {
    EvalError::InvalidOperand {
        value: value.to_string(),
        data_type: data_type.as_str(),
    }
}

/// equality under the given data type; strings compare case-insensitively
pub fn values_equal(actual: &Value, expected: &Value, data_type: DataType) -> Result<bool, EvalError> {
    match data_type {
        DataType::String => Ok(actual.as_text().to_lowercase() == expected.as_text().to_lowercase()),
        DataType::Number => {
            let a = to_decimal(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_decimal(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a == b)
        }
        DataType::Boolean => {
            let a = to_bool(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_bool(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a == b)
        }
        DataType::Date => {
            let a = to_date(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_date(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a == b)
        }
    }
}

/// ordering under the given data type
///
/// for strings, numeric ordering applies when both sides parse as numbers,
/// otherwise case-insensitive lexical ordering
pub fn compare_values(
    actual: &Value,
    expected: &Value,
    data_type: DataType,
) -> Result<Ordering, EvalError> {
    match data_type {
        DataType::String => {
            if let (Some(a), Some(b)) = (to_decimal(actual), to_decimal(expected)) {
                return Ok(a.cmp(&b));
            }
            Ok(actual
                .as_text()
                .to_lowercase()
                .cmp(&expected.as_text().to_lowercase()))
        }
        DataType::Number => {
            let a = to_decimal(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_decimal(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a.cmp(&b))
        }
        DataType::Boolean => {
            let a = to_bool(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_bool(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a.cmp(&b))
        }
        DataType::Date => {
            let a = to_date(actual).ok_or_else(|| invalid(actual, data_type))?;
            let b = to_date(expected).ok_or_else(|| invalid(expected, data_type))?;
            Ok(a.cmp(&b))
        }
    }
}
