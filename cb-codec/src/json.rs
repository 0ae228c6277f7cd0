//! Encoding JSON values

use crate::writer::CbWriter;
use cb_format::{CbError, CbField, Limits, Result};
use serde_json::Value;

enum Step<'a> {
    Value(Option<&'a str>, &'a Value),
    EndObject,
    EndArray,
}

/// Write a JSON value as the next field.
///
/// Integers that fit `u64` or `i64` become integer fields, other numbers
/// doubles. Object keys keep their map order. Containers nested deeper than
/// `limits.max_depth` are rejected.
pub fn write_json(writer: &mut CbWriter, value: &Value, limits: &Limits) -> Result<()> {
    let mut depth = 0usize;
    let mut stack = vec![Step::Value(None, value)];
    while let Some(step) = stack.pop() {
        let (name, value) = match step {
            Step::EndObject => {
                depth -= 1;
                writer.end_object()?;
                continue;
            }
            Step::EndArray => {
                depth -= 1;
                writer.end_array()?;
                continue;
            }
            Step::Value(name, value) => (name, value),
        };
        if let Some(name) = name {
            writer.name(name);
        }
        match value {
            Value::Null => writer.write_null()?,
            Value::Bool(b) => writer.write_bool(*b)?,
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    writer.write_u64(u)?
                } else if let Some(i) = n.as_i64() {
                    writer.write_i64(i)?
                } else {
                    let f = n.as_f64().ok_or_else(|| {
                        CbError::Internal(format!("number {} has no f64 form", n))
                    })?;
                    writer.write_f64(f)?
                }
            }
            Value::String(s) => writer.write_str(s)?,
            Value::Array(items) => {
                depth = enter(depth, limits)?;
                writer.begin_array()?;
                stack.push(Step::EndArray);
                stack.extend(items.iter().rev().map(|item| Step::Value(None, item)));
            }
            Value::Object(map) => {
                depth = enter(depth, limits)?;
                writer.begin_object()?;
                stack.push(Step::EndObject);
                stack.extend(
                    map.iter()
                        .rev()
                        .map(|(key, item)| Step::Value(Some(key.as_str()), item)),
                );
            }
        }
    }
    Ok(())
}

fn enter(depth: usize, limits: &Limits) -> Result<usize> {
    if depth >= limits.max_depth {
        return Err(CbError::LimitExceeded(format!(
            "JSON nesting depth exceeds {}",
            limits.max_depth
        )));
    }
    Ok(depth + 1)
}

/// Encode a JSON value as a standalone field.
pub fn from_json(value: &Value) -> Result<CbField> {
    let mut writer = CbWriter::new();
    write_json(&mut writer, value, &Limits::default())?;
    writer.save_field()
}

/// Parse JSON text and encode it as a standalone field.
pub fn from_json_str(text: &str) -> Result<CbField> {
    let value: Value = serde_json::from_str(text)?;
    from_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_format::CbFieldType;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip() {
        let value = json!({
            "name": "widget",
            "count": 3,
            "delta": -7,
            "ratio": 0.5,
            "ok": true,
            "none": null,
            "tags": ["a", "b"],
            "nested": {"inner": [1, [2, {}]]}
        });
        let field = from_json(&value).unwrap();
        assert_eq!(field.field_type(), CbFieldType::Object);
        assert_eq!(field.to_json().unwrap(), value);
    }

    #[test]
    fn test_number_mapping() {
        let field = from_json_str("[18446744073709551615, -1, 1.5]").unwrap();
        let items: Vec<_> = field.iter().collect();
        assert_eq!(items[0].field_type(), CbFieldType::IntegerPositive);
        assert_eq!(items[0].as_u64(), u64::MAX);
        assert_eq!(items[1].field_type(), CbFieldType::IntegerNegative);
        assert_eq!(items[2].field_type(), CbFieldType::Float64);
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let mut writer = CbWriter::new();
        assert!(matches!(
            write_json(&mut writer, &json!([[[]]]), &limits),
            Err(CbError::LimitExceeded(_))
        ));
        let mut writer = CbWriter::new();
        write_json(&mut writer, &json!([[]]), &limits).unwrap();
        assert!(writer.is_complete());
    }

    #[test]
    fn test_invalid_text() {
        assert!(matches!(from_json_str("{"), Err(CbError::Json(_))));
    }
}
