use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::{DynamicOps, ElementSupport, Error, ExtendedDynamicOps, Number, Result};

/// [`DynamicOps`] for [`serde_json::Value`].
///
/// JSON has native null but only string object keys. Floats that JSON can not
/// represent (NaN, infinities) are written as `null`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonOps;

impl DynamicOps for JsonOps {
    type Value = Value;

    fn empty(&self) -> Value {
        Value::Null
    }

    fn create_numeric(&self, number: Number) -> Value {
        match number {
            Number::Float(v) => float_value(v as f64),
            Number::Double(v) => float_value(v),
            integer => integer.as_i64().map_or(Value::Null, Value::from),
        }
    }

    fn create_boolean(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn create_string(&self, value: &str) -> Value {
        Value::String(value.to_owned())
    }

    fn create_list(&self, items: Vec<Value>) -> Result<Value> {
        Ok(Value::Array(items))
    }

    fn create_map(&self, entries: Vec<(Value, Value)>) -> Result<Value> {
        let mut map = Map::with_capacity(entries.len());
        for (key, value) in entries {
            match key {
                Value::String(key) => {
                    map.insert(key, value);
                }
                other => {
                    return Err(Error::unsupported(format!(
                        "JSON object keys must be strings, got {other}"
                    )));
                }
            }
        }
        Ok(Value::Object(map))
    }

    fn get_number_value(&self, value: &Value) -> Result<Number> {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Number::from(v))
                } else if let Some(v) = n.as_f64() {
                    Ok(Number::Double(v))
                } else {
                    Err(Error::malformed(format!("Number out of range: {n}")))
                }
            }
            other => Err(Error::malformed(format!("Not a number: {other}"))),
        }
    }

    fn get_boolean_value(&self, value: &Value) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| Error::malformed(format!("Not a boolean: {value}")))
    }

    fn get_string_value<'a>(&self, value: &'a Value) -> Result<Cow<'a, str>> {
        match value {
            Value::String(s) => Ok(Cow::Borrowed(s)),
            other => Err(Error::malformed(format!("Not a string: {other}"))),
        }
    }

    fn get_list(&self, value: &Value) -> Result<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.clone()),
            other => Err(Error::malformed(format!("Not a list: {other}"))),
        }
    }

    fn get_map(&self, value: &Value) -> Result<Vec<(Value, Value)>> {
        match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                .collect()),
            other => Err(Error::malformed(format!("Not a map: {other}"))),
        }
    }

    fn extended(&self) -> Option<&dyn ExtendedDynamicOps<Value>> {
        Some(self)
    }
}

fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

impl ExtendedDynamicOps<Value> for JsonOps {
    fn supported_map_keys(&self) -> ElementSupport {
        ElementSupport::Strings
    }

    fn supports_null(&self) -> bool {
        true
    }

    fn create_null(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn wrap_nullable(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn is_not_null(&self, value: &Value) -> Result<bool> {
        Ok(!value.is_null())
    }

    fn unwrap_nullable(&self, value: Value) -> Result<Value> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_map_rejects_non_string_keys() {
        let err = JsonOps
            .create_map(vec![(json!(1), json!("a"))])
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(JsonOps.create_byte(3), json!(3));
        assert_eq!(JsonOps.get_number_value(&json!(7)).unwrap(), Number::Int(7));
        assert_eq!(
            JsonOps.get_number_value(&json!(1.5)).unwrap(),
            Number::Double(1.5)
        );
        assert!(JsonOps.get_number_value(&json!(true)).is_err());
        assert_eq!(JsonOps.create_double(f64::NAN), Value::Null);
    }
}
