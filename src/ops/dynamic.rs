use std::borrow::Cow;

use crate::{DynamicOps, ElementSupport, Error, ExtendedDynamicOps, Number, Result};

/// An in-memory tree with native null and unrestricted map keys.
///
/// Maps keep insertion order and may use any value as a key, including lists
/// and other maps.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<Dynamic>),
    Map(Vec<(Dynamic, Dynamic)>),
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value stored under `key` if this is a map.
    pub fn get(&self, key: &Dynamic) -> Option<&Dynamic> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the value stored under the string key `key` if this is a map.
    pub fn get_str(&self, key: &str) -> Option<&Dynamic> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::String(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i32> for Dynamic {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// [`DynamicOps`] for [`Dynamic`] trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamicValueOps;

impl DynamicOps for DynamicValueOps {
    type Value = Dynamic;

    fn empty(&self) -> Dynamic {
        Dynamic::Null
    }

    fn create_numeric(&self, number: Number) -> Dynamic {
        match number {
            Number::Byte(v) => Dynamic::Byte(v),
            Number::Short(v) => Dynamic::Short(v),
            Number::Int(v) => Dynamic::Int(v),
            Number::Long(v) => Dynamic::Long(v),
            Number::Float(v) => Dynamic::Float(v),
            Number::Double(v) => Dynamic::Double(v),
        }
    }

    fn create_boolean(&self, value: bool) -> Dynamic {
        Dynamic::Bool(value)
    }

    fn create_string(&self, value: &str) -> Dynamic {
        Dynamic::String(value.to_owned())
    }

    fn create_list(&self, items: Vec<Dynamic>) -> Result<Dynamic> {
        Ok(Dynamic::List(items))
    }

    fn create_map(&self, entries: Vec<(Dynamic, Dynamic)>) -> Result<Dynamic> {
        let mut map: Vec<(Dynamic, Dynamic)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match map.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => map.push((key, value)),
            }
        }
        Ok(Dynamic::Map(map))
    }

    fn get_number_value(&self, value: &Dynamic) -> Result<Number> {
        match value {
            Dynamic::Byte(v) => Ok(Number::Byte(*v)),
            Dynamic::Short(v) => Ok(Number::Short(*v)),
            Dynamic::Int(v) => Ok(Number::Int(*v)),
            Dynamic::Long(v) => Ok(Number::Long(*v)),
            Dynamic::Float(v) => Ok(Number::Float(*v)),
            Dynamic::Double(v) => Ok(Number::Double(*v)),
            other => Err(Error::malformed(format!("Not a number: {other:?}"))),
        }
    }

    fn get_boolean_value(&self, value: &Dynamic) -> Result<bool> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            other => Err(Error::malformed(format!("Not a boolean: {other:?}"))),
        }
    }

    fn get_string_value<'a>(&self, value: &'a Dynamic) -> Result<Cow<'a, str>> {
        match value {
            Dynamic::String(s) => Ok(Cow::Borrowed(s)),
            other => Err(Error::malformed(format!("Not a string: {other:?}"))),
        }
    }

    fn get_list(&self, value: &Dynamic) -> Result<Vec<Dynamic>> {
        match value {
            Dynamic::List(items) => Ok(items.clone()),
            other => Err(Error::malformed(format!("Not a list: {other:?}"))),
        }
    }

    fn get_map(&self, value: &Dynamic) -> Result<Vec<(Dynamic, Dynamic)>> {
        match value {
            Dynamic::Map(entries) => Ok(entries.clone()),
            other => Err(Error::malformed(format!("Not a map: {other:?}"))),
        }
    }

    fn extended(&self) -> Option<&dyn ExtendedDynamicOps<Dynamic>> {
        Some(self)
    }
}

impl ExtendedDynamicOps<Dynamic> for DynamicValueOps {
    fn supported_map_keys(&self) -> ElementSupport {
        ElementSupport::Any
    }

    fn supports_null(&self) -> bool {
        true
    }

    fn create_null(&self) -> Result<Dynamic> {
        Ok(Dynamic::Null)
    }

    fn wrap_nullable(&self, value: Dynamic) -> Result<Dynamic> {
        Ok(value)
    }

    fn is_not_null(&self, value: &Dynamic) -> Result<bool> {
        Ok(!value.is_null())
    }

    fn unwrap_nullable(&self, value: Dynamic) -> Result<Dynamic> {
        Ok(value)
    }
}
