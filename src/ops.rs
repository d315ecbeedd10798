//! The tree-format abstraction the codec layer encodes into and decodes from.
//!
//! A [`DynamicOps`] value knows how to build and take apart the nodes of one
//! concrete format. Formats that can do more than the common denominator
//! (native null, structured map keys) advertise it through
//! [`ExtendedDynamicOps`], which the codec layer probes via
//! [`DynamicOps::extended`].
//!
//! | Format | Ops | Null | Map keys |
//! |--------|-----|------|----------|
//! | `serde_json::Value` | [`JsonOps`] | native | strings |
//! | [`Nbt`] | [`NbtOps`] | synthesized | strings |
//! | [`Dynamic`] | [`DynamicValueOps`] | native | any |
//!
//! [`Nbt`]: crate::Nbt

use std::{borrow::Cow, fmt::Debug};

use crate::{Error, Number, Result};

mod defaulting;
mod dynamic;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "nbt")]
mod nbt;

pub use defaulting::*;
pub use dynamic::*;
#[cfg(feature = "json")]
pub use json::*;
#[cfg(feature = "nbt")]
pub use nbt::*;

/// Which values a format accepts as map keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ElementSupport {
    /// Only strings. Primitive keys are converted to their string form.
    Strings,
    /// Strings, numbers and booleans.
    Primitives,
    /// Any value, including lists, maps and null.
    Any,
}

/// Builds and inspects the nodes of a tree format.
///
/// Every getter fails with [`Error::MalformedData`] when the node is not of
/// the requested kind.
pub trait DynamicOps {
    type Value: Clone + Debug + PartialEq;

    /// The neutral value that [`merge_to_map`](Self::merge_to_map) and friends
    /// treat as "nothing written yet".
    fn empty(&self) -> Self::Value;

    fn create_numeric(&self, number: Number) -> Self::Value;

    fn create_byte(&self, value: i8) -> Self::Value {
        self.create_numeric(Number::Byte(value))
    }

    fn create_short(&self, value: i16) -> Self::Value {
        self.create_numeric(Number::Short(value))
    }

    fn create_int(&self, value: i32) -> Self::Value {
        self.create_numeric(Number::Int(value))
    }

    fn create_long(&self, value: i64) -> Self::Value {
        self.create_numeric(Number::Long(value))
    }

    fn create_float(&self, value: f32) -> Self::Value {
        self.create_numeric(Number::Float(value))
    }

    fn create_double(&self, value: f64) -> Self::Value {
        self.create_numeric(Number::Double(value))
    }

    fn create_boolean(&self, value: bool) -> Self::Value;

    fn create_string(&self, value: &str) -> Self::Value;

    fn create_list(&self, items: Vec<Self::Value>) -> Result<Self::Value>;

    fn create_map(&self, entries: Vec<(Self::Value, Self::Value)>) -> Result<Self::Value>;

    fn create_byte_list(&self, bytes: &[u8]) -> Result<Self::Value> {
        self.create_list(bytes.iter().map(|b| self.create_byte(*b as i8)).collect())
    }

    fn get_number_value(&self, value: &Self::Value) -> Result<Number>;

    fn get_boolean_value(&self, value: &Self::Value) -> Result<bool> {
        match self.get_number_value(value)? {
            Number::Byte(v) => Ok(v != 0),
            other => Err(Error::malformed(format!("Not a boolean: {other}"))),
        }
    }

    fn get_string_value<'a>(&self, value: &'a Self::Value) -> Result<Cow<'a, str>>;

    fn get_list(&self, value: &Self::Value) -> Result<Vec<Self::Value>>;

    fn get_map(&self, value: &Self::Value) -> Result<Vec<(Self::Value, Self::Value)>>;

    fn get_byte_buffer(&self, value: &Self::Value) -> Result<Vec<u8>> {
        self.get_list(value)?
            .iter()
            .map(|item| match self.get_number_value(item)?.as_i64() {
                Some(v) if (i8::MIN as i64..=u8::MAX as i64).contains(&v) => Ok(v as u8),
                _ => Err(Error::malformed("Byte buffer element out of range")),
            })
            .collect()
    }

    fn merge_to_list(&self, prefix: &Self::Value, items: Vec<Self::Value>) -> Result<Self::Value> {
        if *prefix == self.empty() {
            return self.create_list(items);
        }
        let mut merged = self.get_list(prefix)?;
        merged.extend(items);
        self.create_list(merged)
    }

    fn merge_to_map(
        &self,
        prefix: &Self::Value,
        entries: Vec<(Self::Value, Self::Value)>,
    ) -> Result<Self::Value> {
        if *prefix == self.empty() {
            return self.create_map(entries);
        }
        let mut merged = self.get_map(prefix)?;
        merged.extend(entries);
        self.create_map(merged)
    }

    fn merge_to_primitive(&self, prefix: &Self::Value, value: Self::Value) -> Result<Self::Value> {
        if *prefix != self.empty() {
            return Err(Error::malformed(format!(
                "Do not know how to append a primitive value {value:?} to {prefix:?}"
            )));
        }
        Ok(value)
    }

    /// Returns the extended capabilities of this format, if it has any.
    fn extended(&self) -> Option<&dyn ExtendedDynamicOps<Self::Value>> {
        None
    }
}

/// Optional capabilities beyond [`DynamicOps`].
///
/// `wrap_nullable` and `unwrap_nullable` must be inverses, and
/// `is_not_null(create_null())` must be `false`.
pub trait ExtendedDynamicOps<V> {
    fn supported_map_keys(&self) -> ElementSupport;

    fn supports_null(&self) -> bool;

    fn create_null(&self) -> Result<V>;

    fn wrap_nullable(&self, value: V) -> Result<V>;

    fn is_not_null(&self, value: &V) -> Result<bool>;

    fn unwrap_nullable(&self, value: V) -> Result<V>;
}

/// Renders a primitive as text: strings as-is, numbers and booleans in their
/// display form. Returns `None` for structures.
pub fn get_primitive_as_string<O: DynamicOps + ?Sized>(ops: &O, value: &O::Value) -> Option<String> {
    if let Ok(s) = ops.get_string_value(value) {
        return Some(s.into_owned());
    }
    if let Ok(n) = ops.get_number_value(value) {
        return Some(n.to_string());
    }
    ops.get_boolean_value(value).ok().map(|b| b.to_string())
}

/// Looks up a string key in a list of map entries.
pub(crate) fn map_get<'a, O: DynamicOps + ?Sized>(
    ops: &O,
    entries: &'a [(O::Value, O::Value)],
    key: &str,
) -> Option<&'a O::Value> {
    entries.iter().find_map(|(k, v)| match ops.get_string_value(k) {
        Ok(s) if s == key => Some(v),
        _ => None,
    })
}
