use std::borrow::Cow;

use crate::{DynamicOps, Error, Nbt, NbtCompound, Number, Result, TagID};

/// [`DynamicOps`] for owned [`Nbt`] trees.
///
/// NBT has no null and only string compound keys, so the codec layer falls
/// back to the synthesized null encoding for it. Lists follow the game's
/// rules: a list of only bytes, ints or longs becomes the matching array tag,
/// and a list mixing tag types wraps each element in a compound under the
/// empty key.
#[derive(Clone, Copy, Debug, Default)]
pub struct NbtOps;

fn is_wrapper(compound: &NbtCompound) -> bool {
    compound.len() == 1 && compound.contains_key("")
}

fn wrap_if_needed(value: Nbt) -> Nbt {
    match value {
        Nbt::Compound(compound) if !is_wrapper(&compound) => Nbt::Compound(compound),
        other => Nbt::Compound(NbtCompound::from_iter([("", other)])),
    }
}

fn unwrap_if_wrapper(value: &Nbt) -> Nbt {
    match value {
        Nbt::Compound(compound) if is_wrapper(compound) => {
            compound.get("").cloned().unwrap_or_default()
        }
        other => other.clone(),
    }
}

impl DynamicOps for NbtOps {
    type Value = Nbt;

    fn empty(&self) -> Nbt {
        Nbt::End
    }

    fn create_numeric(&self, number: Number) -> Nbt {
        match number {
            Number::Byte(v) => Nbt::Byte(v),
            Number::Short(v) => Nbt::Short(v),
            Number::Int(v) => Nbt::Int(v),
            Number::Long(v) => Nbt::Long(v),
            Number::Float(v) => Nbt::Float(v),
            Number::Double(v) => Nbt::Double(v),
        }
    }

    fn create_boolean(&self, value: bool) -> Nbt {
        Nbt::Byte(value as i8)
    }

    fn create_string(&self, value: &str) -> Nbt {
        Nbt::String(value.to_owned())
    }

    fn create_list(&self, items: Vec<Nbt>) -> Result<Nbt> {
        let Some(first) = items.first().map(Nbt::tag_id) else {
            return Ok(Nbt::List(items));
        };
        if items.iter().any(|item| item.tag_id() != first) {
            return Ok(Nbt::List(items.into_iter().map(wrap_if_needed).collect()));
        }
        Ok(match first {
            TagID::Byte => Nbt::ByteArray(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Nbt::Byte(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            ),
            TagID::Int => Nbt::IntArray(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Nbt::Int(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            ),
            TagID::Long => Nbt::LongArray(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Nbt::Long(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            ),
            TagID::Compound => Nbt::List(items.into_iter().map(wrap_if_needed).collect()),
            _ => Nbt::List(items),
        })
    }

    fn create_map(&self, entries: Vec<(Nbt, Nbt)>) -> Result<Nbt> {
        let mut compound = NbtCompound::new();
        for (key, value) in entries {
            match key {
                Nbt::String(key) => {
                    compound.insert(key, value);
                }
                other => {
                    return Err(Error::unsupported(format!(
                        "NBT compound keys must be strings, got {other:?}"
                    )));
                }
            }
        }
        Ok(Nbt::Compound(compound))
    }

    fn create_byte_list(&self, bytes: &[u8]) -> Result<Nbt> {
        Ok(Nbt::ByteArray(bytes.iter().map(|b| *b as i8).collect()))
    }

    fn get_number_value(&self, value: &Nbt) -> Result<Number> {
        match value {
            Nbt::Byte(v) => Ok(Number::Byte(*v)),
            Nbt::Short(v) => Ok(Number::Short(*v)),
            Nbt::Int(v) => Ok(Number::Int(*v)),
            Nbt::Long(v) => Ok(Number::Long(*v)),
            Nbt::Float(v) => Ok(Number::Float(*v)),
            Nbt::Double(v) => Ok(Number::Double(*v)),
            other => Err(Error::malformed(format!("Not a number: {other:?}"))),
        }
    }

    fn get_string_value<'a>(&self, value: &'a Nbt) -> Result<Cow<'a, str>> {
        match value {
            Nbt::String(s) => Ok(Cow::Borrowed(s)),
            other => Err(Error::malformed(format!("Not a string: {other:?}"))),
        }
    }

    fn get_list(&self, value: &Nbt) -> Result<Vec<Nbt>> {
        match value {
            Nbt::List(items) => Ok(items.iter().map(unwrap_if_wrapper).collect()),
            Nbt::ByteArray(items) => Ok(items.iter().map(|v| Nbt::Byte(*v)).collect()),
            Nbt::IntArray(items) => Ok(items.iter().map(|v| Nbt::Int(*v)).collect()),
            Nbt::LongArray(items) => Ok(items.iter().map(|v| Nbt::Long(*v)).collect()),
            other => Err(Error::malformed(format!("Not a list: {other:?}"))),
        }
    }

    fn get_map(&self, value: &Nbt) -> Result<Vec<(Nbt, Nbt)>> {
        match value {
            Nbt::Compound(compound) => Ok(compound
                .iter()
                .map(|(k, v)| (Nbt::String(k.to_owned()), v.clone()))
                .collect()),
            other => Err(Error::malformed(format!("Not a map: {other:?}"))),
        }
    }

    fn get_byte_buffer(&self, value: &Nbt) -> Result<Vec<u8>> {
        match value {
            Nbt::ByteArray(items) => Ok(items.iter().map(|b| *b as u8).collect()),
            Nbt::List(items) => items
                .iter()
                .map(|item| match item {
                    Nbt::Byte(b) => Ok(*b as u8),
                    other => Err(Error::malformed(format!("Not a byte: {other:?}"))),
                })
                .collect(),
            other => Err(Error::malformed(format!("Not a byte array: {other:?}"))),
        }
    }
}
