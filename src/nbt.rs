//! An owned NBT (Named Binary Tag) tree and its binary form.
//!
//! [`Nbt`] is the value type of [`NbtOps`](crate::NbtOps). It can be written
//! to and read from the binary format used by Java Edition (big-endian) and
//! Bedrock Edition (little-endian):
//!
//! ```
//! use na_codec::{Nbt, NbtCompound, from_slice_be, to_vec_be};
//!
//! let mut compound = NbtCompound::new();
//! compound.insert("name", Nbt::String("Steve".into()));
//! compound.insert("health", Nbt::Float(20.0));
//!
//! let bytes = to_vec_be(&Nbt::Compound(compound.clone())).unwrap();
//! assert_eq!(from_slice_be(&bytes).unwrap(), Nbt::Compound(compound));
//! ```

mod read;
mod write;

pub use read::*;
pub use write::*;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TagID {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagID {
    /// Converts a raw tag byte, returning `None` for bytes above 12.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return None,
        })
    }

    /// Returns `true` if this is a primitive tag type.
    ///
    /// Primitive tags are: End, Byte, Short, Int, Long, Float, Double.
    ///
    /// # Example
    ///
    /// ```
    /// use na_codec::TagID;
    ///
    /// assert!(TagID::Int.is_primitive());
    /// assert!(!TagID::List.is_primitive());
    /// assert!(!TagID::ByteArray.is_primitive());
    /// ```
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::End
                | Self::Byte
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
        )
    }

    /// Returns `true` if this is an array tag type.
    ///
    /// Array tags are: ByteArray, IntArray, LongArray.
    pub const fn is_array(self) -> bool {
        matches!(self, Self::ByteArray | Self::IntArray | Self::LongArray)
    }

    /// Returns `true` if this is a composite tag type.
    ///
    /// Composite tags are: List, Compound.
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::List | Self::Compound)
    }
}

/// An owned NBT value.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum Nbt {
    #[default]
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Nbt>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Nbt {
    pub const fn tag_id(&self) -> TagID {
        match self {
            Self::End => TagID::End,
            Self::Byte(_) => TagID::Byte,
            Self::Short(_) => TagID::Short,
            Self::Int(_) => TagID::Int,
            Self::Long(_) => TagID::Long,
            Self::Float(_) => TagID::Float,
            Self::Double(_) => TagID::Double,
            Self::ByteArray(_) => TagID::ByteArray,
            Self::String(_) => TagID::String,
            Self::List(_) => TagID::List,
            Self::Compound(_) => TagID::Compound,
            Self::IntArray(_) => TagID::IntArray,
            Self::LongArray(_) => TagID::LongArray,
        }
    }
}

impl From<NbtCompound> for Nbt {
    fn from(value: NbtCompound) -> Self {
        Self::Compound(value)
    }
}

/// A compound tag. Entries keep insertion order; inserting an existing key
/// replaces its value in place.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NbtCompound {
    entries: Vec<(String, Nbt)>,
}

impl NbtCompound {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Nbt> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Nbt) -> Option<Nbt> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Nbt> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Nbt)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Nbt)> for NbtCompound {
    fn from_iter<T: IntoIterator<Item = (K, Nbt)>>(iter: T) -> Self {
        let mut compound = Self::new();
        for (key, value) in iter {
            compound.insert(key, value);
        }
        compound
    }
}

impl IntoIterator for NbtCompound {
    type Item = (String, Nbt);
    type IntoIter = std::vec::IntoIter<(String, Nbt)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
