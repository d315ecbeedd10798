use std::io::Read;

use zerocopy::byteorder;

use crate::{ByteOrder, Error, Nbt, NbtCompound, Result, TagID, cold_path};

/// Nesting depth at which reading gives up, matching the game's own limit.
pub const MAX_DEPTH: usize = 512;

struct Reader<'a, O: ByteOrder> {
    input: &'a [u8],
    marker: std::marker::PhantomData<O>,
}

impl<'a, O: ByteOrder> Reader<'a, O> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.input.len() < len {
            cold_path();
            return Err(Error::EndOfFile);
        }
        let (head, rest) = self.input.split_at(len);
        self.input = rest;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.take(N)?);
        Ok(bytes)
    }

    fn read_tag_id(&mut self) -> Result<TagID> {
        let [raw] = self.take_array::<1>()?;
        TagID::from_u8(raw).ok_or(Error::InvalidTagType(raw))
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take_array::<1>()?[0] as i8)
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(byteorder::I16::<O>::from_bytes(self.take_array()?).get())
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(byteorder::I32::<O>::from_bytes(self.take_array()?).get())
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(byteorder::I64::<O>::from_bytes(self.take_array()?).get())
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(byteorder::F32::<O>::from_bytes(self.take_array()?).get())
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(byteorder::F64::<O>::from_bytes(self.take_array()?).get())
    }

    fn read_len(&mut self, element_size: usize) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            cold_path();
            return Err(Error::malformed(format!("negative length: {len}")));
        }
        let len = len as usize;
        // every element occupies at least `element_size` bytes
        if len.saturating_mul(element_size) > self.input.len() {
            cold_path();
            return Err(Error::EndOfFile);
        }
        Ok(len)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = byteorder::U16::<O>::from_bytes(self.take_array()?).get() as usize;
        let bytes = self.take(len)?;
        simd_cesu8::mutf8::decode(bytes)
            .map(|s| s.into_owned())
            .map_err(|e| {
                cold_path();
                Error::malformed(format!("invalid MUTF-8 string: {e}"))
            })
    }

    fn read_payload(&mut self, tag_id: TagID, depth: usize) -> Result<Nbt> {
        if depth > MAX_DEPTH {
            cold_path();
            return Err(Error::malformed(format!(
                "NBT nesting deeper than {MAX_DEPTH}"
            )));
        }
        Ok(match tag_id {
            TagID::End => Nbt::End,
            TagID::Byte => Nbt::Byte(self.read_i8()?),
            TagID::Short => Nbt::Short(self.read_i16()?),
            TagID::Int => Nbt::Int(self.read_i32()?),
            TagID::Long => Nbt::Long(self.read_i64()?),
            TagID::Float => Nbt::Float(self.read_f32()?),
            TagID::Double => Nbt::Double(self.read_f64()?),
            TagID::ByteArray => {
                let len = self.read_len(1)?;
                Nbt::ByteArray(self.take(len)?.iter().map(|b| *b as i8).collect())
            }
            TagID::String => Nbt::String(self.read_string()?),
            TagID::List => {
                let element = self.read_tag_id()?;
                let len = self.read_len(if element == TagID::End { 0 } else { 1 })?;
                if element == TagID::End && len > 0 {
                    cold_path();
                    return Err(Error::malformed("non-empty list of End tags"));
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_payload(element, depth + 1)?);
                }
                Nbt::List(items)
            }
            TagID::Compound => {
                let mut compound = NbtCompound::new();
                loop {
                    let tag_id = self.read_tag_id()?;
                    if tag_id == TagID::End {
                        break;
                    }
                    let name = self.read_string()?;
                    compound.insert(name, self.read_payload(tag_id, depth + 1)?);
                }
                Nbt::Compound(compound)
            }
            TagID::IntArray => {
                let len = self.read_len(4)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_i32()?);
                }
                Nbt::IntArray(items)
            }
            TagID::LongArray => {
                let len = self.read_len(8)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_i64()?);
                }
                Nbt::LongArray(items)
            }
        })
    }
}

/// Reads a named root tag from binary NBT. The root name is discarded.
///
/// # Errors
///
/// - [`Error::EndOfFile`] if the data is truncated
/// - [`Error::InvalidTagType`] if a tag byte is above 12
/// - [`Error::TrailingData`] if bytes remain after the root tag
/// - [`Error::MalformedData`] if a string or name is not valid MUTF-8
pub fn from_slice<O: ByteOrder>(input: &[u8]) -> Result<Nbt> {
    let mut reader = Reader::<O> {
        input,
        marker: std::marker::PhantomData,
    };
    let tag_id = reader.read_tag_id()?;
    let value = if tag_id == TagID::End {
        Nbt::End
    } else {
        reader.read_string()?;
        reader.read_payload(tag_id, 0)?
    };
    if !reader.input.is_empty() {
        cold_path();
        return Err(Error::TrailingData(reader.input.len()));
    }
    Ok(value)
}

/// Reads big-endian (Java Edition) binary NBT.
#[inline]
pub fn from_slice_be(input: &[u8]) -> Result<Nbt> {
    from_slice::<zerocopy::BigEndian>(input)
}

/// Reads little-endian (Bedrock Edition) binary NBT.
#[inline]
pub fn from_slice_le(input: &[u8]) -> Result<Nbt> {
    from_slice::<zerocopy::LittleEndian>(input)
}

/// Reads binary NBT from any [`std::io::Read`] implementation.
///
/// The reader is consumed to its end; anything after the root tag is
/// reported as [`Error::TrailingData`].
pub fn from_reader<O: ByteOrder, R: Read>(mut reader: R) -> Result<Nbt> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    from_slice::<O>(&buf)
}

#[inline]
pub fn from_reader_be<R: Read>(reader: R) -> Result<Nbt> {
    from_reader::<zerocopy::BigEndian, R>(reader)
}

#[inline]
pub fn from_reader_le<R: Read>(reader: R) -> Result<Nbt> {
    from_reader::<zerocopy::LittleEndian, R>(reader)
}
