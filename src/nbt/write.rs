use std::{io::Write, marker::PhantomData};

use zerocopy::byteorder;

use crate::{ByteOrder, Error, Nbt, Result, TagID, cold_path};

struct Writer<O: ByteOrder> {
    vec: Vec<u8>,
    marker: PhantomData<O>,
}

impl<O: ByteOrder> Writer<O> {
    fn write_string(&mut self, value: &str) -> Result<()> {
        let encoded = simd_cesu8::mutf8::encode(value);
        if encoded.len() > u16::MAX as usize {
            cold_path();
            return Err(Error::unsupported(format!(
                "string too long for NBT: {} bytes",
                encoded.len()
            )));
        }
        self.vec
            .extend_from_slice(&byteorder::U16::<O>::new(encoded.len() as u16).to_bytes());
        self.vec.extend_from_slice(&encoded);
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let Ok(len) = i32::try_from(len) else {
            cold_path();
            return Err(Error::unsupported(format!("sequence too long for NBT: {len}")));
        };
        self.vec
            .extend_from_slice(&byteorder::I32::<O>::new(len).to_bytes());
        Ok(())
    }

    fn write_payload(&mut self, value: &Nbt) -> Result<()> {
        match value {
            Nbt::End => {}
            Nbt::Byte(v) => self.vec.push(*v as u8),
            Nbt::Short(v) => self
                .vec
                .extend_from_slice(&byteorder::I16::<O>::new(*v).to_bytes()),
            Nbt::Int(v) => self
                .vec
                .extend_from_slice(&byteorder::I32::<O>::new(*v).to_bytes()),
            Nbt::Long(v) => self
                .vec
                .extend_from_slice(&byteorder::I64::<O>::new(*v).to_bytes()),
            Nbt::Float(v) => self
                .vec
                .extend_from_slice(&byteorder::F32::<O>::new(*v).to_bytes()),
            Nbt::Double(v) => self
                .vec
                .extend_from_slice(&byteorder::F64::<O>::new(*v).to_bytes()),
            Nbt::ByteArray(items) => {
                self.write_len(items.len())?;
                self.vec.extend(items.iter().map(|b| *b as u8));
            }
            Nbt::String(s) => self.write_string(s)?,
            Nbt::List(items) => {
                let element = items.first().map_or(TagID::End, Nbt::tag_id);
                if let Some(other) = items.iter().find(|item| item.tag_id() != element) {
                    cold_path();
                    return Err(Error::unsupported(format!(
                        "list elements must share one tag type: expected {element:?}, got {:?}",
                        other.tag_id()
                    )));
                }
                self.vec.push(element as u8);
                self.write_len(items.len())?;
                for item in items {
                    self.write_payload(item)?;
                }
            }
            Nbt::Compound(compound) => {
                for (name, item) in compound.iter() {
                    self.vec.push(item.tag_id() as u8);
                    self.write_string(name)?;
                    self.write_payload(item)?;
                }
                self.vec.push(TagID::End as u8);
            }
            Nbt::IntArray(items) => {
                self.write_len(items.len())?;
                for v in items {
                    self.vec
                        .extend_from_slice(&byteorder::I32::<O>::new(*v).to_bytes());
                }
            }
            Nbt::LongArray(items) => {
                self.write_len(items.len())?;
                for v in items {
                    self.vec
                        .extend_from_slice(&byteorder::I64::<O>::new(*v).to_bytes());
                }
            }
        }
        Ok(())
    }
}

/// Writes `value` as a root tag with an empty name.
///
/// An [`Nbt::End`] root is written as the single byte `0`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedShape`] if a list mixes tag types, or a string
/// or sequence exceeds the format's length limits.
pub fn to_vec<O: ByteOrder>(value: &Nbt) -> Result<Vec<u8>> {
    let mut writer = Writer::<O> {
        vec: Vec::with_capacity(64),
        marker: PhantomData,
    };
    writer.vec.push(value.tag_id() as u8);
    if value.tag_id() != TagID::End {
        writer.write_string("")?;
        writer.write_payload(value)?;
    }
    Ok(writer.vec)
}

#[inline]
pub fn to_vec_be(value: &Nbt) -> Result<Vec<u8>> {
    to_vec::<zerocopy::BigEndian>(value)
}

#[inline]
pub fn to_vec_le(value: &Nbt) -> Result<Vec<u8>> {
    to_vec::<zerocopy::LittleEndian>(value)
}

/// Writes `value` to any [`std::io::Write`] implementation.
pub fn to_writer<O: ByteOrder, W: Write>(mut writer: W, value: &Nbt) -> Result<()> {
    writer.write_all(&to_vec::<O>(value)?)?;
    Ok(())
}

#[inline]
pub fn to_writer_be<W: Write>(writer: W, value: &Nbt) -> Result<()> {
    to_writer::<zerocopy::BigEndian, W>(writer, value)
}

#[inline]
pub fn to_writer_le<W: Write>(writer: W, value: &Nbt) -> Result<()> {
    to_writer::<zerocopy::LittleEndian, W>(writer, value)
}
