//! Serde support for tree-shaped data formats.
//!
//! A format is described by a [`DynamicOps`]; [`SerializerCodec`] turns any
//! `Serialize + Deserialize` type into a [`Codec`] over every such format.
//! JSON ([`JsonOps`]), NBT ([`NbtOps`]) and an in-memory tree
//! ([`DynamicValueOps`]) are provided.

#[cfg(feature = "nbt")]
pub use zerocopy::BigEndian;
#[cfg(feature = "nbt")]
pub use zerocopy::LittleEndian;

mod codec;
mod de;
mod error;
#[cfg(feature = "nbt")]
pub mod nbt;
mod number;
mod ops;
mod options;
mod ser;
mod state;
mod util;
mod validate;

pub use codec::*;
pub use de::DynamicDecoder;
pub use error::*;
#[cfg(feature = "nbt")]
pub use nbt::*;
pub use number::*;
pub use ops::*;
pub use options::*;
pub use ser::DynamicEncoder;
pub use util::*;
