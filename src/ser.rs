//! Serde serializer that encodes into any [`DynamicOps`] format.
//!
//! The encoder keeps an explicit stack of [`EncoderState`]s, one per open
//! structure. Serde calls push and pop states; primitives are added to the
//! state on top of the stack. When an error occurs the stack is left as it
//! was, so [`DynamicEncoder::collect_trace`] can report where encoding
//! stopped.
//!
//! # Rust to tree mapping
//!
//! | Rust | Encoded as |
//! |------|------------|
//! | `bool`, `i8`..`i64`, `f32`, `f64` | the matching primitive |
//! | `u8`, `u16`, `u32` | the next wider signed primitive |
//! | `u64` | a long, if it fits |
//! | `char`, `&str`, `String` | a string |
//! | `&[u8]` (with `serde_bytes`) | a byte list |
//! | `Option<T>` | null or the value, through the extended ops |
//! | `Some(None)` | `{"value": {}}` with synthesized null; an error with native null |
//! | `()`, unit structs | an empty map |
//! | newtype structs | the inner value, or `{"value": inner}` with inline wrappers |
//! | structs | a map of fields |
//! | sequences, tuples | a list |
//! | maps | a map, or a list of `{"key", "value"}` entries |
//! | unit variants | the variant name or index |
//! | other variants | `{"type": name, "value": payload}`, or flattened |

use serde::{Serialize, ser};

use crate::{
    CodecOptions, DynamicOps, ElementSupport, EnumEncoding, Error, ExtendedDynamicOps, Result,
    cold_path, get_primitive_as_string,
    state::{ElementOptions, SerializationConfig},
};

mod state;

pub(crate) use state::*;

/// Serializer implementing [`serde::Serializer`] on top of a [`DynamicOps`].
///
/// Most callers go through [`SerializerCodec`](crate::SerializerCodec)
/// instead, which adds error traces and prefix merging.
pub struct DynamicEncoder<'o, O: DynamicOps> {
    config: SerializationConfig<'o, O>,
    states: Vec<EncoderState<'o, O::Value>>,
}

impl<'o, O: DynamicOps> DynamicEncoder<'o, O> {
    pub fn new(ops: &'o O, options: &'o CodecOptions) -> Self {
        Self {
            config: SerializationConfig::new(ops, options),
            states: vec![EncoderState::root()],
        }
    }

    /// Encodes `value`. On failure the state stack is kept for
    /// [`collect_trace`](Self::collect_trace).
    pub fn encode<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<O::Value> {
        self.states.clear();
        self.states.push(EncoderState::root());
        value.serialize(&mut *self)?;
        match self.states.pop() {
            Some(root @ EncoderState::Root { .. }) => root.build(&self.config),
            _ => {
                cold_path();
                Err(Error::illegal_state("Encoder stack is unbalanced"))
            }
        }
    }

    /// The path to the element being encoded, such as `$[0].field.nested`.
    pub fn collect_trace(&self) -> String {
        let mut trace = String::from("$");
        for state in &self.states {
            if let Some(segment) = state.element_trace(&self.config) {
                trace.push_str(&segment);
            }
        }
        trace
    }

    fn top(&mut self) -> Result<&mut EncoderState<'o, O::Value>> {
        self.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Encoder has no active state")
        })
    }

    fn current_options(&self) -> ElementOptions<'o> {
        self.states
            .last()
            .map(|state| state.element_options(&self.config))
            .unwrap_or_default()
    }

    fn emit(&mut self, value: O::Value) -> Result<()> {
        let state = self.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Encoder has no active state")
        })?;
        state.add_element(&self.config, value)
    }

    /// Adds a primitive, converting it to a string when it is the key of a
    /// regular map in a format with string-only keys.
    fn emit_primitive(&mut self, value: O::Value) -> Result<()> {
        if self.current_options().is_map_key && self.config.map_keys() == ElementSupport::Strings {
            if let Some(text) = get_primitive_as_string(self.config.ops, &value) {
                return self.emit(self.config.ops.create_string(&text));
            }
        }
        self.emit(value)
    }

    /// Rejects structured map keys unless the format takes any key.
    fn check_structure_key(&self, kind: &str) -> Result<()> {
        if self.current_options().is_map_key && self.config.map_keys() != ElementSupport::Any {
            cold_path();
            return Err(Error::unsupported(format!(
                "Regular maps do not support keys of kind {kind}, enable use_entry_list_maps to encode this map as a list of entries"
            )));
        }
        Ok(())
    }

    fn check_nullable(&mut self) -> Result<()> {
        if self.current_options().is_map_key {
            cold_path();
            return Err(Error::unsupported(
                "Regular maps do not support nullable keys, enable use_entry_list_maps to encode this map as a list of entries",
            ));
        }
        let len = self.states.len();
        if len >= 2
            && matches!(self.states[len - 1], EncoderState::Inline { field: None, .. })
            && matches!(self.states[len - 2], EncoderState::Nullable { .. })
        {
            cold_path();
            return Err(Error::ambiguous(
                "An optional newtype without an inline wrapper can not hold an optional value, since both nulls would encode the same; enable use_inline_wrappers for it",
            ));
        }
        self.top()?.mark_nullable();
        Ok(())
    }

    fn push(&mut self, state: EncoderState<'o, O::Value>) {
        self.states.push(state);
    }

    fn pop_and_emit(&mut self) -> Result<()> {
        let state = self.states.pop().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Encoder has no active state")
        })?;
        let value = state.build(&self.config)?;
        self.emit(value)
    }

    fn push_polymorphic(&mut self, name: &'static str, variant: &'static str) -> Result<()> {
        self.check_structure_key("polymorphic")?;
        let options = self.config.options;
        self.push(EncoderState::Polymorphic {
            discriminator: options.discriminator_for(name),
            flatten: options.flatten_for(name),
            serial_name: None,
            value: None,
            added: 0,
            parent: self.current_options(),
        });
        self.emit(self.config.ops.create_string(variant))
    }

    fn push_class(&mut self, name: &'static str) -> Result<()> {
        self.check_structure_key("class")?;
        let reserved_key = self.current_options().reserved_key;
        self.push(EncoderState::class(name, reserved_key));
        Ok(())
    }

    fn push_list(&mut self) -> Result<()> {
        self.check_structure_key("list")?;
        self.push(EncoderState::list());
        Ok(())
    }

    fn encode_long(&mut self, value: i128) -> Result<()> {
        let Ok(value) = i64::try_from(value) else {
            cold_path();
            return Err(Error::unsupported(format!(
                "Integer {value} does not fit into a long"
            )));
        };
        self.emit_primitive(self.config.ops.create_long(value))
    }
}

impl<'a, 'o, O: DynamicOps> ser::Serializer for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.emit_primitive(self.config.ops.create_boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.emit_primitive(self.config.ops.create_byte(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.emit_primitive(self.config.ops.create_short(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.emit_primitive(self.config.ops.create_int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.emit_primitive(self.config.ops.create_long(v))
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.encode_long(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.emit_primitive(self.config.ops.create_short(v as i16))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.emit_primitive(self.config.ops.create_int(v as i32))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.emit_primitive(self.config.ops.create_long(v as i64))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.encode_long(v as i128)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        let Ok(v) = i128::try_from(v) else {
            cold_path();
            return Err(Error::unsupported(format!(
                "Integer {v} does not fit into a long"
            )));
        };
        self.encode_long(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.emit_primitive(self.config.ops.create_float(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.emit_primitive(self.config.ops.create_double(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.emit_primitive(self.config.ops.create_string(v.encode_utf8(&mut [0u8; 4])))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.emit_primitive(self.config.ops.create_string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.check_structure_key("byte list")?;
        let value = self.config.ops.create_byte_list(v)?;
        self.emit(value)
    }

    fn serialize_none(self) -> Result<()> {
        if self.config.extended.supports_null()
            && matches!(self.states.last(), Some(EncoderState::Nullable { .. }))
        {
            cold_path();
            return Err(Error::ambiguous(
                "A present optional can not hold an absent optional in a format with native null, since both encode as null",
            ));
        }
        self.check_nullable()?;
        let null = self.config.extended.create_null()?;
        self.emit(null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.check_nullable()?;
        let parent = self.current_options();
        self.push(EncoderState::Nullable {
            child: None,
            parent,
        });
        value.serialize(&mut *self)?;
        self.pop_and_emit()
    }

    fn serialize_unit(self) -> Result<()> {
        self.check_structure_key("object")?;
        self.push(EncoderState::Object);
        self.pop_and_emit()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        let ops = self.config.ops;
        let value = match self.config.options.enum_options.encoding {
            EnumEncoding::Index => ops.create_int(variant_index as i32),
            EnumEncoding::SerialName {
                case_insensitive: true,
            } => ops.create_string(&variant.to_lowercase()),
            EnumEncoding::SerialName {
                case_insensitive: false,
            } => ops.create_string(variant),
        };
        self.emit_primitive(value)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let parent = self.current_options();
        let as_key = parent.is_map_key && self.config.map_keys() != ElementSupport::Any;
        let options = self.config.options;
        let field = (options.use_inline_wrapper_for(name) && !as_key)
            .then(|| options.inline_field_for(name));
        self.push(EncoderState::Inline {
            type_name: name,
            field,
            child: None,
            expect_nullable: false,
            parent,
        });
        value.serialize(&mut *self)?;
        self.pop_and_emit()
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push_polymorphic(name, variant)?;
        value.serialize(&mut *self)?;
        self.pop_and_emit()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.push_list()?;
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        self.push_list()?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.push_list()?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.push_polymorphic(name, variant)?;
        self.push(EncoderState::list());
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.check_structure_key("map")?;
        let layout = if self.current_options().use_entry_list_map {
            MapLayout::EntryList
        } else {
            MapLayout::Regular
        };
        self.push(EncoderState::map(layout));
        Ok(self)
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.push_class(name)?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.push_polymorphic(name, variant)?;
        let reserved_key = self.current_options().reserved_key;
        self.push(EncoderState::class(name, reserved_key));
        Ok(self)
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeSeq for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.top()?.begin_list_element();
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeTuple for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeTupleStruct for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeTupleVariant for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    // the list, then the polymorphic wrapper
    fn end(self) -> Result<()> {
        self.pop_and_emit()?;
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeMap for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.top()?.begin_map_element(true)?;
        key.serialize(&mut **self)
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.top()?.begin_map_element(false)?;
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeStruct for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let config = &self.config;
        let state = self.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Encoder has no active state")
        })?;
        state.begin_field(config, key)?;
        value.serialize(&mut **self)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        self.top()?.skip_field(key)
    }

    fn end(self) -> Result<()> {
        self.pop_and_emit()
    }
}

impl<'a, 'o, O: DynamicOps> ser::SerializeStructVariant for &'a mut DynamicEncoder<'o, O> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<()> {
        ser::SerializeStruct::skip_field(self, key)
    }

    // the fields, then the polymorphic wrapper
    fn end(self) -> Result<()> {
        self.pop_and_emit()?;
        self.pop_and_emit()
    }
}
