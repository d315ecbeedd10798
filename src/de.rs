//! Serde deserializer that decodes from any [`DynamicOps`] format.
//!
//! The decoder mirrors [`DynamicEncoder`](crate::DynamicEncoder): it keeps a
//! stack of [`DecoderState`]s, one per structure serde is currently visiting,
//! and hands out one element at a time. States are only popped on success,
//! so after an error [`DynamicDecoder::collect_trace`] reports the path to
//! the element that failed.
//!
//! # Lenient inputs
//!
//! - Integers are range checked, and floats with no fractional part are
//!   accepted where an integer is expected.
//! - With `allow_string_values`, numbers, booleans and enum indices may be
//!   given as strings. Keys of regular maps in string-keyed formats always
//!   may.
//! - With lenient enum decoding, a unit variant is accepted by index or by
//!   name in any case.

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess,
    value::{StrDeserializer, U32Deserializer},
};

use crate::{
    CodecOptions, DynamicOps, ElementSupport, EnumEncoding, Error, ExtendedDynamicOps, Number,
    Result, cold_path,
    ops::map_get,
    state::{ElementOptions, SerializationConfig},
    validate::{self, collect_invalid_keys, join_quoted},
};

mod state;

pub(crate) use state::*;

/// Deserializer implementing [`serde::Deserializer`] on top of a
/// [`DynamicOps`].
pub struct DynamicDecoder<'o, O: DynamicOps> {
    config: SerializationConfig<'o, O>,
    states: Vec<DecoderState<'o, O::Value>>,
    current: Option<(O::Value, ElementOptions<'o>)>,
}

impl<'o, O: DynamicOps> DynamicDecoder<'o, O> {
    pub fn new(ops: &'o O, options: &'o CodecOptions) -> Self {
        Self {
            config: SerializationConfig::new(ops, options),
            states: Vec::new(),
            current: None,
        }
    }

    /// Decodes a `T` from `input`. On failure the state stack is kept for
    /// [`collect_trace`](Self::collect_trace).
    pub fn decode<T: DeserializeOwned>(&mut self, input: O::Value) -> Result<T> {
        self.states.clear();
        self.states.push(DecoderState::Root);
        self.current = Some((input, ElementOptions::default()));
        let value = T::deserialize(&mut *self)?;
        self.pop_state()?;
        Ok(value)
    }

    /// The path to the element being decoded, such as `$[0].field.nested`.
    pub fn collect_trace(&self) -> String {
        let mut trace = String::from("$");
        for state in &self.states {
            if let Some(segment) = state.element_trace() {
                trace.push_str(&segment);
            }
        }
        trace
    }

    fn element(&mut self) -> Result<(O::Value, ElementOptions<'o>)> {
        self.current.take().ok_or_else(|| {
            cold_path();
            Error::illegal_state("No element selected for decoding")
        })
    }

    fn top(&mut self) -> Result<&mut DecoderState<'o, O::Value>> {
        self.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Decoder has no active state")
        })
    }

    fn pop_state(&mut self) -> Result<()> {
        let state = self.states.pop().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Decoder has no active state")
        })?;
        if let Err(e) = state.on_complete(&self.config) {
            // keep the failing state for the trace
            self.states.push(state);
            return Err(e);
        }
        Ok(())
    }

    fn strings_allowed(&self, options: ElementOptions<'o>) -> bool {
        self.config.options.allow_string_values
            || (options.is_map_key && self.config.map_keys() == ElementSupport::Strings)
    }

    fn number(&mut self) -> Result<Number> {
        let (value, options) = self.element()?;
        let ops = self.config.ops;
        if let Ok(number) = ops.get_number_value(&value) {
            return Ok(number);
        }
        if self.strings_allowed(options) {
            if let Some(number) = ops
                .get_string_value(&value)
                .ok()
                .and_then(|s| Number::parse(&s))
            {
                return Ok(number);
            }
        }
        cold_path();
        Err(Error::malformed(format!("Expected a number, got {value:?}")))
    }

    fn integer<T: TryFrom<i64>>(&mut self, type_name: &str) -> Result<T> {
        let number = self.number()?;
        number
            .as_i64()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| {
                cold_path();
                Error::malformed(format!("Value {number} is out of range for {type_name}"))
            })
    }

    fn boolean(&mut self) -> Result<bool> {
        let (value, options) = self.element()?;
        let ops = self.config.ops;
        if let Ok(b) = ops.get_boolean_value(&value) {
            return Ok(b);
        }
        if self.strings_allowed(options) {
            // formats storing booleans as bytes stringify them as numbers
            let parsed = ops.get_string_value(&value).ok().and_then(|s| {
                let s = s.trim();
                s.parse::<bool>().ok().or_else(|| {
                    Number::parse(s)
                        .and_then(Number::as_i64)
                        .map(|v| v != 0)
                })
            });
            if let Some(b) = parsed {
                return Ok(b);
            }
        }
        cold_path();
        Err(Error::malformed(format!("Expected a boolean, got {value:?}")))
    }

    fn string(&mut self) -> Result<String> {
        let (value, _) = self.element()?;
        match self.config.ops.get_string_value(&value) {
            Ok(s) => Ok(s.into_owned()),
            Err(_) => {
                cold_path();
                Err(Error::malformed(format!("Expected a string, got {value:?}")))
            }
        }
    }

    /// Fails if an unwrapped newtype directly inside an `Option` is itself
    /// asked for an `Option`.
    fn check_nullable_inline(&self) -> Result<()> {
        let len = self.states.len();
        if len >= 2
            && matches!(self.states[len - 1], DecoderState::Inline { field: None })
            && matches!(self.states[len - 2], DecoderState::Nullable)
        {
            cold_path();
            return Err(Error::ambiguous(
                "An optional newtype without an inline wrapper can not hold an optional value, since both nulls would decode the same; enable use_inline_wrappers for it",
            ));
        }
        Ok(())
    }

    fn map_entries(&self, value: &O::Value, what: &str) -> Result<Vec<(O::Value, O::Value)>> {
        self.config.ops.get_map(value).map_err(|_| {
            cold_path();
            Error::malformed(format!("Expected a map for {what}, got {value:?}"))
        })
    }

    /// Resolves a unit variant from its index or name.
    fn unit_variant_index(
        &self,
        name: &str,
        value: &O::Value,
        options: ElementOptions<'o>,
        variants: &[&str],
    ) -> Result<usize> {
        let enum_options = &self.config.options.enum_options;
        let by_index = || self.variant_by_index(value, options, variants.len());
        let variant_list = join_quoted(&variants.iter().map(|v| v.to_string()).collect::<Vec<_>>());

        if enum_options.lenient_decoding {
            if let Some(index) = by_index() {
                return Ok(index);
            }
            if let Some(index) = self.variant_by_name(value, variants, true)? {
                return Ok(index);
            }
            cold_path();
            return Err(Error::malformed(format!(
                "Enum '{name}' cannot be decoded from {value:?}, must be an index between 0 and {} or one of {variant_list} (case-insensitive)",
                variants.len().saturating_sub(1)
            )));
        }

        match enum_options.encoding {
            EnumEncoding::Index => by_index().ok_or_else(|| {
                cold_path();
                Error::malformed(format!(
                    "Enum '{name}' cannot be decoded from {value:?}, must be an index between 0 and {}",
                    variants.len().saturating_sub(1)
                ))
            }),
            EnumEncoding::SerialName { case_insensitive } => {
                self.variant_by_name(value, variants, case_insensitive)?
                    .ok_or_else(|| {
                        cold_path();
                        Error::malformed(format!(
                            "Enum '{name}' cannot be decoded from {value:?}, must be one of {variant_list} {}",
                            if case_insensitive {
                                "(case-insensitive)"
                            } else {
                                "(case-sensitive)"
                            }
                        ))
                    })
            }
        }
    }

    fn variant_by_index(
        &self,
        value: &O::Value,
        options: ElementOptions<'o>,
        count: usize,
    ) -> Option<usize> {
        let ops = self.config.ops;
        let index = match ops.get_number_value(value) {
            Ok(number) => number.as_i64()?,
            Err(_) if self.strings_allowed(options) => {
                ops.get_string_value(value).ok()?.trim().parse::<i64>().ok()?
            }
            Err(_) => return None,
        };
        usize::try_from(index).ok().filter(|index| *index < count)
    }

    fn variant_by_name(
        &self,
        value: &O::Value,
        variants: &[&str],
        case_insensitive: bool,
    ) -> Result<Option<usize>> {
        let Ok(input) = self.config.ops.get_string_value(value) else {
            return Ok(None);
        };
        let matches: Vec<usize> = variants
            .iter()
            .enumerate()
            .filter(|(_, variant)| {
                if case_insensitive {
                    variant.eq_ignore_ascii_case(&input)
                } else {
                    **variant == input
                }
            })
            .map(|(index, _)| index)
            .collect();
        if matches.len() > 1 {
            cold_path();
            let names = matches
                .iter()
                .map(|index| variants[*index].to_owned())
                .collect::<Vec<_>>();
            return Err(Error::malformed(format!(
                "Multiple enum values match input '{input}': {}{}",
                join_quoted(&names),
                if case_insensitive {
                    " (case-insensitive mode is on)"
                } else {
                    ""
                }
            )));
        }
        Ok(matches.first().copied())
    }

    fn visit_struct<'de, V: de::Visitor<'de>>(
        &mut self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let (value, options) = self.element()?;
        validate::check_reserved_field(name, fields, options.reserved_key)?;
        let entries = self.map_entries(&value, &format!("struct '{name}'"))?;
        self.states.push(DecoderState::class(name, fields, entries));
        let result = visitor.visit_map(ClassAccess { de: &mut *self })?;
        self.pop_state()?;
        Ok(result)
    }

    fn visit_list<'de, V: de::Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        let (value, _) = self.element()?;
        let items = self.config.ops.get_list(&value).map_err(|_| {
            cold_path();
            Error::malformed(format!("Expected a list, got {value:?}"))
        })?;
        self.states.push(DecoderState::list(items));
        let result = visitor.visit_seq(ListAccess { de: &mut *self })?;
        self.pop_state()?;
        Ok(result)
    }

    fn visit_regular_map<'de, V: de::Visitor<'de>>(
        &mut self,
        entries: Vec<(O::Value, O::Value)>,
        regular: bool,
        visitor: V,
    ) -> Result<V::Value> {
        self.states.push(DecoderState::map(regular, entries));
        let result = visitor.visit_map(EntryAccess { de: &mut *self })?;
        self.pop_state()?;
        Ok(result)
    }

    fn visit_object<'de, V: de::Visitor<'de>>(&mut self, visitor: V) -> Result<V::Value> {
        let (value, _) = self.element()?;
        let entries = self.map_entries(&value, "an object")?;
        let unknown = collect_invalid_keys(&self.config, &entries, &[]);
        self.states.push(DecoderState::Object { unknown });
        self.pop_state()?;
        visitor.visit_unit()
    }
}

impl<'de, 'a, 'o, O: DynamicOps> de::Deserializer<'de> for &'a mut DynamicDecoder<'o, O> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let (value, options) = self.element()?;
        let ops = self.config.ops;
        let extended = &self.config.extended;
        if extended.supports_null() && !extended.is_not_null(&value)? {
            return visitor.visit_unit();
        }
        if let Ok(entries) = ops.get_map(&value) {
            return self.visit_regular_map(entries, true, visitor);
        }
        if ops.get_list(&value).is_ok() {
            self.current = Some((value, options));
            return self.visit_list(visitor);
        }
        if let Ok(s) = ops.get_string_value(&value) {
            return visitor.visit_string(s.into_owned());
        }
        if let Ok(number) = ops.get_number_value(&value) {
            return match number {
                Number::Byte(v) => visitor.visit_i8(v),
                Number::Short(v) => visitor.visit_i16(v),
                Number::Int(v) => visitor.visit_i32(v),
                Number::Long(v) => visitor.visit_i64(v),
                Number::Float(v) => visitor.visit_f32(v),
                Number::Double(v) => visitor.visit_f64(v),
            };
        }
        if let Ok(b) = ops.get_boolean_value(&value) {
            return visitor.visit_bool(b);
        }
        cold_path();
        Err(Error::malformed(format!(
            "Can not decode {value:?} without a type"
        )))
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_bool(self.boolean()?)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i8(self.integer("i8")?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i16(self.integer("i16")?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i32(self.integer("i32")?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i64(self.integer("i64")?)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i128(self.integer::<i64>("i128")? as i128)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u8(self.integer("u8")?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u16(self.integer("u16")?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u32(self.integer("u32")?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u64(self.integer("u64")?)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u128(self.integer::<u64>("u128")? as u128)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(self.number()?.as_f32())
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(self.number()?.as_f64())
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let s = self.string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => {
                cold_path();
                Err(Error::malformed(format!(
                    "Expected a single character, got '{s}'"
                )))
            }
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.string()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.string()?)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let (value, _) = self.element()?;
        visitor.visit_byte_buf(self.config.ops.get_byte_buffer(&value)?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.check_nullable_inline()?;
        let (value, options) = self.element()?;
        if !self.config.extended.is_not_null(&value)? {
            return visitor.visit_none();
        }
        let inner = self.config.extended.unwrap_nullable(value)?;
        self.states.push(DecoderState::Nullable);
        self.current = Some((inner, options));
        let result = visitor.visit_some(&mut *self)?;
        self.pop_state()?;
        Ok(result)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_object(visitor)
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_object(visitor)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let (value, options) = self.element()?;
        let config = &self.config;
        let as_key = options.is_map_key && config.map_keys() != ElementSupport::Any;
        if as_key || !config.options.use_inline_wrapper_for(name) {
            self.states.push(DecoderState::Inline { field: None });
            self.current = Some((value, options));
        } else {
            let field = config.options.inline_field_for(name);
            let entries = self.map_entries(&value, &format!("inline wrapper '{name}'"))?;
            let key = config.inline_key(field);
            let inner = entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());
            let inner = match inner {
                Some(inner) => inner,
                None if !config.options.explicit_nulls => config.extended.create_null()?,
                None => {
                    cold_path();
                    return Err(Error::malformed(format!(
                        "Wrapped inline class '{name}' must be a map containing a field '{field}', was {value:?}"
                    )));
                }
            };
            let unknown = entries
                .iter()
                .filter(|(k, _)| *k != key)
                .map(|(k, _)| config.describe(k))
                .collect::<Vec<_>>();
            validate::check_unknown_keys(config, &unknown, &format!(" in inline wrapper '{name}'"))?;
            let inner_options = ElementOptions {
                use_entry_list_map: config.options.use_entry_list_for(name, field),
                ..ElementOptions::default()
            };
            self.states.push(DecoderState::Inline { field: Some(field) });
            self.current = Some((inner, inner_options));
        }
        let result = visitor.visit_newtype_struct(&mut *self)?;
        self.pop_state()?;
        Ok(result)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_list(visitor)
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_list(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_list(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let (value, options) = self.element()?;
        if options.use_entry_list_map || self.config.options.use_entry_list_maps {
            let entries = validate::entry_list(&self.config, &value)?;
            self.visit_regular_map(entries, false, visitor)
        } else {
            let entries = self.map_entries(&value, "a map")?;
            self.visit_regular_map(entries, true, visitor)
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_struct(name, fields, visitor)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let (value, options) = self.element()?;
        let ops = self.config.ops;
        let Ok(entries) = ops.get_map(&value) else {
            let index = self.unit_variant_index(name, &value, options, variants)?;
            return visitor.visit_enum(UnitVariantAccess {
                index: index as u32,
            });
        };

        let discriminator = self.config.options.discriminator_for(name);
        let flatten = self.config.options.flatten_for(name);
        let Some(serial_name) = map_get(ops, &entries, discriminator) else {
            cold_path();
            return Err(Error::malformed(format!(
                "Required type discriminator field '{discriminator}' is missing"
            )));
        };
        let serial_name = ops.get_string_value(serial_name)?.into_owned();

        let payload = if flatten {
            let rest = entries
                .iter()
                .filter(|(k, _)| {
                    ops.get_string_value(k)
                        .map_or(true, |k| k != discriminator)
                })
                .cloned()
                .collect();
            Some(ops.create_map(rest)?)
        } else {
            if entries.len() > 2 {
                let invalid = collect_invalid_keys(&self.config, &entries, &[discriminator, "value"]);
                cold_path();
                return Err(Error::malformed(format!(
                    "Unknown fields found in polymorphic state: {}",
                    join_quoted(&invalid)
                )));
            }
            map_get(ops, &entries, "value").cloned()
        };

        self.states.push(DecoderState::Polymorphic {
            payload,
            parent: options,
            reserved_key: flatten.then_some(discriminator),
        });
        visitor.visit_enum(PolymorphicAccess {
            de: self,
            name,
            serial_name,
        })
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.element()?;
        visitor.visit_unit()
    }
}

struct ListAccess<'a, 'o, O: DynamicOps> {
    de: &'a mut DynamicDecoder<'o, O>,
}

impl<'de, 'a, 'o, O: DynamicOps> SeqAccess<'de> for ListAccess<'a, 'o, O> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(item) = self.de.top()?.next_item()? else {
            return Ok(None);
        };
        let options = ElementOptions {
            use_entry_list_map: self.de.config.options.use_entry_list_maps,
            ..ElementOptions::default()
        };
        self.de.current = Some((item, options));
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        self.de.states.last().and_then(DecoderState::remaining)
    }
}

struct ClassAccess<'a, 'o, O: DynamicOps> {
    de: &'a mut DynamicDecoder<'o, O>,
}

impl<'de, 'a, 'o, O: DynamicOps> MapAccess<'de> for ClassAccess<'a, 'o, O> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let de = &mut *self.de;
        let state = de.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Decoder has no active state")
        })?;
        let Some((field, value, options)) = state.next_field(&de.config)? else {
            return Ok(None);
        };
        de.current = Some((value, options));
        let field: StrDeserializer<'_, Error> = field.into_deserializer();
        seed.deserialize(field).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }
}

struct EntryAccess<'a, 'o, O: DynamicOps> {
    de: &'a mut DynamicDecoder<'o, O>,
}

impl<'de, 'a, 'o, O: DynamicOps> MapAccess<'de> for EntryAccess<'a, 'o, O> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let de = &mut *self.de;
        let state = de.states.last_mut().ok_or_else(|| {
            cold_path();
            Error::illegal_state("Decoder has no active state")
        })?;
        let Some((key, options)) = state.next_key(&de.config)? else {
            return Ok(None);
        };
        de.current = Some((key, options));
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self.de.top()?.next_value()?;
        let options = ElementOptions {
            use_entry_list_map: self.de.config.options.use_entry_list_maps,
            ..ElementOptions::default()
        };
        self.de.current = Some((value, options));
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        self.de.states.last().and_then(DecoderState::remaining)
    }
}

struct UnitVariantAccess {
    index: u32,
}

impl<'de> EnumAccess<'de> for UnitVariantAccess {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let index: U32Deserializer<Error> = self.index.into_deserializer();
        let variant = seed.deserialize(index)?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for UnitVariantAccess {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, _seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        Err(Error::malformed(
            "Expected a map with a type discriminator for a newtype variant",
        ))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::malformed(
            "Expected a map with a type discriminator for a tuple variant",
        ))
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::malformed(
            "Expected a map with a type discriminator for a struct variant",
        ))
    }
}

struct PolymorphicAccess<'a, 'o, O: DynamicOps> {
    de: &'a mut DynamicDecoder<'o, O>,
    name: &'static str,
    serial_name: String,
}

impl<'de, 'a, 'o, O: DynamicOps> EnumAccess<'de> for PolymorphicAccess<'a, 'o, O> {
    type Error = Error;
    type Variant = VariantPayloadAccess<'a, 'o, O>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let serial_name: StrDeserializer<'_, Error> = self.serial_name.as_str().into_deserializer();
        let variant = seed.deserialize(serial_name)?;
        Ok((
            variant,
            VariantPayloadAccess {
                de: self.de,
                name: self.name,
            },
        ))
    }
}

struct VariantPayloadAccess<'a, 'o, O: DynamicOps> {
    de: &'a mut DynamicDecoder<'o, O>,
    name: &'static str,
}

impl<'a, 'o, O: DynamicOps> VariantPayloadAccess<'a, 'o, O> {
    fn select_payload(&mut self) -> Result<()> {
        let payload = self.de.top()?.take_payload()?;
        self.de.current = Some(payload);
        Ok(())
    }
}

impl<'de, 'a, 'o, O: DynamicOps> VariantAccess<'de> for VariantPayloadAccess<'a, 'o, O> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        self.de.pop_state()
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        self.select_payload()?;
        let value = seed.deserialize(&mut *self.de)?;
        self.de.pop_state()?;
        Ok(value)
    }

    fn tuple_variant<V>(mut self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.select_payload()?;
        let value = self.de.visit_list(visitor)?;
        self.de.pop_state()?;
        Ok(value)
    }

    fn struct_variant<V>(mut self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.select_payload()?;
        let value = self.de.visit_struct(self.name, fields, visitor)?;
        self.de.pop_state()?;
        Ok(value)
    }
}
