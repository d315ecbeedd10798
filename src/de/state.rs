use crate::{
    DynamicOps, ElementSupport, Error, Result, cold_path,
    state::{ElementOptions, SerializationConfig},
    validate::check_unknown_keys,
};

/// One level of the decoder stack.
///
/// Structural states hand out their children one at a time; the decoder
/// pops a state once serde is done with it, after
/// [`on_complete`](DecoderState::on_complete) has validated what was left.
#[derive(Debug)]
pub(crate) enum DecoderState<'o, V> {
    Root,
    Nullable,
    Inline {
        field: Option<&'o str>,
    },
    Object {
        unknown: Vec<String>,
    },
    Class {
        type_name: &'static str,
        fields: &'static [&'static str],
        entries: std::vec::IntoIter<(V, V)>,
        current: Option<String>,
        unknown: Vec<String>,
    },
    Polymorphic {
        payload: Option<V>,
        parent: ElementOptions<'o>,
        reserved_key: Option<&'o str>,
    },
    List {
        items: std::vec::IntoIter<V>,
        index: Option<usize>,
    },
    Map {
        regular: bool,
        entries: std::vec::IntoIter<(V, V)>,
        key: Option<String>,
        value: Option<V>,
    },
}

impl<'o, V: Clone + std::fmt::Debug + PartialEq> DecoderState<'o, V> {
    pub fn class(
        type_name: &'static str,
        fields: &'static [&'static str],
        entries: Vec<(V, V)>,
    ) -> Self {
        Self::Class {
            type_name,
            fields,
            entries: entries.into_iter(),
            current: None,
            unknown: Vec::new(),
        }
    }

    pub fn list(items: Vec<V>) -> Self {
        Self::List {
            items: items.into_iter(),
            index: None,
        }
    }

    pub fn map(regular: bool, entries: Vec<(V, V)>) -> Self {
        Self::Map {
            regular,
            entries: entries.into_iter(),
            key: None,
            value: None,
        }
    }

    /// The next known struct field with its value, skipping and recording
    /// unknown keys.
    pub fn next_field<O>(
        &mut self,
        config: &SerializationConfig<'o, O>,
    ) -> Result<Option<(&'static str, V, ElementOptions<'o>)>>
    where
        O: DynamicOps<Value = V>,
    {
        let Self::Class {
            type_name,
            fields,
            entries,
            current,
            unknown,
        } = self
        else {
            cold_path();
            return Err(Error::illegal_state(
                "Attempted to decode a struct field outside of a struct",
            ));
        };
        for (key, value) in entries.by_ref() {
            let field = resolve_field(config, *fields, &key);
            let Some(field) = field else {
                unknown.push(config.describe(&key));
                continue;
            };
            *current = Some(config.describe(&key));
            let options = ElementOptions {
                use_entry_list_map: config.options.use_entry_list_for(type_name, field),
                ..ElementOptions::default()
            };
            return Ok(Some((field, value, options)));
        }
        *current = None;
        Ok(None)
    }

    pub fn next_item(&mut self) -> Result<Option<V>> {
        let Self::List { items, index } = self else {
            cold_path();
            return Err(Error::illegal_state(
                "Attempted to decode a list element outside of a list",
            ));
        };
        let item = items.next();
        if item.is_some() {
            *index = Some(index.map_or(0, |i| i + 1));
        }
        Ok(item)
    }

    pub fn remaining(&self) -> Option<usize> {
        match self {
            Self::List { items, .. } => Some(items.len()),
            Self::Map { entries, .. } => Some(entries.len()),
            _ => None,
        }
    }

    /// The next map key with the options to decode it, holding back its value.
    pub fn next_key<O>(
        &mut self,
        config: &SerializationConfig<'o, O>,
    ) -> Result<Option<(V, ElementOptions<'o>)>>
    where
        O: DynamicOps<Value = V>,
    {
        let Self::Map {
            regular,
            entries,
            key,
            value,
        } = self
        else {
            cold_path();
            return Err(Error::illegal_state(
                "Attempted to decode a map key outside of a map",
            ));
        };
        if value.is_some() {
            cold_path();
            return Err(Error::illegal_state(
                "Map decoder receiving elements in the wrong order (key while a value is pending)",
            ));
        }
        let Some((k, v)) = entries.next() else {
            *key = None;
            return Ok(None);
        };
        *key = Some(config.describe(&k));
        *value = Some(v);
        let options = ElementOptions {
            is_map_key: *regular,
            ..ElementOptions::default()
        };
        Ok(Some((k, options)))
    }

    pub fn next_value(&mut self) -> Result<V> {
        match self {
            Self::Map { value, .. } => value.take().ok_or_else(|| {
                cold_path();
                Error::illegal_state(
                    "Map decoder receiving elements in the wrong order (value without a key)",
                )
            }),
            _ => {
                cold_path();
                Err(Error::illegal_state(
                    "Attempted to decode a map value outside of a map",
                ))
            }
        }
    }

    /// Takes the payload of a data-carrying variant along with the options
    /// to decode it.
    pub fn take_payload(&mut self) -> Result<(V, ElementOptions<'o>)> {
        let Self::Polymorphic {
            payload,
            parent,
            reserved_key,
        } = self
        else {
            cold_path();
            return Err(Error::illegal_state(
                "Attempted to decode a variant payload outside of an enum",
            ));
        };
        let payload = payload.take().ok_or_else(|| {
            Error::malformed("Required field 'value' is missing")
        })?;
        let options = match reserved_key {
            Some(_) => ElementOptions {
                reserved_key: *reserved_key,
                ..*parent
            },
            None => ElementOptions {
                is_map_key: false,
                reserved_key: None,
                ..*parent
            },
        };
        Ok((payload, options))
    }

    /// Validates what is left once serde is done with this state.
    pub fn on_complete<O>(&self, config: &SerializationConfig<'o, O>) -> Result<()>
    where
        O: DynamicOps<Value = V>,
    {
        match self {
            Self::Class { unknown, .. } => check_unknown_keys(config, unknown, ""),
            Self::Object { unknown } => check_unknown_keys(config, unknown, " in object"),
            Self::List { items, .. } if items.len() > 0 => {
                cold_path();
                Err(Error::malformed(format!(
                    "List has {} more elements than expected",
                    items.len()
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn element_trace(&self) -> Option<String> {
        match self {
            Self::Class {
                current: Some(key), ..
            } => Some(format!(".{key}")),
            Self::Inline {
                field: Some(field),
            } => Some(format!(".{field}")),
            Self::List {
                index: Some(index), ..
            } => Some(format!("[{index}]")),
            Self::Map { key: Some(key), .. } => Some(format!("[{key}]")),
            _ => None,
        }
    }
}

/// Maps a struct key to one of `fields`, by name or by property index.
fn resolve_field<O: DynamicOps>(
    config: &SerializationConfig<'_, O>,
    fields: &'static [&'static str],
    key: &O::Value,
) -> Option<&'static str> {
    let ops = config.ops;
    if !config.options.use_class_property_indices {
        let name = ops.get_string_value(key).ok()?;
        return fields.iter().copied().find(|field| *field == name);
    }
    let index = if config.map_keys() == ElementSupport::Strings {
        ops.get_string_value(key).ok()?.parse::<usize>().ok()?
    } else {
        usize::try_from(ops.get_number_value(key).ok()?.as_i64()?).ok()?
    };
    fields.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecOptions, Dynamic, DynamicValueOps, ErrorKind};

    #[test]
    fn test_class_collects_unknown_keys() {
        let options = CodecOptions::default();
        let config = SerializationConfig::new(&DynamicValueOps, &options);
        let mut state = DecoderState::class(
            "Test",
            &["a"],
            vec![
                (Dynamic::from("b"), Dynamic::Int(1)),
                (Dynamic::from("a"), Dynamic::Int(2)),
            ],
        );
        let (field, value, _) = state.next_field(&config).unwrap().unwrap();
        assert_eq!((field, value), ("a", Dynamic::Int(2)));
        assert!(state.next_field(&config).unwrap().is_none());

        let err = state.on_complete(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        assert_eq!(err.to_string(), "Unknown fields found: 'b'");
    }

    #[test]
    fn test_class_ignores_unknown_keys_when_configured() {
        let options = CodecOptions::builder().ignore_unknown_keys(true).build();
        let config = SerializationConfig::new(&DynamicValueOps, &options);
        let mut state = DecoderState::class("Test", &[], vec![(Dynamic::from("b"), Dynamic::Int(1))]);
        assert!(state.next_field(&config).unwrap().is_none());
        state.on_complete(&config).unwrap();
    }

    #[test]
    fn test_class_property_indices() {
        let options = CodecOptions::builder().use_class_property_indices(true).build();
        let config = SerializationConfig::new(&DynamicValueOps, &options);
        let mut state = DecoderState::class(
            "Test",
            &["a", "b"],
            vec![(Dynamic::Int(1), Dynamic::Bool(true))],
        );
        let (field, _, _) = state.next_field(&config).unwrap().unwrap();
        assert_eq!(field, "b");
        assert_eq!(state.element_trace().as_deref(), Some(".1"));
    }

    #[test]
    fn test_map_value_without_key() {
        let mut state: DecoderState<'_, Dynamic> = DecoderState::map(true, vec![]);
        let err = state.next_value().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }
}
