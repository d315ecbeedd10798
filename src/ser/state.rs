use tracing::warn;

use crate::{
    DynamicOps, Error, ExtendedDynamicOps, Result, cold_path,
    state::{ElementOptions, SerializationConfig},
};

/// Map layout chosen when a map state is created.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum MapLayout {
    /// A native map; keys and values alternate.
    Regular,
    /// A list of `{"key": k, "value": v}` maps.
    EntryList,
}

/// One level of the encoder stack.
///
/// Every state collects the elements of one structure and turns them into
/// a single value in [`build`](EncoderState::build).
#[derive(Debug)]
pub(crate) enum EncoderState<'o, V> {
    /// The bottom of the stack; holds the final value.
    Root { value: Option<V> },
    /// An `Option` that is present.
    Nullable {
        child: Option<V>,
        parent: ElementOptions<'o>,
    },
    /// A newtype struct, optionally wrapped as `{field: child}`.
    Inline {
        type_name: &'static str,
        field: Option<&'o str>,
        child: Option<V>,
        expect_nullable: bool,
        parent: ElementOptions<'o>,
    },
    /// A unit or unit struct; encodes as an empty map.
    Object,
    /// A struct, or the fields of a struct variant.
    Class {
        type_name: &'static str,
        index: usize,
        field: Option<&'static str>,
        key: Option<V>,
        entries: Vec<(V, V)>,
        expect_nullable: bool,
        reserved_key: Option<&'o str>,
    },
    /// A data-carrying enum variant: discriminator, then payload.
    Polymorphic {
        discriminator: &'o str,
        flatten: bool,
        serial_name: Option<V>,
        value: Option<V>,
        added: usize,
        parent: ElementOptions<'o>,
    },
    List {
        items: Vec<V>,
        current: Option<usize>,
    },
    Map {
        layout: MapLayout,
        key: Option<V>,
        entries: Vec<(V, V)>,
    },
}

impl<'o, V: Clone + std::fmt::Debug + PartialEq> EncoderState<'o, V> {
    pub fn root() -> Self {
        Self::Root { value: None }
    }

    pub fn class(type_name: &'static str, reserved_key: Option<&'o str>) -> Self {
        Self::Class {
            type_name,
            index: 0,
            field: None,
            key: None,
            entries: Vec::new(),
            expect_nullable: false,
            reserved_key,
        }
    }

    pub fn list() -> Self {
        Self::List {
            items: Vec::new(),
            current: None,
        }
    }

    pub fn map(layout: MapLayout) -> Self {
        Self::Map {
            layout,
            key: None,
            entries: Vec::new(),
        }
    }

    /// A short name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root { .. } => "root",
            Self::Nullable { .. } => "nullable",
            Self::Inline { .. } => "inline",
            Self::Object => "object",
            Self::Class { .. } => "class",
            Self::Polymorphic { .. } => "polymorphic",
            Self::List { .. } => "list",
            Self::Map { .. } => "map",
        }
    }

    /// Prepares a struct field. Fails if the field collides with the
    /// discriminator of a flattened parent.
    pub fn begin_field<O>(
        &mut self,
        config: &SerializationConfig<'o, O>,
        name: &'static str,
    ) -> Result<()>
    where
        O: DynamicOps<Value = V>,
    {
        let kind = self.kind();
        let Self::Class {
            type_name,
            index,
            field,
            key,
            expect_nullable,
            reserved_key,
            ..
        } = self
        else {
            cold_path();
            return Err(Error::illegal_state(format!(
                "Struct field '{name}' written to a {kind} encoder"
            )));
        };
        check_reserved(*reserved_key, type_name, name)?;
        *key = Some(config.field_key(*index, name));
        *field = Some(name);
        *index += 1;
        *expect_nullable = false;
        Ok(())
    }

    /// Accounts for a field that `skip_serializing_if` left out. Skipped
    /// fields are checked against the flattened discriminator as well.
    pub fn skip_field(&mut self, name: &'static str) -> Result<()> {
        if let Self::Class {
            type_name,
            index,
            reserved_key,
            ..
        } = self
        {
            check_reserved(*reserved_key, type_name, name)?;
            *index += 1;
        }
        Ok(())
    }

    pub fn begin_list_element(&mut self) {
        if let Self::List { items, current } = self {
            *current = Some(items.len());
        }
    }

    /// Checks that a map receives a key next (`is_key`) or a value next.
    pub fn begin_map_element(&mut self, is_key: bool) -> Result<()> {
        match self {
            Self::Map { key, .. } if is_key == key.is_none() => Ok(()),
            Self::Map { .. } => {
                cold_path();
                Err(Error::illegal_state(format!(
                    "Map encoder receiving elements in the wrong order ({} while {})",
                    if is_key { "key" } else { "value" },
                    if is_key {
                        "a key element is already present"
                    } else {
                        "no key element is present"
                    }
                )))
            }
            other => {
                cold_path();
                Err(Error::illegal_state(format!(
                    "Map entry written to a {} encoder",
                    other.kind()
                )))
            }
        }
    }

    /// Records that the current element was announced as optional.
    pub fn mark_nullable(&mut self) {
        match self {
            Self::Class {
                expect_nullable, ..
            }
            | Self::Inline {
                expect_nullable, ..
            } => *expect_nullable = true,
            _ => {}
        }
    }

    /// Options for the child element about to be encoded.
    pub fn element_options<O>(&self, config: &SerializationConfig<'o, O>) -> ElementOptions<'o>
    where
        O: DynamicOps<Value = V>,
    {
        match self {
            Self::Nullable { parent, .. } => *parent,
            Self::Inline {
                field: None,
                parent,
                ..
            } => *parent,
            Self::Inline {
                type_name,
                field: Some(field),
                ..
            } => ElementOptions {
                use_entry_list_map: config.options.use_entry_list_for(type_name, field),
                ..ElementOptions::default()
            },
            Self::Class {
                type_name,
                field: Some(field),
                ..
            } => ElementOptions {
                use_entry_list_map: config.options.use_entry_list_for(type_name, field),
                ..ElementOptions::default()
            },
            Self::Polymorphic {
                discriminator,
                flatten,
                added: 1,
                parent,
                ..
            } => {
                if *flatten {
                    ElementOptions {
                        reserved_key: Some(*discriminator),
                        ..*parent
                    }
                } else {
                    ElementOptions {
                        is_map_key: false,
                        reserved_key: None,
                        ..*parent
                    }
                }
            }
            Self::Map {
                layout: MapLayout::Regular,
                key: None,
                ..
            } => ElementOptions {
                is_map_key: true,
                ..ElementOptions::default()
            },
            _ => ElementOptions {
                use_entry_list_map: config.options.use_entry_list_maps,
                ..ElementOptions::default()
            },
        }
    }

    pub fn add_element<O>(&mut self, config: &SerializationConfig<'o, O>, element: V) -> Result<()>
    where
        O: DynamicOps<Value = V>,
    {
        match self {
            Self::Root { value: slot }
            | Self::Nullable { child: slot, .. }
            | Self::Inline { child: slot, .. } => {
                if slot.is_some() {
                    cold_path();
                    return Err(Error::illegal_state(
                        "Single-value encoder received more than one element",
                    ));
                }
                *slot = Some(element);
            }
            Self::Object => {
                cold_path();
                return Err(Error::illegal_state(
                    "Object encoders must not contain elements",
                ));
            }
            Self::Class {
                key,
                entries,
                expect_nullable,
                ..
            } => {
                let Some(key) = key.take() else {
                    cold_path();
                    return Err(Error::illegal_state(format!(
                        "No key set for element {element:?}"
                    )));
                };
                if std::mem::take(expect_nullable)
                    && !config.options.explicit_nulls
                    && !probe_not_null(config, &element)
                {
                    return Ok(());
                }
                entries.push((key, element));
            }
            Self::Polymorphic {
                serial_name,
                value,
                added,
                ..
            } => {
                match added {
                    0 => *serial_name = Some(element),
                    1 => *value = Some(element),
                    _ => {
                        cold_path();
                        return Err(Error::illegal_state(
                            "Polymorphic encoders must contain only two elements, type and value",
                        ));
                    }
                }
                *added += 1;
            }
            Self::List { items, current } => {
                items.push(element);
                *current = None;
            }
            Self::Map { key, entries, .. } => match key.take() {
                None => *key = Some(element),
                Some(key) => entries.push((key, element)),
            },
        }
        Ok(())
    }

    pub fn build<O>(self, config: &SerializationConfig<'o, O>) -> Result<V>
    where
        O: DynamicOps<Value = V>,
    {
        let ops = config.ops;
        match self {
            Self::Root { value } => value.ok_or_else(|| {
                Error::illegal_state("Root encoder finished without receiving a value")
            }),
            Self::Nullable { child, .. } => {
                let child = child.ok_or_else(|| {
                    Error::illegal_state("Nullable encoder finished without a value")
                })?;
                config.extended.wrap_nullable(child)
            }
            Self::Inline {
                field,
                child,
                expect_nullable,
                ..
            } => {
                let child = child.ok_or_else(|| {
                    Error::illegal_state("Inline encoder finished without a value")
                })?;
                match field {
                    None => Ok(child),
                    Some(_)
                        if expect_nullable
                            && !config.options.explicit_nulls
                            && !probe_not_null(config, &child) =>
                    {
                        ops.create_map(Vec::new())
                    }
                    Some(field) => ops.create_map(vec![(config.inline_key(field), child)]),
                }
            }
            Self::Object => ops.create_map(Vec::new()),
            Self::Class { entries, .. } => ops.create_map(entries),
            Self::Polymorphic {
                discriminator,
                flatten,
                serial_name,
                value,
                ..
            } => {
                let (Some(serial_name), Some(value)) = (serial_name, value) else {
                    cold_path();
                    return Err(Error::illegal_state(
                        "Polymorphic encoder requires both a type and a value",
                    ));
                };
                let discriminator = ops.create_string(discriminator);
                if flatten {
                    let fields = ops.get_map(&value).map_err(|_| {
                        Error::unsupported(format!(
                            "Primitive and list polymorphic elements not supported in flattened encoding (got {value:?})"
                        ))
                    })?;
                    if fields.iter().any(|(key, _)| *key == discriminator) {
                        cold_path();
                        return Err(Error::ambiguous(format!(
                            "Variant '{}' has a payload key equal to the class discriminator '{}'; change the discriminator or disable flattening",
                            config.describe(&serial_name),
                            config.describe(&discriminator)
                        )));
                    }
                    let mut entries = Vec::with_capacity(fields.len() + 1);
                    entries.push((discriminator, serial_name));
                    entries.extend(fields);
                    ops.create_map(entries)
                } else {
                    ops.create_map(vec![
                        (discriminator, serial_name),
                        (ops.create_string("value"), value),
                    ])
                }
            }
            Self::List { items, .. } => ops.create_list(items),
            Self::Map {
                layout,
                key,
                entries,
            } => {
                if let Some(key) = key {
                    cold_path();
                    return Err(Error::illegal_state(format!(
                        "Odd number of elements added to map, final key has no value: {}",
                        config.describe(&key)
                    )));
                }
                match layout {
                    MapLayout::Regular => ops.create_map(entries),
                    MapLayout::EntryList => {
                        let entries = entries
                            .into_iter()
                            .map(|(k, v)| {
                                ops.create_map(vec![
                                    (ops.create_string("key"), k),
                                    (ops.create_string("value"), v),
                                ])
                            })
                            .collect::<Result<Vec<_>>>()?;
                        ops.create_list(entries)
                    }
                }
            }
        }
    }

    /// This state's contribution to the error trace, if any.
    pub fn element_trace<O>(&self, config: &SerializationConfig<'o, O>) -> Option<String>
    where
        O: DynamicOps<Value = V>,
    {
        match self {
            Self::Class { key: Some(key), .. } => Some(format!(".{}", config.describe(key))),
            Self::Inline {
                field: Some(field),
                ..
            } => Some(format!(".{field}")),
            Self::List {
                current: Some(index),
                ..
            } => Some(format!("[{index}]")),
            Self::Map { key: Some(key), .. } => Some(format!("[{}]", config.describe(key))),
            _ => None,
        }
    }
}

fn check_reserved(reserved_key: Option<&str>, type_name: &str, name: &str) -> Result<()> {
    if reserved_key == Some(name) {
        cold_path();
        return Err(Error::ambiguous(format!(
            "Field '{name}' of '{type_name}' conflicts with the class discriminator of its flattened enum; change the discriminator or disable flattening"
        )));
    }
    Ok(())
}

/// The null probe, treating a failed probe as "not null".
fn probe_not_null<O: DynamicOps>(config: &SerializationConfig<'_, O>, value: &O::Value) -> bool {
    match config.extended.is_not_null(value) {
        Ok(not_null) => not_null,
        Err(error) => {
            warn!(%error, "null probe failed, keeping the value");
            true
        }
    }
}
