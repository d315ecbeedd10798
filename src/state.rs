use crate::{
    CodecOptions, DefaultingExtendedOps, DynamicOps, ElementSupport, ExtendedDynamicOps,
};

/// How the element about to be encoded or decoded is used by its parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub(crate) struct ElementOptions<'o> {
    /// The element is the key of a regular map.
    pub is_map_key: bool,
    /// A map at this position uses the entry-list layout.
    pub use_entry_list_map: bool,
    /// A struct at this position must not have a field with this name.
    pub reserved_key: Option<&'o str>,
}

/// Everything encoder and decoder states need besides their own data.
pub(crate) struct SerializationConfig<'o, O: DynamicOps> {
    pub ops: &'o O,
    pub extended: DefaultingExtendedOps<'o, O>,
    pub options: &'o CodecOptions,
}

impl<'o, O: DynamicOps> SerializationConfig<'o, O> {
    pub fn new(ops: &'o O, options: &'o CodecOptions) -> Self {
        Self {
            ops,
            extended: DefaultingExtendedOps::new(ops),
            options,
        }
    }

    pub fn map_keys(&self) -> ElementSupport {
        self.extended.supported_map_keys()
    }

    /// The key a struct field is stored under.
    pub fn field_key(&self, index: usize, name: &str) -> O::Value {
        if !self.options.use_class_property_indices {
            self.ops.create_string(name)
        } else if self.map_keys() == ElementSupport::Strings {
            self.ops.create_string(&index.to_string())
        } else {
            self.ops.create_int(index as i32)
        }
    }

    /// The key the wrapped value of an inline wrapper is stored under.
    pub fn inline_key(&self, field: &str) -> O::Value {
        if self.options.use_class_property_indices && self.map_keys() != ElementSupport::Strings {
            self.ops.create_int(0)
        } else {
            self.ops.create_string(field)
        }
    }

    /// Renders a key for traces and error messages.
    pub fn describe(&self, value: &O::Value) -> String {
        crate::get_primitive_as_string(self.ops, value).unwrap_or_else(|| format!("{value:?}"))
    }
}
