use crate::{CodecOptions, EnumEncoding, TypeAnnotation};

/// Builder used to create [`CodecOptions`].
///
/// ```
/// use na_codec::{CodecOptions, EnumEncoding};
///
/// let options = CodecOptions::builder()
///     .enum_encoding(EnumEncoding::Index)
///     .explicit_nulls(true)
///     .annotate("Settings", |a| {
///         a.entry_list_fields.insert("bindings".into());
///     })
///     .build();
///
/// assert!(options.use_entry_list_for("Settings", "bindings"));
/// assert!(!options.use_entry_list_for("Settings", "other"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CodecOptionsBuilder {
    options: CodecOptions,
}

impl From<CodecOptions> for CodecOptionsBuilder {
    fn from(base: CodecOptions) -> Self {
        Self { options: base }
    }
}

impl CodecOptionsBuilder {
    /// How unit enum variants are represented.
    pub fn enum_encoding(mut self, encoding: EnumEncoding) -> Self {
        self.options.enum_options.encoding = encoding;
        self
    }

    /// If set, any representation of a unit variant is accepted when
    /// decoding. Otherwise only the selected encoding is.
    pub fn lenient_enum_decoding(mut self, lenient: bool) -> Self {
        self.options.enum_options.lenient_decoding = lenient;
        self
    }

    /// Key storing the variant name of a data-carrying enum variant,
    /// `"type"` by default.
    pub fn class_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.options.polymorphism.class_discriminator = discriminator.into();
        self
    }

    /// If set, a variant's fields share the map with the discriminator. The
    /// variant payload must then encode as a map, and none of its fields may
    /// be named like the discriminator.
    pub fn flatten_polymorphism(mut self, flatten: bool) -> Self {
        self.options.polymorphism.flatten = flatten;
        self
    }

    /// If set, `None` fields are written as null. Otherwise they are
    /// omitted.
    pub fn explicit_nulls(mut self, explicit: bool) -> Self {
        self.options.explicit_nulls = explicit;
        self
    }

    /// If set, newtype structs encode as `{"value": inner}` instead of as
    /// their inner value.
    pub fn use_inline_wrappers(mut self, wrap: bool) -> Self {
        self.options.use_inline_wrappers = wrap;
        self
    }

    /// If set, maps encode as lists of `{"key": k, "value": v}`.
    pub fn use_entry_list_maps(mut self, entry_lists: bool) -> Self {
        self.options.use_entry_list_maps = entry_lists;
        self
    }

    /// If set, unknown keys in structs and other map-like states are
    /// ignored instead of failing the decode.
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.options.ignore_unknown_keys = ignore;
        self
    }

    /// If set, numbers, booleans and enum indices may also be decoded from
    /// their string form, e.g. `{"a": "1"}` decodes into `a: i32`.
    pub fn allow_string_values(mut self, allow: bool) -> Self {
        self.options.allow_string_values = allow;
        self
    }

    /// If set, struct fields are keyed by their index instead of their name.
    pub fn use_class_property_indices(mut self, indices: bool) -> Self {
        self.options.use_class_property_indices = indices;
        self
    }

    /// If set, failure messages include the full error and a backtrace.
    pub fn print_error_stack_traces(mut self, print: bool) -> Self {
        self.options.print_error_stack_traces = print;
        self
    }

    /// Edits the [`TypeAnnotation`] registered for `type_name`, creating it if
    /// needed.
    pub fn annotate(
        mut self,
        type_name: impl Into<String>,
        config: impl FnOnce(&mut TypeAnnotation),
    ) -> Self {
        config(self.options.annotations.entry(type_name.into()).or_default());
        self
    }

    pub fn build(self) -> CodecOptions {
        self.options
    }
}
