//! Configuration consumed by codecs created through
//! [`CodecFactory`](crate::CodecFactory).
//!
//! [`CodecOptions`] is itself serializable with `#[serde(default)]`, so a
//! partial configuration file fills in the remaining fields from
//! [`CodecOptions::default`]:
//!
//! ```
//! use na_codec::{Codec, CodecFactory, CodecOptions, JsonOps};
//! use serde_json::json;
//!
//! let codec = CodecFactory::default().create::<CodecOptions>();
//! let options = codec
//!     .parse(&JsonOps, &json!({"explicit_nulls": true}))
//!     .unwrap();
//! assert!(options.explicit_nulls);
//! assert_eq!(options.polymorphism.class_discriminator, "type");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

mod builder;

pub use builder::*;

/// Wrapper key used by inline wrappers when no annotation overrides it.
pub const DEFAULT_INLINE_FIELD: &str = "value";

/// Discriminator key used when `use_class_property_indices` is set.
pub const INDEXED_DISCRIMINATOR: &str = "-1";

/// Options used to encode and decode codecs.
///
/// See [`CodecOptionsBuilder`] for a description of each option.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    #[serde(rename = "enum")]
    pub enum_options: EnumOptions,
    pub polymorphism: PolymorphismOptions,
    /// Per-type overrides, keyed by the serde name of the type.
    pub annotations: BTreeMap<String, TypeAnnotation>,
    pub explicit_nulls: bool,
    pub use_inline_wrappers: bool,
    pub use_entry_list_maps: bool,
    pub ignore_unknown_keys: bool,
    pub allow_string_values: bool,
    pub use_class_property_indices: bool,
    pub print_error_stack_traces: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            enum_options: EnumOptions::default(),
            polymorphism: PolymorphismOptions::default(),
            annotations: BTreeMap::new(),
            explicit_nulls: false,
            use_inline_wrappers: false,
            use_entry_list_maps: false,
            ignore_unknown_keys: false,
            allow_string_values: false,
            use_class_property_indices: false,
            print_error_stack_traces: false,
        }
    }
}

impl CodecOptions {
    pub fn builder() -> CodecOptionsBuilder {
        CodecOptionsBuilder::default()
    }

    pub fn annotation(&self, type_name: &str) -> Option<&TypeAnnotation> {
        self.annotations.get(type_name)
    }

    /// Whether the newtype `type_name` is encoded as a single-field map.
    pub fn use_inline_wrapper_for(&self, type_name: &str) -> bool {
        self.annotation(type_name)
            .and_then(|a| a.use_inline_wrapper)
            .unwrap_or(self.use_inline_wrappers)
    }

    /// The wrapper key of the newtype `type_name`.
    pub fn inline_field_for(&self, type_name: &str) -> &str {
        if self.use_class_property_indices {
            return "0";
        }
        self.annotation(type_name)
            .and_then(|a| a.inline_field.as_deref())
            .unwrap_or(DEFAULT_INLINE_FIELD)
    }

    /// The discriminator key used for variants of the enum `type_name`.
    pub fn discriminator_for(&self, type_name: &str) -> &str {
        if self.use_class_property_indices {
            return INDEXED_DISCRIMINATOR;
        }
        self.annotation(type_name)
            .and_then(|a| a.class_discriminator.as_deref())
            .unwrap_or(&self.polymorphism.class_discriminator)
    }

    pub fn flatten_for(&self, type_name: &str) -> bool {
        self.annotation(type_name)
            .and_then(|a| a.flatten)
            .unwrap_or(self.polymorphism.flatten)
    }

    /// Whether the map stored in `field` of `type_name` uses the entry-list
    /// layout. A per-field annotation wins over the global option.
    pub fn use_entry_list_for(&self, type_name: &str, field: &str) -> bool {
        self.annotation(type_name)
            .is_some_and(|a| a.entry_list_fields.contains(field))
            || self.use_entry_list_maps
    }
}

/// Options used to encode and decode unit enum variants.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumOptions {
    pub encoding: EnumEncoding,
    /// Accept every representation on decode, not just `encoding`.
    pub lenient_decoding: bool,
}

impl Default for EnumOptions {
    fn default() -> Self {
        Self {
            encoding: EnumEncoding::SerialName {
                case_insensitive: false,
            },
            lenient_decoding: true,
        }
    }
}

/// How a unit enum variant is represented.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum EnumEncoding {
    /// The variant index, e.g. `1` for `B` in `enum Example { A, B }`.
    Index,
    /// The variant name, e.g. `"B"`.
    ///
    /// With `case_insensitive` the name is written in lower case and matched
    /// regardless of case; decoding fails if more than one variant matches.
    SerialName { case_insensitive: bool },
}

/// Options used to encode and decode data-carrying enum variants.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PolymorphismOptions {
    /// Key holding the variant name.
    pub class_discriminator: String,
    /// Merge the variant's fields into the map holding the discriminator
    /// instead of nesting them under `"value"`.
    pub flatten: bool,
}

impl Default for PolymorphismOptions {
    fn default() -> Self {
        Self {
            class_discriminator: "type".to_owned(),
            flatten: false,
        }
    }
}

/// Overrides for a single type, registered under its serde name.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeAnnotation {
    pub use_inline_wrapper: Option<bool>,
    pub inline_field: Option<String>,
    pub class_discriminator: Option<String>,
    pub flatten: Option<bool>,
    /// Fields whose maps use the entry-list layout.
    pub entry_list_fields: BTreeSet<String>,
}
