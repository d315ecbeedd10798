use crate::{
    DynamicOps, ElementSupport, Error, ExtendedDynamicOps, Result, ops::map_get,
};

/// Key under which a non-null value is stored by the synthesized encoding.
pub const NULLABLE_VALUE_KEY: &str = "value";

/// [`ExtendedDynamicOps`] for any [`DynamicOps`], whether or not the format
/// declares extended capabilities.
///
/// Native null support always wins. Formats without it get a synthesized
/// encoding: null is an empty map and a present value `v` is the map
/// `{"value": v}`. Without an extended base the format is assumed to accept
/// only string map keys.
pub struct DefaultingExtendedOps<'o, O: DynamicOps> {
    ops: &'o O,
    base: Option<&'o dyn ExtendedDynamicOps<O::Value>>,
}

impl<'o, O: DynamicOps> DefaultingExtendedOps<'o, O> {
    pub fn new(ops: &'o O) -> Self {
        Self {
            ops,
            base: ops.extended(),
        }
    }

    fn native_null(&self) -> Option<&'o dyn ExtendedDynamicOps<O::Value>> {
        self.base.filter(|base| base.supports_null())
    }

    fn expect_map(&self, value: &O::Value) -> Result<Vec<(O::Value, O::Value)>> {
        self.ops.get_map(value).map_err(|_| {
            Error::malformed(format!(
                "Nullable value with default encoding must be an empty map, or a map containing the key '{NULLABLE_VALUE_KEY}', was {value:?}"
            ))
        })
    }
}

impl<O: DynamicOps> ExtendedDynamicOps<O::Value> for DefaultingExtendedOps<'_, O> {
    fn supported_map_keys(&self) -> ElementSupport {
        self.base
            .map_or(ElementSupport::Strings, |base| base.supported_map_keys())
    }

    fn supports_null(&self) -> bool {
        self.native_null().is_some()
    }

    fn create_null(&self) -> Result<O::Value> {
        match self.native_null() {
            Some(base) => base.create_null(),
            None => self.ops.create_map(Vec::new()),
        }
    }

    fn wrap_nullable(&self, value: O::Value) -> Result<O::Value> {
        match self.native_null() {
            Some(base) => base.wrap_nullable(value),
            None => self
                .ops
                .create_map(vec![(self.ops.create_string(NULLABLE_VALUE_KEY), value)]),
        }
    }

    fn is_not_null(&self, value: &O::Value) -> Result<bool> {
        match self.native_null() {
            Some(base) => base.is_not_null(value),
            None => {
                let entries = self.expect_map(value)?;
                Ok(map_get(self.ops, &entries, NULLABLE_VALUE_KEY).is_some())
            }
        }
    }

    fn unwrap_nullable(&self, value: O::Value) -> Result<O::Value> {
        match self.native_null() {
            Some(base) => base.unwrap_nullable(value),
            None => {
                let entries = self.expect_map(&value)?;
                map_get(self.ops, &entries, NULLABLE_VALUE_KEY)
                    .cloned()
                    .ok_or_else(|| {
                        Error::malformed(format!(
                            "Nullable value with default encoding must be an empty map, or a map containing the key '{NULLABLE_VALUE_KEY}', was {value:?}"
                        ))
                    })
            }
        }
    }
}
