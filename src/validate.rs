use crate::{
    DynamicOps, Error, Result, cold_path,
    ops::map_get,
    state::SerializationConfig,
};

pub(crate) const ENTRY_KEY: &str = "key";
pub(crate) const ENTRY_VALUE: &str = "value";

/// Keys of `entries` that are not strings in `allowed`, rendered for error
/// messages.
pub(crate) fn collect_invalid_keys<O: DynamicOps>(
    config: &SerializationConfig<'_, O>,
    entries: &[(O::Value, O::Value)],
    allowed: &[&str],
) -> Vec<String> {
    entries
        .iter()
        .filter(|(key, _)| match config.ops.get_string_value(key) {
            Ok(key) => !allowed.contains(&key.as_ref()),
            Err(_) => true,
        })
        .map(|(key, _)| config.describe(key))
        .collect()
}

pub(crate) fn join_quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fails with the unknown keys unless unknown keys are ignored.
pub(crate) fn check_unknown_keys<O: DynamicOps>(
    config: &SerializationConfig<'_, O>,
    unknown: &[String],
    context: &str,
) -> Result<()> {
    if unknown.is_empty() || config.options.ignore_unknown_keys {
        return Ok(());
    }
    cold_path();
    Err(Error::malformed(format!(
        "Unknown fields found{context}: {}",
        join_quoted(unknown)
    )))
}

/// Converts an entry-list map into its key/value pairs.
pub(crate) fn entry_list<O: DynamicOps>(
    config: &SerializationConfig<'_, O>,
    value: &O::Value,
) -> Result<Vec<(O::Value, O::Value)>> {
    let ops = config.ops;
    ops.get_list(value)?
        .iter()
        .map(|item| {
            let entry = ops.get_map(item).map_err(|_| {
                Error::malformed(format!(
                    "Entry list maps must contain maps with '{ENTRY_KEY}' and '{ENTRY_VALUE}' fields, got {item:?}"
                ))
            })?;
            let key = map_get(ops, &entry, ENTRY_KEY);
            let value = map_get(ops, &entry, ENTRY_VALUE);
            let (Some(key), Some(value)) = (key, value) else {
                cold_path();
                let missing = [(ENTRY_KEY, key.is_none()), (ENTRY_VALUE, value.is_none())]
                    .into_iter()
                    .filter(|(_, missing)| *missing)
                    .map(|(name, _)| name.to_owned())
                    .collect();
                return Err(Error::MissingFields(missing));
            };
            let unknown = collect_invalid_keys(config, &entry, &[ENTRY_KEY, ENTRY_VALUE]);
            check_unknown_keys(config, &unknown, " in map entry")?;
            Ok((key.clone(), value.clone()))
        })
        .collect()
}

/// Fails if a flattened struct declares a field named like the
/// discriminator it shares a map with.
pub(crate) fn check_reserved_field(
    type_name: &str,
    fields: &[&str],
    reserved: Option<&str>,
) -> Result<()> {
    match reserved {
        Some(reserved) if fields.contains(&reserved) => {
            cold_path();
            Err(Error::ambiguous(format!(
                "Field '{reserved}' of '{type_name}' conflicts with the class discriminator of its flattened enum; change the discriminator or disable flattening"
            )))
        }
        _ => Ok(()),
    }
}
