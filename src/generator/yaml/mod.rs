//! Building blocks for YAML output.
//!
//! Documents are assembled as a `serde_yaml` value tree and serialized in one go, so
//! quoting of names and credentials is left to the serializer.

use serde_yaml::{Mapping, Value};

pub fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

pub fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Numeric text becomes a YAML integer, anything else is kept as a string.
pub fn number_or_string(value: &str) -> Value {
    match value.trim().parse::<u64>() {
        Ok(number) => Value::Number(number.into()),
        Err(_) => string(value),
    }
}

/// Nested mapping of the present entries, in the given order.
///
/// Returns `None` when every entry is absent, so empty blocks are left out.
pub fn block<'a, I>(entries: I) -> Option<Value>
where
    I: IntoIterator<Item = (&'a str, Option<Value>)>,
{
    let mut mapping = Mapping::new();
    for (name, value) in entries {
        if let Some(value) = value {
            mapping.insert(key(name), value);
        }
    }
    (!mapping.is_empty()).then_some(Value::Mapping(mapping))
}
