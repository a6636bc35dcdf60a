//! Serialization of values into the [`Writer`].
//!
//! [`standard`] is the generic serializer behind [`Writer::write`]. The other
//! functions are building blocks for [`Encode`] implementations and encoders
//! of the [`Context`](crate::Context).

use crate::errors::{ConfigError, Result};
use crate::name;
use crate::value::{Map, Value};
use crate::value_object::ValueObject;
use crate::writer::Writer;
use std::any::Any;
use std::fmt;

/// A type that writes itself as the inner XML of an element.
///
/// Values wrapped with [`Value::encodable`] are written with their
/// implementation of this trait.
pub trait Encode: Any + fmt::Debug + Send + Sync {
    /// Writes the content of the current element. The start and end tags are
    /// written by the caller.
    fn encode(&self, writer: &mut Writer) -> Result<()>;
}

/// Writes any value as the content of the current element.
///
/// | Value                   | Output
/// |-------------------------|-----------------------------------------------
/// | scalars                 | text; booleans as `true` and `false`
/// | [`Value::Null`]         | nothing
/// | [`Value::Object`]       | with its [`Encode`] implementation or with the encoder registered for its type
/// | [`Value::Deferred`]     | whatever the closure writes
/// | [`Value::List`]         | one element per entry; entries must be [`Value::Element`]s
/// | [`Value::Map`]          | one element per entry, named by the key; [`Value::Attributed`] entries get attributes, [`Value::Element`] entries use their own name
/// | [`Value::Element`]      | one element
/// | [`Value::Attributed`]   | error, it has no name
pub fn standard(writer: &mut Writer, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Bool(true) => writer.write_string("true"),
        Value::Bool(false) => writer.write_string("false"),
        Value::Integer(i) => writer.write_string(&i.to_string()),
        Value::Float(f) => writer.write_string(&f.to_string()),
        Value::String(s) => writer.write_string(s),
        Value::Object(object) => {
            if let Some(encodable) = object.as_encode() {
                return encodable.encode(writer);
            }
            let encoder = writer.context().encoders.get(&object.type_id()).cloned();
            match encoder {
                Some(encoder) => encoder.encode(writer, object.as_any()),
                None => Err(ConfigError::Unserializable(object.type_name()).into()),
            }
        }
        Value::Deferred(deferred) => deferred.call(writer),
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Element(e) => element(writer, &e.name, &e.value, &e.attributes)?,
                    _ => return Err(ConfigError::UnnamedEntry { index }.into()),
                }
            }
            Ok(())
        }
        Value::Map(map) => entries(writer, map),
        Value::Element(e) => element(writer, &e.name, &e.value, &e.attributes),
        Value::Attributed(..) => Err(ConfigError::Unserializable(value.type_name()).into()),
    }
}

/// Writes one element per map entry, see [`standard`].
pub(crate) fn entries(writer: &mut Writer, map: &Map) -> Result<()> {
    for (key, item) in map.iter() {
        match item {
            Value::Element(e) => element(writer, &e.name, &e.value, &e.attributes)?,
            Value::Attributed(value, attributes) => element(writer, key, value, attributes)?,
            value => element(writer, key, value, &Map::new())?,
        }
    }
    Ok(())
}

fn element(writer: &mut Writer, name: &str, value: &Value, attributes: &Map<String>) -> Result<()> {
    writer.start_element(name)?;
    writer.write_attributes(attributes)?;
    writer.write(value)?;
    writer.end_element()
}

/// Writes one self-closing element per name.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use xml_binding::{se, Writer};
///
/// let mut writer = Writer::new();
/// writer.start_element("{DAV:}resourcetype").unwrap();
/// se::enumeration(&mut writer, ["{DAV:}collection", "{urn:x}calendar"]).unwrap();
/// writer.end_element().unwrap();
///
/// assert_eq!(
///     writer.into_string().unwrap(),
///     concat!(
///         r#"<x1:resourcetype xmlns:x1="DAV:"><x1:collection/>"#,
///         r#"<x2:calendar xmlns:x2="urn:x"/></x1:resourcetype>"#,
///     )
/// );
/// ```
pub fn enumeration<I, S>(writer: &mut Writer, names: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for name in names {
        writer.write_element(name.as_ref(), &Value::Null)?;
    }
    Ok(())
}

/// Writes every field of a value object as a `{namespace}field` element.
///
/// A field holding a list of non-element values (such as a `Vec<String>`) is
/// written as one element per item, which is how
/// [`de::value_object`](crate::de::value_object) reads it back.
pub fn value_object<T: ValueObject>(writer: &mut Writer, object: &T, namespace: &str) -> Result<()> {
    for (field, value) in object.fields() {
        let element = name::combine(namespace, field);
        match value {
            Value::List(items) if !items.iter().all(|i| matches!(i, Value::Element(_))) => {
                repeating_elements(writer, &items, &element)?;
            }
            Value::List(items) if items.is_empty() => {}
            value => writer.write_element(&element, &value)?,
        }
    }
    Ok(())
}

/// Writes one element named `name` per item.
pub fn repeating_elements(writer: &mut Writer, items: &[Value], name: &str) -> Result<()> {
    for item in items {
        writer.write_element(name, item)?;
    }
    Ok(())
}
