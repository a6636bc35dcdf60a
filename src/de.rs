//! Building blocks for element decoders.
//!
//! Every function here expects the [`Reader`] to be positioned on the start
//! tag of an element, decodes that element and leaves the reader on the node
//! following its end tag, so they can be used directly as decoders:
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::{de, Decoder, Reader, Value};
//!
//! let mut reader = Reader::from_str(r#"
//!     <d:prop xmlns:d="DAV:">
//!         <d:displayname>Home</d:displayname>
//!         <d:getetag>"1"</d:getetag>
//!     </d:prop>
//! "#);
//! reader.context_mut().decoders.insert(
//!     "{DAV:}prop".into(),
//!     Decoder::function(|r| de::key_value(r, Some("DAV:")).map(Value::Map)),
//! );
//!
//! let prop = reader.parse().unwrap().value;
//! assert_eq!(prop.as_map().unwrap().get("displayname"), Some(&Value::from("Home")));
//! ```

use crate::errors::{Error, ParseError, Result};
use crate::reader::{NodeType, Reader};
use crate::value::{Map, Value};
use crate::value_object::ValueObject;

/// A type that can decode the element the reader is positioned on.
///
/// Implementations can be registered with [`Decoder::of`](crate::Decoder::of).
pub trait Decode {
    /// Decodes the current element and moves the reader past it.
    fn decode(reader: &mut Reader<'_>) -> Result<Value>;
}

/// Decodes child elements into a map keyed by their clark-notation names,
/// or by their local names for children in `namespace`.
///
/// Values of the children are decoded with the registered decoders; their
/// attributes are dropped. A child appearing more than once keeps the last value.
pub fn key_value(reader: &mut Reader<'_>, namespace: Option<&str>) -> Result<Map> {
    if reader.is_empty_element() {
        reader.skip()?;
        return Ok(Map::new());
    }

    let mut values = Map::new();
    reader.read()?;
    loop {
        match reader.node_type() {
            NodeType::Element => {
                let key = child_name(reader, namespace);
                let element = reader.decode_current_element()?;
                values.insert(key, element.value);
            }
            NodeType::EndElement => break,
            NodeType::EndOfDocument => return Err(reader.premature_end()),
            _ => {
                reader.read()?;
            }
        }
    }
    reader.read()?;
    Ok(values)
}

/// Returns the names of the child elements, in document order: clark-notation
/// names, or local names for children in `namespace`.
///
/// The content of the children is skipped.
pub fn enumeration(reader: &mut Reader<'_>, namespace: Option<&str>) -> Result<Vec<String>> {
    if reader.is_empty_element() {
        reader.skip()?;
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    reader.read()?;
    loop {
        match reader.node_type() {
            NodeType::Element => {
                values.push(child_name(reader, namespace));
                reader.skip()?;
            }
            NodeType::EndElement => break,
            NodeType::EndOfDocument => return Err(reader.premature_end()),
            _ => {
                reader.read()?;
            }
        }
    }
    reader.read()?;
    Ok(values)
}

/// Decodes child elements in `namespace` into the fields of `T` with the same
/// name. Children without a matching field, or in another namespace, are
/// skipped. Fields without a matching child keep their default value.
///
/// Values of the children are decoded with the registered decoders and
/// converted with [`ValueObject::set_field`].
pub fn value_object<T: ValueObject>(reader: &mut Reader<'_>, namespace: &str) -> Result<T> {
    let mut object = T::default();
    if reader.is_empty_element() {
        reader.skip()?;
        return Ok(object);
    }

    reader.read()?;
    loop {
        match reader.node_type() {
            NodeType::Element if reader.namespace() == namespace => {
                let field = reader.local_name().to_string();
                if T::has_field(&field) {
                    let element = reader.decode_current_element()?;
                    object
                        .set_field(&field, element.value)
                        .map_err(|e| invalid_value(&element.name, e))?;
                } else {
                    reader.skip()?;
                }
            }
            NodeType::Element => {
                reader.skip()?;
            }
            NodeType::EndElement => break,
            NodeType::EndOfDocument => return Err(reader.premature_end()),
            _ => {
                reader.read()?;
            }
        }
    }
    reader.read()?;
    Ok(object)
}

/// Returns the values of the child elements named `name` (in clark notation),
/// in document order. Other children are decoded and dropped.
pub fn repeating_elements(reader: &mut Reader<'_>, name: &str) -> Result<Vec<Value>> {
    Ok(reader
        .decode_elements(None)?
        .into_iter()
        .filter(|element| element.name == name)
        .map(|element| element.value)
        .collect())
}

fn child_name(reader: &Reader, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) if reader.namespace() == namespace => reader.local_name().to_string(),
        _ => reader.qualified_name().unwrap_or_default(),
    }
}

/// Attaches the element name to a conversion error.
fn invalid_value(element: &str, error: Error) -> Error {
    match error {
        Error::Parse(ParseError::InvalidValue { message, .. }) => ParseError::InvalidValue {
            element: element.to_string(),
            message,
        }
        .into(),
        error => error,
    }
}
