//! Clark notation: the textual `{namespace}local-name` form used to address
//! elements and attributes.
//!
//! An empty namespace (`{}name`) means the element is in no namespace at all.

use crate::errors::FormatError;
use memchr::memchr;

/// Combines namespace and local name into a clark-notation name.
///
/// # Examples
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use xml_binding::name::combine;
///
/// assert_eq!(combine("DAV:", "href"), "{DAV:}href");
/// assert_eq!(combine("", "root"), "{}root");
/// ```
pub fn combine(namespace: &str, local_name: &str) -> String {
    let mut name = String::with_capacity(namespace.len() + local_name.len() + 2);
    name.push('{');
    name.push_str(namespace);
    name.push('}');
    name.push_str(local_name);
    name
}

/// Splits a clark-notation name into namespace and local name.
///
/// # Examples
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use xml_binding::name::split;
///
/// assert_eq!(split("{urn:test}elem").unwrap(), ("urn:test", "elem"));
/// assert!(split("urn:test}elem").is_err());
/// ```
pub fn split(name: &str) -> Result<(&str, &str), FormatError> {
    let bytes = name.as_bytes();
    if bytes.first() != Some(&b'{') {
        return Err(FormatError { input: name.into() });
    }
    match memchr(b'}', &bytes[1..]) {
        // `{` and `}` are ASCII, so both positions are char boundaries
        Some(end) => Ok((&name[1..end + 1], &name[end + 2..])),
        None => Err(FormatError { input: name.into() }),
    }
}

/// Returns `true` if the name is written in clark notation, i.e. starts with `{`.
/// Other names are plain names, passed to the writer as is.
#[inline]
pub fn is_clark(name: &str) -> bool {
    name.starts_with('{')
}
