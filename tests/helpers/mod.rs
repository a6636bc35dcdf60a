//! Utility functions for integration tests
// Not all tests use all helpers
#![allow(dead_code)]

use xml_binding::{Decoder, Element, Reader, Value, Writer};

/// Namespace used by most documents in the tests
pub const NS: &str = "http://sabredav.org/ns";

/// Clark-notation name in the [`NS`] namespace
pub fn sabre(local_name: &str) -> String {
    format!("{{{}}}{}", NS, local_name)
}

/// Decodes the whole document with the given decoders registered
pub fn parse(input: &str, decoders: Vec<(String, Decoder)>) -> Element {
    // Log XML that we try to decode to see it in the failed tests output
    dbg!(input);
    let mut reader = Reader::from_str(input);
    reader.context_mut().decoders.extend(decoders);
    reader.parse().unwrap()
}

/// Writer that indents by one space, with [`NS`] registered under `prefix`
/// and the XML declaration already written
pub fn writer(prefix: &str) -> Writer {
    let mut writer = Writer::with_indent(b' ', 1);
    writer.context_mut().namespaces.insert(NS, prefix.to_string());
    writer.start_document().unwrap();
    writer
}

/// Writes `value` with a [`writer`] using the `s` prefix and returns the document
pub fn write(value: &Value) -> String {
    let mut writer = writer("s");
    writer.write(value).unwrap();
    writer.into_string().unwrap()
}
