//! A facade that keeps the registries and creates configured readers and
//! writers from them.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::element::Elements;
//! use xml_binding::{Decoder, Service, Value};
//!
//! let mut service = Service::new();
//! service.register_namespace("DAV:", "d");
//! service.register_decoder("{DAV:}resourcetype", Decoder::of::<Elements>());
//!
//! let (root, value) = service.parse(
//!     r#"<d:resourcetype xmlns:d="DAV:"><d:collection/></d:resourcetype>"#,
//!     None,
//! ).unwrap();
//! assert_eq!(root, "{DAV:}resourcetype");
//! assert_eq!(value, Value::List(vec![Value::from("{DAV:}collection")]));
//!
//! assert_eq!(
//!     service.write("{DAV:}displayname", &Value::from("Home"), None).unwrap(),
//!     "<?xml version=\"1.0\"?>\n<d:displayname xmlns:d=\"DAV:\">Home</d:displayname>\n",
//! );
//! ```

use crate::context::{Context, Decoder, DecoderMap, Encoder, EncoderMap, NamespaceMap};
use crate::de;
use crate::errors::{ConfigError, FormatError, ParseError, Result};
use crate::name;
use crate::reader::Reader;
use crate::se;
use crate::value::Value;
use crate::value_object::ValueObject;
use crate::writer::Writer;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::Read;
use tracing::trace;

/// Output settings of a [`Service`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Indentation character and number of characters per level. When `None`,
    /// the document is written on one line.
    ///
    /// Default: `Some((b' ', 1))`
    pub indent: Option<(u8, usize)>,

    /// Whether the XML declaration `<?xml version="1.0"?>` is written.
    ///
    /// Default: `true`
    pub xml_declaration: bool,
}

impl Config {
    /// Sets the indentation, see [`indent`](Self::indent).
    pub fn indent(&mut self, indent: Option<(u8, usize)>) -> &mut Self {
        self.indent = indent;
        self
    }

    /// Sets whether the XML declaration is written, see
    /// [`xml_declaration`](Self::xml_declaration).
    pub fn xml_declaration(&mut self, enabled: bool) -> &mut Self {
        self.xml_declaration = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: Some((b' ', 1)),
            xml_declaration: true,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registries of decoders, encoders, namespace prefixes and value objects.
///
/// The service itself never changes while parsing or writing: every call
/// works on its own reader or writer with a copy of the registries, so a
/// configured service can be shared between threads.
#[derive(Clone, Debug, Default)]
pub struct Service {
    decoders: DecoderMap,
    namespaces: NamespaceMap,
    encoders: EncoderMap,
    /// Element names of the mapped value objects
    value_objects: HashMap<TypeId, String>,
    config: Config,
}

impl Service {
    /// Creates a service with empty registries and the default [`Config`].
    pub fn new() -> Self {
        Self::default()
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Registries

    /// Registers a decoder for elements named `name` (in clark notation).
    pub fn register_decoder(&mut self, name: impl Into<String>, decoder: Decoder) -> &mut Self {
        self.decoders.insert(name.into(), decoder);
        self
    }

    /// Registers an encoder for values of type `T`, wrapped in [`Value::Object`].
    pub fn register_encoder<T, F>(&mut self, f: F) -> &mut Self
    where
        T: Any,
        F: Fn(&mut Writer, &T) -> Result<()> + Send + Sync + 'static,
    {
        self.encoders.insert(TypeId::of::<T>(), Encoder::new::<T, F>(f));
        self
    }

    /// Registers the prefix that the writer uses for `namespace`. An empty
    /// prefix makes `namespace` the default namespace of written documents.
    pub fn register_namespace(&mut self, namespace: &str, prefix: &str) -> &mut Self {
        self.namespaces.insert(namespace, prefix.to_string());
        self
    }

    /// The decoder registry.
    #[inline]
    pub fn decoders(&self) -> &DecoderMap {
        &self.decoders
    }

    /// The decoder registry, for modification.
    #[inline]
    pub fn decoders_mut(&mut self) -> &mut DecoderMap {
        &mut self.decoders
    }

    /// The namespace prefix registry.
    #[inline]
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// The namespace prefix registry, for modification.
    #[inline]
    pub fn namespaces_mut(&mut self) -> &mut NamespaceMap {
        &mut self.namespaces
    }

    /// Output settings.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output settings, for modification.
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn context(&self, base_uri: Option<&str>) -> Context {
        Context {
            decoders: self.decoders.clone(),
            namespaces: self.namespaces.clone(),
            encoders: self.encoders.clone(),
            base_uri: base_uri.unwrap_or_default().to_string(),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Reading

    /// Creates a reader over `input` with a copy of the registries.
    pub fn reader<'i>(&self, input: &'i str) -> Reader<'i> {
        let mut reader = Reader::from_str(input);
        *reader.context_mut() = self.context(None);
        reader
    }

    /// Parses a document. Returns the clark-notation name of the root element
    /// and its decoded value.
    ///
    /// `base_uri` is the URI of the document, used to resolve relative URIs.
    pub fn parse(&self, input: &str, base_uri: Option<&str>) -> Result<(String, Value)> {
        trace!(?base_uri, "parsing document");
        let mut reader = Reader::from_str(input);
        self.decode(&mut reader, base_uri)
    }

    /// Parses a document from bytes, see [`parse`](Self::parse). Without the
    /// `encoding` feature the document must be UTF-8.
    pub fn parse_bytes(&self, input: &[u8], base_uri: Option<&str>) -> Result<(String, Value)> {
        trace!(?base_uri, len = input.len(), "parsing document");
        let mut reader = Reader::from_bytes(input);
        self.decode(&mut reader, base_uri)
    }

    /// Reads the whole `input` and parses it, see [`parse_bytes`](Self::parse_bytes).
    pub fn parse_reader<R: Read>(&self, mut input: R, base_uri: Option<&str>) -> Result<(String, Value)> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        self.parse_bytes(&buffer, base_uri)
    }

    /// Parses a document whose root element must have one of `names` (in
    /// clark notation), and returns the decoded value of the root.
    pub fn expect(&self, names: &[&str], input: &str, base_uri: Option<&str>) -> Result<Value> {
        let (root, value) = self.parse(input, base_uri)?;
        if names.contains(&root.as_str()) {
            return Ok(value);
        }
        Err(ParseError::UnexpectedRoot {
            expected: names.iter().map(|name| name.to_string()).collect(),
            found: root,
        }
        .into())
    }

    fn decode(&self, reader: &mut Reader<'_>, base_uri: Option<&str>) -> Result<(String, Value)> {
        *reader.context_mut() = self.context(base_uri);
        let root = reader.parse()?;
        Ok((root.name, root.value))
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Writing

    /// Creates a writer with a copy of the registries, configured by [`Config`].
    pub fn writer(&self) -> Writer {
        let mut writer = match self.config.indent {
            Some((indent_char, indent_size)) => Writer::with_indent(indent_char, indent_size),
            None => Writer::new(),
        };
        *writer.context_mut() = self.context(None);
        writer
    }

    /// Writes a document with a single root element named `root` (in clark
    /// notation) and `value` as its content.
    ///
    /// `base_uri` is the URI of the document, used to resolve relative URIs.
    pub fn write(&self, root: &str, value: &Value, base_uri: Option<&str>) -> Result<String> {
        trace!(root, ?base_uri, "writing document");
        let mut writer = self.writer();
        writer.context_mut().base_uri = base_uri.unwrap_or_default().to_string();
        if self.config.xml_declaration {
            writer.start_document()?;
        }
        writer.write_element(root, value)?;
        writer.end_document()?;
        writer.into_string()
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Value objects

    /// Maps the value object `T` to the element `name` (in clark notation):
    /// elements with this name are decoded into `T` with [`de::value_object`],
    /// values of type `T` are written with [`se::value_object`], and
    /// [`write_value_object`](Self::write_value_object) uses `name` as the root.
    ///
    /// Fields of `T` are child elements in the namespace of `name`.
    pub fn map_value_object<T: ValueObject>(&mut self, name: &str) -> Result<()> {
        let (namespace, _) = name::split(name)?;

        let decode_namespace = namespace.to_string();
        self.decoders.insert(
            name.to_string(),
            Decoder::function(move |reader| {
                de::value_object::<T>(reader, &decode_namespace).map(Value::object)
            }),
        );

        let encode_namespace = namespace.to_string();
        self.encoders.insert(
            TypeId::of::<T>(),
            Encoder::new::<T, _>(move |writer, object| {
                se::value_object(writer, object, &encode_namespace)
            }),
        );

        self.value_objects.insert(TypeId::of::<T>(), name.to_string());
        Ok(())
    }

    /// Writes a document with a value object mapped by
    /// [`map_value_object`](Self::map_value_object) as the root element.
    pub fn write_value_object<T: ValueObject>(&self, object: &T, base_uri: Option<&str>) -> Result<String> {
        let root = self
            .value_objects
            .get(&TypeId::of::<T>())
            .ok_or(ConfigError::UnregisteredType(std::any::type_name::<T>()))?;
        self.write(root, &Value::object(object.clone()), base_uri)
    }

    /// Splits a clark-notation name into namespace and local name, see [`name::split`].
    #[inline]
    pub fn split_qualified_name(name: &str) -> std::result::Result<(&str, &str), FormatError> {
        name::split(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::value::{Element, Map};
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_with_base_uri() {
        let mut service = Service::new();
        service.register_decoder("{urn:test}link", Decoder::standard("uri"));

        let (root, value) = service
            .parse(
                r#"<root xmlns="urn:test"><link>b/c</link></root>"#,
                Some("http://example.org/a/"),
            )
            .unwrap();
        assert_eq!(root, "{urn:test}root");
        assert_eq!(
            value,
            Value::List(vec![Element::new(
                "{urn:test}link",
                Value::encodable(crate::element::Uri("http://example.org/a/b/c".into())),
            )
            .into()])
        );
    }

    #[test]
    fn parse_bytes_and_reader() {
        let service = Service::new();
        let input = "<a><b>text</b></a>";
        let expected = (
            "{}a".to_string(),
            Value::List(vec![Element::new("{}b", "text").into()]),
        );
        assert_eq!(service.parse_bytes(input.as_bytes(), None).unwrap(), expected);
        assert_eq!(service.parse_reader(input.as_bytes(), None).unwrap(), expected);
    }

    #[test]
    fn expect_other_root() {
        let service = Service::new();
        match service.expect(&["{urn:a}a", "{urn:a}b"], r#"<c xmlns="urn:a"/>"#, None) {
            Err(Error::Parse(ParseError::UnexpectedRoot { expected, found })) => {
                assert_eq!(expected, ["{urn:a}a", "{urn:a}b"]);
                assert_eq!(found, "{urn:a}c");
            }
            x => panic!("Expected `UnexpectedRoot`, but got `{:?}`", x),
        }
    }

    #[test]
    fn write_without_indent_and_declaration() {
        let mut service = Service::new();
        service.register_namespace("urn:test", "t");
        service.config_mut().indent(None).xml_declaration(false);

        assert_eq!(
            service
                .write(
                    "{urn:test}root",
                    &Value::Map(Map::from([("{urn:test}a", Value::from(1))])),
                    None,
                )
                .unwrap(),
            "<t:root xmlns:t=\"urn:test\"><t:a>1</t:a></t:root>\n"
        );
    }

    #[test]
    fn write_unmapped_value_object() {
        #[derive(Clone, Debug, Default, PartialEq)]
        struct Unmapped {
            id: u32,
        }
        crate::value_object!(Unmapped { id });

        match Service::new().write_value_object(&Unmapped::default(), None) {
            Err(Error::Config(ConfigError::UnregisteredType(ty))) => assert!(ty.ends_with("Unmapped")),
            x => panic!("Expected `UnregisteredType`, but got `{:?}`", x),
        }
    }

    #[test]
    fn map_value_object_with_plain_name() {
        #[derive(Clone, Debug, Default, PartialEq)]
        struct Plain {
            id: u32,
        }
        crate::value_object!(Plain { id });

        match Service::new().map_value_object::<Plain>("plain") {
            Err(Error::Format(e)) => assert_eq!(e.input, "plain"),
            x => panic!("Expected `FormatError`, but got `{:?}`", x),
        }
    }
}
