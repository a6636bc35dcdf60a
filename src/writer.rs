//! Namespace-aware XML writer.
//!
//! The [`Writer`] accepts clark-notation names and picks prefixes for them:
//! namespaces registered in the [`Context`] use their registered prefix and
//! are declared once on the first element of the document, any other
//! namespace gets an ad-hoc prefix (`x1`, `x2`, ...) declared where it is used.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::{Value, Writer};
//!
//! let mut writer = Writer::new();
//! writer.context_mut().namespaces.insert("DAV:", "d".to_string());
//!
//! writer.start_element("{DAV:}prop").unwrap();
//! writer.write_element("{urn:custom}color", &Value::from("red")).unwrap();
//! writer.end_element().unwrap();
//!
//! assert_eq!(
//!     writer.into_string().unwrap(),
//!     r#"<d:prop xmlns:d="DAV:"><x1:color xmlns:x1="urn:custom">red</x1:color></d:prop>"#
//! );
//! ```

use crate::context::{Context, ContextStack};
use crate::errors::{ConfigError, Result};
use crate::name;
use crate::se;
use crate::value::{Map, Value};
use memchr::memmem;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

/// The namespace bound to the reserved `xml` prefix. It is never declared.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An element whose start tag is written (or pending).
#[derive(Debug)]
struct OpenTag {
    /// Prefixed name, as written into the start tag
    name: String,
    /// Ad-hoc prefixes declared on this element
    declared: Vec<String>,
    /// Default namespace in scope inside this element, empty for none
    default: String,
}

/// A streaming XML writer into an in-memory buffer.
pub struct Writer {
    inner: quick_xml::Writer<Vec<u8>>,
    context: ContextStack,
    /// Namespace to ad-hoc prefix, in order of allocation
    adhoc: Map<String>,
    /// Number of the last allocated ad-hoc prefix
    last_adhoc: usize,
    namespaces_written: bool,
    /// Start tag of the last opened element while attributes can still be added
    pending: Option<BytesStart<'static>>,
    open: Vec<OpenTag>,
    indent: bool,
}

impl Writer {
    /// Creates a writer that does not indent its output.
    pub fn new() -> Self {
        Self::with_writer(quick_xml::Writer::new(Vec::new()), false)
    }

    /// Creates a writer that puts each element on its own line, indented by
    /// `indent_size` characters `indent_char` per level.
    pub fn with_indent(indent_char: u8, indent_size: usize) -> Self {
        Self::with_writer(
            quick_xml::Writer::new_with_indent(Vec::new(), indent_char, indent_size),
            true,
        )
    }

    fn with_writer(inner: quick_xml::Writer<Vec<u8>>, indent: bool) -> Self {
        Self {
            inner,
            context: ContextStack::default(),
            adhoc: Map::new(),
            last_adhoc: 0,
            namespaces_written: false,
            pending: None,
            open: Vec::new(),
            indent,
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Context

    /// The live context.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The live context, for modification.
    #[inline]
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Saves a copy of the live context, see [`ContextStack::push`].
    #[inline]
    pub fn push_context(&mut self) {
        self.context.push();
    }

    /// Restores the last saved context, see [`ContextStack::pop`].
    #[inline]
    pub fn pop_context(&mut self) {
        self.context.pop();
    }

    /// Runs `f` with a copy of the live context that is discarded afterwards,
    /// whether `f` succeeds or not.
    pub fn with_context<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.context.push();
        let result = f(self);
        self.context.pop();
        result
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Document

    /// Writes the XML declaration.
    pub fn start_document(&mut self) -> Result<()> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        // The indenting writer breaks the line before the next tag by itself
        if !self.indent {
            self.inner.get_mut().push(b'\n');
        }
        Ok(())
    }

    /// Closes all open elements and terminates the document with a line break.
    pub fn end_document(&mut self) -> Result<()> {
        while !self.open.is_empty() {
            self.end_element()?;
        }
        let output = self.inner.get_ref();
        if output.last() != Some(&b'\n') {
            self.inner.get_mut().push(b'\n');
        }
        Ok(())
    }

    /// Returns the document written so far. An element whose start tag is
    /// still pending is written as an open start tag.
    pub fn into_string(mut self) -> Result<String> {
        self.flush()?;
        let output = self.inner.into_inner();
        Ok(match String::from_utf8(output) {
            Ok(output) => output,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Elements

    /// Opens an element. Attributes can be written until any content is.
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.flush()?;

        let inherited = self.default_namespace().to_string();
        // Default namespace the element name needs to be in scope
        let mut required = None;
        let mut adhoc = None;
        let qname = if name::is_clark(name) {
            let (namespace, local_name) = name::split(name)?;
            match self.context.namespaces.get(namespace).cloned() {
                _ if namespace == XML_NAMESPACE => prefixed("xml", local_name),
                Some(prefix) if !prefix.is_empty() => prefixed(&prefix, local_name),
                Some(_) => {
                    required = Some(namespace.to_string());
                    local_name.to_string()
                }
                None if namespace.is_empty() => {
                    required = Some(String::new());
                    local_name.to_string()
                }
                None => {
                    let prefix = self.adhoc_prefix(namespace);
                    let qname = prefixed(&prefix, local_name);
                    adhoc = Some((prefix, namespace.to_string()));
                    qname
                }
            }
        } else {
            name.to_string()
        };

        let mut start = BytesStart::new(qname.clone());
        let mut written = Vec::new();
        let mut default = inherited;
        if let Some(namespace) = &required {
            // `xmlns=""` is always written for names without namespace
            if namespace.is_empty() || *namespace != default {
                start.push_attribute(("xmlns", namespace.as_str()));
                written.push("xmlns".to_string());
            }
            default.clone_from(namespace);
        }
        self.open.push(OpenTag {
            name: qname,
            declared: Vec::new(),
            default: String::new(),
        });
        if let Some((prefix, namespace)) = adhoc {
            self.declare(&mut start, prefix, &namespace);
        }
        if !self.namespaces_written {
            for (namespace, prefix) in self.context.namespaces.iter() {
                if namespace == XML_NAMESPACE {
                    continue;
                }
                let attribute = if prefix.is_empty() {
                    // The name of the element fixes its own default namespace
                    if required.is_some() {
                        continue;
                    }
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{}", prefix)
                };
                if written.contains(&attribute) {
                    continue;
                }
                start.push_attribute((attribute.as_str(), namespace));
                if prefix.is_empty() {
                    default = namespace.to_string();
                }
                written.push(attribute);
            }
            self.namespaces_written = true;
        }
        if let Some(tag) = self.open.last_mut() {
            tag.default = default;
        }
        self.pending = Some(start);
        Ok(())
    }

    /// Closes the last opened element. An element without content is written
    /// as a self-closing tag.
    pub fn end_element(&mut self) -> Result<()> {
        let tag = self.open.pop().ok_or(ConfigError::NoOpenElement)?;
        match self.pending.take() {
            Some(start) => self.inner.write_event(Event::Empty(start))?,
            None => self.inner.write_event(Event::End(BytesEnd::new(tag.name)))?,
        }
        if self.indent && self.open.is_empty() {
            self.inner.get_mut().push(b'\n');
        }
        Ok(())
    }

    /// Writes a complete element: opens it, writes `content` unless it is
    /// [`Value::Null`] and closes it.
    pub fn write_element(&mut self, name: &str, content: &Value) -> Result<()> {
        self.start_element(name)?;
        if !content.is_null() {
            self.write(content)?;
        }
        self.end_element()
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Attributes

    /// Adds an attribute to the element opened last. Attributes in a
    /// namespace use the registered prefix of the namespace, if it is not
    /// empty, otherwise an ad-hoc one.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        if self.pending.is_none() {
            return Err(ConfigError::AttributeOutsideTag(name.to_string()).into());
        }

        let mut adhoc = None;
        let qname = if name::is_clark(name) {
            let (namespace, local_name) = name::split(name)?;
            match self.context.namespaces.get(namespace).cloned() {
                _ if namespace.is_empty() => local_name.to_string(),
                _ if namespace == XML_NAMESPACE => prefixed("xml", local_name),
                Some(prefix) if !prefix.is_empty() => prefixed(&prefix, local_name),
                // Unprefixed attributes are in no namespace, so the default
                // namespace cannot be used
                _ => {
                    let prefix = self.adhoc_prefix(namespace);
                    let qname = prefixed(&prefix, local_name);
                    adhoc = Some((prefix, namespace.to_string()));
                    qname
                }
            }
        } else {
            name.to_string()
        };

        if let Some(mut start) = self.pending.take() {
            start.push_attribute((qname.as_str(), value));
            if let Some((prefix, namespace)) = adhoc {
                self.declare(&mut start, prefix, &namespace);
            }
            self.pending = Some(start);
        }
        Ok(())
    }

    /// Adds all attributes to the element opened last.
    pub fn write_attributes(&mut self, attributes: &Map<String>) -> Result<()> {
        for (name, value) in attributes.iter() {
            self.write_attribute(name, value)?;
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Content

    /// Writes escaped text.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        self.flush()?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Writes text as a CDATA section. Occurrences of `]]>` are split between
    /// two sections.
    pub fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.flush()?;
        let mut rest = text;
        while let Some(index) = memmem::find(rest.as_bytes(), b"]]>") {
            // `]]` ends one section, `>` starts the next one
            let (head, tail) = rest.split_at(index + 2);
            self.inner.write_event(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        self.inner.write_event(Event::CData(BytesCData::new(rest)))?;
        Ok(())
    }

    /// Writes any value as the content of the current element, see
    /// [`se::standard`] for the rules.
    #[inline]
    pub fn write(&mut self, value: &Value) -> Result<()> {
        se::standard(self, value)
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////

    fn flush(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.inner.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn default_namespace(&self) -> &str {
        self.open.last().map_or("", |tag| tag.default.as_str())
    }

    /// Returns the ad-hoc prefix of the namespace, allocating the next `xN`
    /// that is not a registered prefix.
    fn adhoc_prefix(&mut self, namespace: &str) -> String {
        if let Some(prefix) = self.adhoc.get(namespace) {
            return prefix.clone();
        }
        let prefix = loop {
            self.last_adhoc += 1;
            let prefix = format!("x{}", self.last_adhoc);
            if !self.context.namespaces.iter().any(|(_, p)| *p == prefix) {
                break prefix;
            }
        };
        debug!(namespace, prefix = %prefix, "allocated ad-hoc namespace prefix");
        self.adhoc.insert(namespace, prefix.clone());
        prefix
    }

    /// Declares an ad-hoc prefix on the pending start tag unless an open
    /// element already did.
    fn declare(&mut self, start: &mut BytesStart, prefix: String, namespace: &str) {
        if self.open.iter().any(|tag| tag.declared.contains(&prefix)) {
            return;
        }
        start.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace));
        if let Some(tag) = self.open.last_mut() {
            tag.declared.push(prefix);
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

fn prefixed(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use pretty_assertions::assert_eq;

    fn writer() -> Writer {
        let mut writer = Writer::new();
        writer
            .context_mut()
            .namespaces
            .insert("http://sabredav.org/ns", "s".to_string());
        writer
    }

    #[test]
    fn empty_element_is_self_closing() {
        let mut writer = writer();
        writer.start_element("{http://sabredav.org/ns}root").unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            r#"<s:root xmlns:s="http://sabredav.org/ns"/>"#
        );
    }

    #[test]
    fn plain_name_gets_registered_declarations() {
        let mut writer = writer();
        writer.start_element("foo").unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            r#"<foo xmlns:s="http://sabredav.org/ns"/>"#
        );
    }

    #[test]
    fn adhoc_prefix_declared_once_per_scope() {
        let mut writer = Writer::new();
        writer.start_element("{urn:a}one").unwrap();
        writer.start_element("{urn:a}two").unwrap();
        writer.end_element().unwrap();
        writer.start_element("{urn:b}three").unwrap();
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        writer.start_element("{urn:a}four").unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<x1:one xmlns:x1="urn:a"><x1:two/><x2:three xmlns:x2="urn:b"/></x1:one>"#,
                r#"<x1:four xmlns:x1="urn:a"/>"#,
            )
        );
    }

    #[test]
    fn attributes() {
        let mut writer = writer();
        writer.start_element("{http://sabredav.org/ns}elem").unwrap();
        writer
            .write_attributes(&Map::from([
                ("attr1", "val1".to_string()),
                ("{http://sabredav.org/ns}attr2", "val2".to_string()),
                ("{urn:foo}attr3", "val3".to_string()),
                ("{urn:foo}attr4", "val4".to_string()),
                ("{}attr5", "val5".to_string()),
            ]))
            .unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<s:elem xmlns:s="http://sabredav.org/ns" attr1="val1" s:attr2="val2" "#,
                r#"x1:attr3="val3" xmlns:x1="urn:foo" x1:attr4="val4" attr5="val5"/>"#,
            )
        );
    }

    #[test]
    fn xml_namespace_is_never_declared() {
        let mut writer = Writer::new();
        writer.start_element("{}a").unwrap();
        writer
            .write_attribute("{http://www.w3.org/XML/1998/namespace}lang", "en")
            .unwrap();
        writer
            .write_element("{http://www.w3.org/XML/1998/namespace}b", &Value::Null)
            .unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            r#"<a xmlns="" xml:lang="en"><xml:b/></a>"#
        );
    }

    #[test]
    fn default_namespace_restored_after_reset() {
        let mut writer = Writer::new();
        writer.context_mut().namespaces.insert("urn:a", String::new());
        writer.start_element("{urn:a}root").unwrap();
        writer.start_element("{}e").unwrap();
        writer.write_element("{urn:a}child", &Value::Null).unwrap();
        writer.end_element().unwrap();
        writer.write_element("{urn:a}sibling", &Value::Null).unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<root xmlns="urn:a"><e xmlns=""><child xmlns="urn:a"/></e>"#,
                r#"<sibling/></root>"#,
            )
        );
    }

    #[test]
    fn default_namespace_under_unqualified_root() {
        let mut writer = Writer::new();
        writer.context_mut().namespaces.insert("urn:a", String::new());
        writer.start_element("{}root").unwrap();
        writer.write_element("{urn:a}child", &Value::Null).unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            r#"<root xmlns=""><child xmlns="urn:a"/></root>"#
        );
    }

    #[test]
    fn adhoc_prefix_skips_registered_prefixes() {
        let mut writer = Writer::new();
        writer.context_mut().namespaces.insert("urn:r", "x1".to_string());
        writer.start_element("{urn:r}root").unwrap();
        writer.start_element("{urn:other}a").unwrap();
        writer.write_element("{urn:r}b", &Value::Null).unwrap();
        writer.end_element().unwrap();
        writer.write_element("{urn:third}c", &Value::Null).unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<x1:root xmlns:x1="urn:r"><x2:a xmlns:x2="urn:other"><x1:b/></x2:a>"#,
                r#"<x3:c xmlns:x3="urn:third"/></x1:root>"#,
            )
        );
    }

    #[test]
    fn attribute_outside_tag() {
        let mut writer = writer();
        writer.start_element("a").unwrap();
        writer.write_string("text").unwrap();
        match writer.write_attribute("late", "1") {
            Err(Error::Config(ConfigError::AttributeOutsideTag(name))) => assert_eq!(name, "late"),
            x => panic!("Expected `AttributeOutsideTag`, but got `{:?}`", x),
        }
    }

    #[test]
    fn end_without_start() {
        match Writer::new().end_element() {
            Err(Error::Config(ConfigError::NoOpenElement)) => {}
            x => panic!("Expected `NoOpenElement`, but got `{:?}`", x),
        }
    }

    #[test]
    fn cdata_terminator_is_split() {
        let mut writer = Writer::new();
        writer.start_element("a").unwrap();
        writer.write_cdata("x]]>y").unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<a><![CDATA[x]]]]><![CDATA[>y]]></a>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let mut writer = Writer::new();
        writer
            .write_element("a", &Value::from("<\"text\" & more>"))
            .unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<a>&lt;&quot;text&quot; &amp; more&gt;</a>"
        );
    }

    #[test]
    fn document_with_indent() {
        let mut writer = Writer::with_indent(b' ', 1);
        writer
            .context_mut()
            .namespaces
            .insert("http://sabredav.org/ns", "s".to_string());
        writer.start_document().unwrap();
        writer.start_element("{http://sabredav.org/ns}root").unwrap();
        writer
            .write_element("{http://sabredav.org/ns}child", &Value::from("text"))
            .unwrap();
        writer.end_document().unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<?xml version=\"1.0\"?>\n\
             <s:root xmlns:s=\"http://sabredav.org/ns\">\n \
             <s:child>text</s:child>\n\
             </s:root>\n"
        );
    }
}
