//! Pull cursor over the `quick-xml` namespace-aware tokenizer.
//!
//! The cursor turns the event stream into a sequence of nodes with a depth,
//! resolves element and attribute names eagerly, merges adjacent pieces of
//! text and keeps track of the namespace declarations in scope.

use crate::errors::{Error, ParseError, Result};
use crate::name;
use crate::value::Map;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;

/// Kind of the node the reader is positioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// Start tag or self-closing tag
    Element,
    /// Text content, with entity and character references resolved
    Text,
    /// CDATA section
    CData,
    /// Text content consisting of XML whitespace only
    Whitespace,
    /// End tag
    EndElement,
    /// Nothing more to read
    EndOfDocument,
    /// XML declaration, comment, processing instruction or DTD. Also the
    /// position before the first read
    Other,
}

/// Namespace declaration seen on an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Binding {
    /// Depth of the declaring element
    pub depth: usize,
    /// `None` for the default namespace
    pub prefix: Option<String>,
    pub namespace: String,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub kind: NodeType,
    pub depth: usize,
    /// Byte offset of the first byte of the node markup
    pub start: usize,
    /// Byte offset just after the node markup
    pub end: usize,
    pub namespace: String,
    pub local_name: String,
    pub attributes: Map<String>,
    pub empty: bool,
    /// Text of text, CDATA and whitespace nodes
    pub text: String,
}

impl Node {
    fn new(kind: NodeType, depth: usize, start: usize, end: usize) -> Self {
        Self {
            kind,
            depth,
            start,
            end,
            namespace: String::new(),
            local_name: String::new(),
            attributes: Map::new(),
            empty: false,
            text: String::new(),
        }
    }
}

pub(crate) struct Cursor<'i> {
    inner: NsReader<&'i [u8]>,
    input: &'i [u8],
    node: Node,
    /// Number of elements opened before the current node
    level: usize,
    /// An event read ahead while merging text, with its start offset
    lookahead: Option<(usize, Event<'i>)>,
    bindings: Vec<Binding>,
}

impl<'i> Cursor<'i> {
    pub fn from_str(input: &'i str) -> Self {
        Self::new(NsReader::from_str(input), input.as_bytes())
    }

    pub fn from_bytes(input: &'i [u8]) -> Self {
        Self::new(NsReader::from_reader(input), input)
    }

    fn new(inner: NsReader<&'i [u8]>, input: &'i [u8]) -> Self {
        Self {
            inner,
            input,
            node: Node::new(NodeType::Other, 0, 0, 0),
            level: 0,
            lookahead: None,
            bindings: Vec::new(),
        }
    }

    #[inline]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[inline]
    pub fn input(&self) -> &'i [u8] {
        self.input
    }

    #[inline]
    pub fn decoder(&self) -> Decoder {
        self.inner.decoder()
    }

    /// Namespace declarations in scope of the current node, one per prefix,
    /// innermost wins.
    pub fn in_scope(&self) -> Vec<(Option<String>, String)> {
        let mut scope: Vec<(Option<String>, String)> = Vec::new();
        for binding in &self.bindings {
            match scope.iter_mut().find(|(p, _)| *p == binding.prefix) {
                Some((_, ns)) => ns.clone_from(&binding.namespace),
                None => scope.push((binding.prefix.clone(), binding.namespace.clone())),
            }
        }
        scope
    }

    /// Moves to the next node. Returns `false` if the end of document is reached.
    pub fn read(&mut self) -> Result<bool> {
        if self.node.kind == NodeType::EndOfDocument {
            return Ok(false);
        }
        match self.node.kind {
            NodeType::Element if !self.node.empty => self.level += 1,
            NodeType::Element | NodeType::EndElement => {
                let depth = self.node.depth;
                self.bindings.retain(|b| b.depth < depth);
            }
            _ => {}
        }

        let (start, event) = self.next_event()?;
        let end = self.position();
        self.node = match event {
            Event::Start(e) => self.element(e, start, end, false)?,
            Event::Empty(e) => self.element(e, start, end, true)?,
            Event::End(_) => {
                self.level = self.level.saturating_sub(1);
                Node::new(NodeType::EndElement, self.level, start, end)
            }
            Event::Text(e) => {
                let text = e.decode()?.into_owned();
                self.text(text, start)?
            }
            Event::GeneralRef(e) => {
                let text = self.resolve_reference(&e)?;
                self.text(text, start)?
            }
            Event::CData(e) => {
                let mut node = Node::new(NodeType::CData, self.level, start, end);
                node.text = self.inner.decoder().decode(&e)?.into_owned();
                node
            }
            Event::Eof => Node::new(NodeType::EndOfDocument, self.level, start, end),
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {
                Node::new(NodeType::Other, self.level, start, end)
            }
        };
        Ok(self.node.kind != NodeType::EndOfDocument)
    }

    #[inline]
    fn position(&self) -> usize {
        self.inner.buffer_position() as usize
    }

    fn next_event(&mut self) -> Result<(usize, Event<'i>)> {
        if let Some(stashed) = self.lookahead.take() {
            return Ok(stashed);
        }
        let start = self.position();
        Ok((start, self.inner.read_event()?))
    }

    /// Builds a text node, pulling in all text and references that follow.
    fn text(&mut self, mut text: String, start: usize) -> Result<Node> {
        let mut end = self.position();
        loop {
            let (offset, event) = self.next_event()?;
            match event {
                Event::Text(e) => text.push_str(&e.decode()?),
                Event::GeneralRef(e) => {
                    let resolved = self.resolve_reference(&e)?;
                    text.push_str(&resolved);
                }
                event => {
                    self.lookahead = Some((offset, event));
                    break;
                }
            }
            end = self.position();
        }
        let kind = if text.bytes().all(is_xml_space) {
            NodeType::Whitespace
        } else {
            NodeType::Text
        };
        let mut node = Node::new(kind, self.level, start, end);
        node.text = text;
        Ok(node)
    }

    fn resolve_reference(&self, reference: &BytesRef) -> Result<String> {
        if let Some(ch) = reference.resolve_char_ref()? {
            return Ok(ch.to_string());
        }
        let name = reference.decode()?;
        if let Some(text) = quick_xml::escape::resolve_predefined_entity(&name) {
            return Ok(text.to_string());
        }
        #[cfg(feature = "escape-html")]
        if let Some(text) = quick_xml::escape::resolve_html5_entity(&name) {
            return Ok(text.to_string());
        }
        Err(ParseError::UnknownEntity(name.into_owned()).into())
    }

    fn element(&mut self, e: BytesStart<'i>, start: usize, end: usize, empty: bool) -> Result<Node> {
        let decoder = self.inner.decoder();
        let mut node = Node::new(NodeType::Element, self.level, start, end);
        node.empty = empty;

        let (resolved, local) = self.inner.resolve_element(e.name());
        node.namespace = namespace_of(resolved, decoder)?.unwrap_or_default();
        node.local_name = decoder.decode(local.as_ref())?.into_owned();

        for attr in e.attributes() {
            let attr = attr?;
            let value = attr.decode_and_unescape_value(decoder)?.into_owned();
            if let Some(declaration) = attr.key.as_namespace_binding() {
                let prefix = match declaration {
                    PrefixDeclaration::Default => None,
                    PrefixDeclaration::Named(prefix) => Some(decoder.decode(prefix)?.into_owned()),
                };
                self.bindings.push(Binding {
                    depth: node.depth,
                    prefix,
                    namespace: value,
                });
                continue;
            }
            let (resolved, local) = self.inner.resolve_attribute(attr.key);
            let local = decoder.decode(local.as_ref())?;
            let key = match namespace_of(resolved, decoder)? {
                Some(namespace) => name::combine(&namespace, &local),
                None => local.into_owned(),
            };
            node.attributes.insert(key, value);
        }
        Ok(node)
    }
}

/// `None` when the name is not in any namespace.
fn namespace_of(resolved: ResolveResult, decoder: Decoder) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Ok(Some(decoder.decode(namespace.as_ref())?.into_owned()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => {
            let prefix = decoder.decode(&prefix)?.into_owned();
            Err(Error::Parse(ParseError::UnboundPrefix(prefix)))
        }
    }
}

#[inline]
pub(crate) const fn is_xml_space(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\n' | b'\t')
}
