//! Recursive-descent reader that turns a document into a [`Value`] tree.
//!
//! The [`Reader`] walks the document node by node. Each element is dispatched
//! to the [`Decoder`] registered for its clark-notation name in the current
//! [`Context`]; elements without a registered decoder are decoded generically
//! by [`decode_inner_tree`](Reader::decode_inner_tree).
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::{Element, Reader, Value};
//!
//! let mut reader = Reader::from_str(r#"<a xmlns="urn:test"><b/><c>text</c></a>"#);
//! let root = reader.parse().unwrap();
//!
//! assert_eq!(root.name, "{urn:test}a");
//! assert_eq!(root.value, Value::List(vec![
//!     Element::new("{urn:test}b", Value::Null).into(),
//!     Element::new("{urn:test}c", "text").into(),
//! ]));
//! ```

use crate::context::{Context, ContextStack, Decoder, DecoderMap};
use crate::element::Base;
use crate::errors::{ParseError, Result};
use crate::name;
use crate::value::{Element, Map, Value};
use tracing::{debug, trace};

mod cursor;
mod inner_xml;

use cursor::Cursor;
pub use cursor::NodeType;

/// A namespace-aware XML reader with a registry of element decoders.
pub struct Reader<'i> {
    cursor: Cursor<'i>,
    context: ContextStack,
}

impl<'i> Reader<'i> {
    /// Creates a reader over a string with an empty context.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'i str) -> Self {
        Self::new(Cursor::from_str(input))
    }

    /// Creates a reader over bytes with an empty context. With the `encoding`
    /// feature the encoding is detected from the BOM or the XML declaration,
    /// otherwise the input must be UTF-8.
    pub fn from_bytes(input: &'i [u8]) -> Self {
        Self::new(Cursor::from_bytes(input))
    }

    fn new(cursor: Cursor<'i>) -> Self {
        Self {
            cursor,
            context: ContextStack::default(),
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

    /// Runs `f` with `decoders` replacing the registered decoders.
    pub fn with_decoders<T, F>(&mut self, decoders: DecoderMap, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.with_context(|reader| {
            reader.context.decoders = decoders;
            f(reader)
        })
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Cursor

    /// Moves to the next node. Returns `false` once the end of document is reached.
    #[inline]
    pub fn read(&mut self) -> Result<bool> {
        self.cursor.read()
    }

    /// Moves to the node after the current element, skipping its content.
    /// On any other node behaves like [`read`](Self::read).
    pub fn skip(&mut self) -> Result<bool> {
        let node = self.cursor.node();
        if node.kind == NodeType::Element && !node.empty {
            let depth = node.depth;
            self.read_to_end(depth)?;
        }
        self.read()
    }

    /// Reads until the end tag at `depth`.
    fn read_to_end(&mut self, depth: usize) -> Result<()> {
        loop {
            if !self.read()? {
                return Err(self.premature_end());
            }
            let node = self.cursor.node();
            if node.kind == NodeType::EndElement && node.depth == depth {
                return Ok(());
            }
        }
    }

    pub(crate) fn premature_end(&self) -> crate::Error {
        debug!(
            depth = self.cursor.node().depth,
            "document ended before all elements were closed"
        );
        ParseError::PrematureEnd.into()
    }

    /// Kind of the current node.
    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.cursor.node().kind
    }

    /// Depth of the current node. The root element has depth 0, its content
    /// and its end tag depth 1 and 0.
    #[inline]
    pub fn depth(&self) -> usize {
        self.cursor.node().depth
    }

    /// Returns `true` if the reader is on a self-closing element.
    #[inline]
    pub fn is_empty_element(&self) -> bool {
        let node = self.cursor.node();
        node.kind == NodeType::Element && node.empty
    }

    /// Local name of the current element; empty on other nodes.
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.cursor.node().local_name
    }

    /// Namespace of the current element; empty if it is in no namespace or the
    /// reader is not on an element.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.cursor.node().namespace
    }

    /// Clark-notation name of the current element, or `None` if the reader is
    /// not on an element.
    pub fn qualified_name(&self) -> Option<String> {
        let node = self.cursor.node();
        match node.kind {
            NodeType::Element => Some(name::combine(&node.namespace, &node.local_name)),
            _ => None,
        }
    }

    /// Attributes of the current element. Namespace declarations are not
    /// included; attributes in a namespace are keyed by their clark-notation name.
    #[inline]
    pub fn attributes(&self) -> &Map<String> {
        &self.cursor.node().attributes
    }

    /// Content of the current text, CDATA or whitespace node.
    pub fn text(&self) -> Option<&str> {
        let node = self.cursor.node();
        match node.kind {
            NodeType::Text | NodeType::CData | NodeType::Whitespace => Some(&node.text),
            _ => None,
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Decoding

    /// Decodes the whole document: skips everything before the first element
    /// and decodes that element.
    pub fn parse(&mut self) -> Result<Element> {
        while self.node_type() != NodeType::Element {
            if !self.read()? {
                return Err(ParseError::MissingRoot.into());
            }
        }
        self.decode_current_element()
    }

    /// Decodes the element the reader is positioned on with the decoder
    /// registered for its name, and moves past it.
    pub fn decode_current_element(&mut self) -> Result<Element> {
        let name = self.qualified_name().unwrap_or_default();
        let attributes = self.attributes().clone();
        let decoder = self.decoder_for(&name);
        let value = decoder.decode(&name, self)?;

        Ok(Element {
            name,
            value,
            attributes,
        })
    }

    /// Returns the decoder registered for the clark-notation `name`, or the
    /// passthrough decoder of [`Base`].
    pub fn decoder_for(&self, name: &str) -> Decoder {
        match self.context.decoders.get(name) {
            Some(decoder) => {
                trace!(element = name, ?decoder, "dispatching element");
                decoder.clone()
            }
            None => {
                trace!(element = name, "no decoder registered, using passthrough");
                Decoder::of::<Base>()
            }
        }
    }

    /// Decodes the content of the current element and moves past it.
    ///
    /// Returns:
    /// - a [`Value::List`] of [`Value::Element`]s if the element has child
    ///   elements (text mixed with elements is discarded),
    /// - a [`Value::String`] if it has only text,
    /// - [`Value::Null`] if it is empty.
    ///
    /// If `overrides` is given, it replaces the registered decoders while the
    /// content is decoded.
    pub fn decode_inner_tree(&mut self, overrides: Option<DecoderMap>) -> Result<Value> {
        if self.is_empty_element() {
            self.skip()?;
            return Ok(Value::Null);
        }
        match overrides {
            Some(decoders) => self.with_decoders(decoders, Self::decode_content),
            None => self.decode_content(),
        }
    }

    fn decode_content(&mut self) -> Result<Value> {
        let mut text: Option<String> = None;
        let mut elements = Vec::new();

        if !self.read()? {
            return Err(self.premature_end());
        }
        loop {
            match self.node_type() {
                NodeType::Element => {
                    elements.push(Value::from(self.decode_current_element()?));
                }
                NodeType::Text | NodeType::CData => {
                    text.get_or_insert_with(String::new)
                        .push_str(&self.cursor.node().text);
                    self.read()?;
                }
                NodeType::EndElement => {
                    self.read()?;
                    break;
                }
                NodeType::EndOfDocument => return Err(self.premature_end()),
                NodeType::Whitespace | NodeType::Other => {
                    self.read()?;
                }
            }
        }

        Ok(if !elements.is_empty() {
            Value::List(elements)
        } else {
            text.map_or(Value::Null, Value::String)
        })
    }

    /// Decodes the content of the current element as a list of child
    /// elements. Text content is discarded.
    pub fn decode_elements(&mut self, overrides: Option<DecoderMap>) -> Result<Vec<Element>> {
        match self.decode_inner_tree(overrides)? {
            Value::List(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Element(element) => Some(*element),
                    _ => None,
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Concatenates all text, CDATA and whitespace inside the current element
    /// and moves past it.
    pub fn read_text(&mut self) -> Result<String> {
        let node = self.cursor.node();
        if node.kind != NodeType::Element || node.empty {
            let text = self.text().unwrap_or_default().to_string();
            self.skip()?;
            return Ok(text);
        }

        let depth = node.depth;
        let mut result = String::new();
        loop {
            if !self.read()? {
                return Err(self.premature_end());
            }
            let node = self.cursor.node();
            match node.kind {
                NodeType::Text | NodeType::CData | NodeType::Whitespace => {
                    result.push_str(&node.text)
                }
                NodeType::EndElement if node.depth == depth => break,
                _ => {}
            }
        }
        self.read()?;
        Ok(result)
    }

    /// Returns the markup inside the current element and moves past it.
    ///
    /// Top-level elements of the markup receive the declarations of the
    /// namespaces in scope that their sub-trees use, so the markup can be
    /// parsed on its own.
    pub fn read_inner_xml(&mut self) -> Result<String> {
        let node = self.cursor.node();
        if node.kind != NodeType::Element || node.empty {
            self.skip()?;
            return Ok(String::new());
        }

        let (start, depth) = (node.end, node.depth);
        let scope = self.cursor.in_scope();
        self.read_to_end(depth)?;
        let end = self.cursor.node().start;

        let markup = self.cursor.decoder().decode(&self.cursor.input()[start..end])?;
        let markup = inner_xml::reconcile(&markup, &scope)?;
        self.read()?;
        Ok(markup)
    }
}
