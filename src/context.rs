//! Scoped configuration shared by the [`Reader`] and the [`Writer`].
//!
//! A [`Context`] holds the registries: element decoders, namespace prefixes,
//! type encoders and the base URI of the document. The reader and the writer
//! keep it in a [`ContextStack`], so a decoder or an encoder can override the
//! registries for a sub-tree and restore them afterwards.

use crate::de::Decode;
use crate::errors::{ConfigError, Result};
use crate::reader::Reader;
use crate::value::{Map, Value};
use crate::writer::Writer;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Element decoders keyed by the clark-notation name of the element.
pub type DecoderMap = HashMap<String, Decoder>;
/// Encoders keyed by the type they serialize.
pub type EncoderMap = HashMap<TypeId, Encoder>;
/// Namespace URI to prefix. An empty prefix makes the namespace the default one.
pub type NamespaceMap = Map<String>;

/// A function that decodes the element the reader is positioned on.
type DecodeFn = dyn Fn(&mut Reader<'_>) -> Result<Value> + Send + Sync;
type EncodeFn = dyn Fn(&mut Writer, &dyn Any) -> Result<()> + Send + Sync;

/// An entry of the decoder registry.
///
/// Every decoder is called with the reader positioned on the start tag of
/// its element and must leave the reader on the node following the end tag
/// of that element.
#[derive(Clone)]
pub enum Decoder {
    /// An arbitrary closure
    Function(Arc<DecodeFn>),
    /// A type implementing [`Decode`]
    Type {
        /// Name of the type, for diagnostics
        name: &'static str,
        /// The [`Decode::decode`] function of the type
        decode: fn(&mut Reader<'_>) -> Result<Value>,
    },
    /// An entry that cannot decode anything. Registering it is allowed, but
    /// dispatching an element to it fails with [`ConfigError::InvalidDecoder`]
    Invalid(String),
}

impl Decoder {
    /// Creates a decoder from a closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut Reader<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Creates a decoder from a type implementing [`Decode`].
    pub fn of<T: Decode>() -> Self {
        Self::Type {
            name: std::any::type_name::<T>(),
            decode: T::decode,
        }
    }

    /// Decodes the element named `element`, on which the reader is positioned.
    pub fn decode(&self, element: &str, reader: &mut Reader<'_>) -> Result<Value> {
        match self {
            Self::Function(f) => f(reader),
            Self::Type { decode, .. } => decode(reader),
            Self::Invalid(reason) => Err(ConfigError::InvalidDecoder {
                element: element.to_string(),
                reason: reason.clone(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Type { name, .. } => f.debug_tuple("Type").field(name).finish(),
            Self::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An entry of the encoder registry: writes the inner XML of an element for
/// a value of one type.
#[derive(Clone)]
pub struct Encoder {
    type_name: &'static str,
    encode: Arc<EncodeFn>,
}

impl Encoder {
    /// Creates an encoder for values of type `T`.
    pub fn new<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&mut Writer, &T) -> Result<()> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        Self {
            type_name,
            encode: Arc::new(move |writer: &mut Writer, value: &dyn Any| {
                match value.downcast_ref::<T>() {
                    Some(value) => f(writer, value),
                    None => Err(ConfigError::Unserializable(type_name).into()),
                }
            }),
        }
    }

    /// Writes `value`, which must have the type this encoder was created for.
    #[inline]
    pub fn encode(&self, writer: &mut Writer, value: &dyn Any) -> Result<()> {
        (self.encode)(writer, value)
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Encoder").field(&self.type_name).finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registries used while reading or writing a document.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Decoders of elements, by clark-notation name. Elements without a
    /// decoder are decoded with [`Base`](crate::element::Base)
    pub decoders: DecoderMap,
    /// Prefixes that the writer uses for namespaces
    pub namespaces: NamespaceMap,
    /// Encoders of [`Object`](crate::Object) values, by type
    pub encoders: EncoderMap,
    /// URI of the document, used to resolve relative URIs
    pub base_uri: String,
}

/// The live [`Context`] with the snapshots taken by [`push`](Self::push).
///
/// Dereferences to the live context.
#[derive(Clone, Debug, Default)]
pub struct ContextStack {
    current: Context,
    saved: Vec<Context>,
}

impl ContextStack {
    /// Creates a stack with `context` as the live context.
    pub fn new(context: Context) -> Self {
        Self {
            current: context,
            saved: Vec::new(),
        }
    }

    /// Saves a copy of the live context. Later changes of the live context do
    /// not affect the copy.
    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restores the context saved by the last [`push`](Self::push).
    ///
    /// # Panics
    ///
    /// Panics if there is no saved context.
    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(context) => self.current = context,
            None => panic!("context stack underflow: `pop` without a matching `push`"),
        }
    }

    /// Number of saved contexts.
    #[inline]
    pub fn saved(&self) -> usize {
        self.saved.len()
    }
}

impl Deref for ContextStack {
    type Target = Context;

    #[inline]
    fn deref(&self) -> &Context {
        &self.current
    }
}

impl DerefMut for ContextStack {
    #[inline]
    fn deref_mut(&mut self) -> &mut Context {
        &mut self.current
    }
}
