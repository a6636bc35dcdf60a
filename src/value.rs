//! Generic values produced by the [`Reader`] and consumed by the [`Writer`].
//!
//! [`Reader`]: crate::Reader
//! [`Writer`]: crate::Writer

use crate::errors::Result;
use crate::se::Encode;
use crate::writer::Writer;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// An insertion-ordered map with string keys.
///
/// Inserting a key that is already present replaces its value and keeps its
/// position. Two maps are equal only if their entries are equal in order.
#[derive(Clone)]
pub struct Map<V = Value> {
    entries: IndexMap<String, V>,
}

impl<V> Map<V> {
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Inserts a value, returning the previous value of that key, if any.
    #[inline]
    pub fn insert<K: Into<String>>(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Returns the value of the key, if present.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns a mutable reference to the value of the key, if present.
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Returns `true` if the map contains the key.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes a key and returns its value. Order of other entries is kept.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<V> Default for Map<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for Map<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<V: fmt::Debug> fmt::Debug for Map<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Map<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for Map<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

impl<V> IntoIterator for Map<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V, const N: usize> From<[(K, V); N]> for Map<V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The decode result of one XML element, and a named record for the writer.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Clark-notation name (or a plain name when writing)
    pub name: String,
    /// Decoded content, as returned by the element decoder
    pub value: Value,
    /// Attributes without namespace declarations. Attributes in no namespace
    /// are keyed by their local name, others by their clark-notation name
    pub attributes: Map<String>,
}

impl Element {
    /// Creates an element without attributes.
    pub fn new<N: Into<String>, V: Into<Value>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute, builder-style.
    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name, value.into());
        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Object-safe view of a value stored in an [`Object`].
trait Erased: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_encode(&self) -> Option<&dyn Encode>;
    fn type_name(&self) -> &'static str;
    fn eq_erased(&self, other: &dyn Erased) -> bool;
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

struct Plain<T>(T);
struct Encodable<T>(T);

impl<T> Erased for Plain<T>
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        &self.0
    }
    fn as_encode(&self) -> Option<&dyn Encode> {
        None
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
    fn eq_erased(&self, other: &dyn Erased) -> bool {
        other.as_any().downcast_ref::<T>() == Some(&self.0)
    }
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> Erased for Encodable<T>
where
    T: Encode + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        &self.0
    }
    fn as_encode(&self) -> Option<&dyn Encode> {
        Some(&self.0)
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
    fn eq_erased(&self, other: &dyn Erased) -> bool {
        other.as_any().downcast_ref::<T>() == Some(&self.0)
    }
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A typed value hidden behind a reference-counted, type-erased handle.
///
/// Objects are how decoders return their own types (for example
/// [`Uri`](crate::element::Uri)) and how the writer receives structs. An object
/// created with [`Object::encodable`] serializes itself; others are serialized
/// by the encoder registered for their type.
#[derive(Clone)]
pub struct Object(Arc<dyn Erased>);

impl Object {
    /// Wraps a value that is serialized by an encoder from the registry.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Self(Arc::new(Plain(value)))
    }

    /// Wraps a value that knows how to serialize itself.
    pub fn encodable<T>(value: T) -> Self
    where
        T: Encode + PartialEq,
    {
        Self(Arc::new(Encodable(value)))
    }

    /// Identity of the wrapped type, the key of the encoder registry.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        Any::type_id(self.0.as_any())
    }

    /// Name of the wrapped type, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Returns the wrapped value if it has type `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Returns the wrapped value as an [`Any`] reference.
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        self.0.as_any()
    }

    /// Returns the [`Encode`] capability, if the object was created with
    /// [`Object::encodable`].
    #[inline]
    pub fn as_encode(&self) -> Option<&dyn Encode> {
        self.0.as_encode()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_erased(other.0.as_ref())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_erased(f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A deferred write: the closure is called with the writer when the value is
/// reached, and writes the inner XML of the current element.
#[derive(Clone)]
pub struct Deferred(Arc<dyn Fn(&mut Writer) -> Result<()> + Send + Sync>);

impl Deferred {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Writer) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the closure against the writer.
    #[inline]
    pub fn call(&self, writer: &mut Writer) -> Result<()> {
        (self.0)(writer)
    }
}

impl PartialEq for Deferred {
    /// Closures are only equal to themselves
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deferred({:p})", Arc::as_ptr(&self.0))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A generic value tree.
///
/// The [`Reader`](crate::Reader) produces [`Null`], [`String`] and [`List`]s of
/// [`Element`]s with the default decoder; other decoders may return any variant.
/// The [`Writer`] accepts every variant, see [`Writer::write`].
///
/// [`Null`]: Self::Null
/// [`String`]: Self::String
/// [`List`]: Self::List
/// [`Element`]: Self::Element
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No content. Written as a self-closing element
    #[default]
    Null,
    /// Boolean scalar, written as `true` or `false`
    Bool(bool),
    /// Integer scalar
    Integer(i64),
    /// Floating-point scalar
    Float(f64),
    /// Text content
    String(String),
    /// Ordered sequence. When writing, every item must be an [`Element`](Self::Element)
    List(Vec<Value>),
    /// Ordered mapping from element names to values
    Map(Map),
    /// A named record: element name, value and attributes
    Element(Box<Element>),
    /// An unnamed record: value with attributes. Inside a [`Map`](Self::Map)
    /// the key supplies the element name
    Attributed(Box<Value>, Map<String>),
    /// A typed value, see [`Object`]
    Object(Object),
    /// A deferred write, see [`Deferred`]
    Deferred(Deferred),
}

impl Value {
    /// Wraps a value serialized by an encoder from the registry.
    #[inline]
    pub fn object<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Self::Object(Object::new(value))
    }

    /// Wraps a value that knows how to serialize itself.
    #[inline]
    pub fn encodable<T: Encode + PartialEq>(value: T) -> Self {
        Self::Object(Object::encodable(value))
    }

    /// Wraps a deferred-write closure.
    #[inline]
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&mut Writer) -> Result<()> + Send + Sync + 'static,
    {
        Self::Deferred(Deferred::new(f))
    }

    /// Creates an unnamed record with attributes.
    pub fn attributed<V: Into<Value>>(value: V, attributes: Map<String>) -> Self {
        Self::Attributed(Box::new(value.into()), attributes)
    }

    /// Returns `true` for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text of a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items of a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries of a [`Value::Map`].
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the record of a [`Value::Element`].
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the wrapped value of a [`Value::Object`] if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(o) => o.downcast_ref(),
            _ => None,
        }
    }

    /// Iterates over the elements of a [`Value::List`] produced by the reader,
    /// skipping anything that is not an element.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_element)
    }

    /// Name of the variant (or of the wrapped object type), for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Element(_) => "element",
            Self::Attributed(..) => "attributed value",
            Self::Object(o) => o.type_name(),
            Self::Deferred(_) => "deferred",
        }
    }
}

macro_rules! from_scalar {
    ($variant:ident: $($ty:ty),+) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        }
    )+};
}

from_scalar!(Bool: bool);
from_scalar!(Integer: i8, i16, i32, i64, u8, u16, u32);
from_scalar!(Float: f32, f64);
from_scalar!(String: String, &str);

impl From<Element> for Value {
    #[inline]
    fn from(element: Element) -> Self {
        Self::Element(Box::new(element))
    }
}

impl From<Map> for Value {
    #[inline]
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Object> for Value {
    #[inline]
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Deferred> for Value {
    #[inline]
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}
