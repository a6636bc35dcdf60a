//! Mapping between plain Rust structs and XML elements.
//!
//! A value object is a struct whose fields are the child elements of one XML
//! element, all in one namespace. The [`value_object!`](crate::value_object!)
//! macro describes the fields of a struct; [`de::value_object`] and
//! [`se::value_object`] read and write it, and
//! [`Service::map_value_object`] registers both for an element name.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::{value_object, Service};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Person {
//!     first_name: String,
//!     age: Option<u32>,
//!     links: Vec<String>,
//! }
//! value_object!(Person { first_name => "firstName", age, links => "link" });
//!
//! let mut service = Service::new();
//! service.map_value_object::<Person>("{urn:people}person").unwrap();
//!
//! let (_, value) = service.parse(r#"
//!     <person xmlns="urn:people">
//!         <firstName>Harry</firstName>
//!         <link>http://example.org/</link>
//!         <link>http://example.net/</link>
//!     </person>
//! "#, None).unwrap();
//!
//! assert_eq!(value.downcast_ref::<Person>(), Some(&Person {
//!     first_name: "Harry".into(),
//!     age: None,
//!     links: vec!["http://example.org/".into(), "http://example.net/".into()],
//! }));
//! ```
//!
//! [`de::value_object`]: crate::de::value_object
//! [`se::value_object`]: crate::se::value_object
//! [`Service::map_value_object`]: crate::Service::map_value_object

use crate::errors::{Error, ParseError, Result};
use crate::value::Value;
use std::fmt;

/// A struct whose fields are mapped to child elements.
///
/// Usually implemented with the [`value_object!`](crate::value_object!) macro.
pub trait ValueObject: Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Element local names and values of all fields, in declaration order.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Returns `true` if a field is mapped to the element local name `name`.
    fn has_field(name: &str) -> bool;

    /// Assigns a decoded value to the field mapped to `name`. List fields
    /// receive one item per call. Returns `false` if there is no such field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<bool>;
}

/// Conversion between a field type and a [`Value`].
pub trait FieldValue: Sized {
    /// Converts a decoded value. [`Value::Null`], the value of an empty
    /// element, converts to the default of scalar types.
    fn from_value(value: Value) -> Result<Self>;

    /// Converts the field into a value for the writer.
    fn to_value(&self) -> Value;

    /// Stores a decoded value into the field. Lists append to themselves,
    /// other types replace their content.
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

/// Conversion error without the element name, which is filled in by the caller.
fn invalid(message: String) -> Error {
    ParseError::InvalidValue {
        element: String::new(),
        message,
    }
    .into()
}

fn mismatch<T>(value: &Value) -> Error {
    invalid(format!(
        "expected {}, found {}",
        std::any::type_name::<T>(),
        value.type_name()
    ))
}

impl FieldValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            value => Err(mismatch::<Self>(&value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FieldValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                s => Err(invalid(format!("`{}` is not a boolean", s))),
            },
            value => Err(mismatch::<Self>(&value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! integer_field {
    ($($ty:ty),+) => {$(
        impl FieldValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0),
                    Value::Integer(i) => <$ty>::try_from(i).map_err(|e| invalid(e.to_string())),
                    Value::String(s) => s
                        .trim()
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(e.to_string())),
                    value => Err(mismatch::<Self>(&value)),
                }
            }

            fn to_value(&self) -> Value {
                i64::try_from(*self).map_or_else(|_| Value::String(self.to_string()), Value::Integer)
            }
        }
    )+};
}

integer_field!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! float_field {
    ($($ty:ty),+) => {$(
        impl FieldValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0.0),
                    Value::Float(f) => Ok(f as $ty),
                    Value::Integer(i) => Ok(i as $ty),
                    Value::String(s) => s
                        .trim()
                        .parse()
                        .map_err(|e: std::num::ParseFloatError| invalid(e.to_string())),
                    value => Err(mismatch::<Self>(&value)),
                }
            }

            fn to_value(&self) -> Value {
                Value::Float(f64::from(*self))
            }
        }
    )+};
}

float_field!(f32, f64);

impl FieldValue for Value {
    #[inline]
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    #[inline]
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            value => Ok(vec![T::from_value(value)?]),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn assign(&mut self, value: Value) -> Result<()> {
        self.push(T::from_value(value)?);
        Ok(())
    }
}

/// Extracts a value object of type `T` from a decoded value.
///
/// Used by the [`FieldValue`] implementation that
/// [`value_object!`](crate::value_object!) generates, so value objects can be
/// nested in each other.
pub fn from_object<T: ValueObject>(value: Value) -> Result<T> {
    match value {
        Value::Null => Ok(T::default()),
        Value::Object(object) => match object.downcast_ref::<T>() {
            Some(value) => Ok(value.clone()),
            None => Err(invalid(format!(
                "expected {}, found {}",
                std::any::type_name::<T>(),
                object.type_name()
            ))),
        },
        value => Err(mismatch::<T>(&value)),
    }
}

/// Implements [`ValueObject`] and [`FieldValue`] for a struct.
///
/// Every listed field is mapped to the child element with the same local name,
/// unless another name is given after `=>`. Field types must implement
/// [`FieldValue`]; this includes other value objects.
///
/// ```
/// # use xml_binding::value_object;
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Status {
///     id: u32,
///     label: String,
/// }
/// value_object!(Status { id, label => "statusLabel" });
/// ```
#[macro_export]
macro_rules! value_object {
    ($ty:ty { $($field:ident $(=> $element:literal)?),* $(,)? }) => {
        impl $crate::value_object::ValueObject for $ty {
            fn fields(&self) -> ::std::vec::Vec<(&'static str, $crate::Value)> {
                ::std::vec![$((
                    $crate::__field_element!($field $(, $element)?),
                    $crate::value_object::FieldValue::to_value(&self.$field),
                ),)*]
            }

            fn has_field(name: &str) -> bool {
                $(name == $crate::__field_element!($field $(, $element)?) ||)* false
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> $crate::Result<bool> {
                $(
                    if name == $crate::__field_element!($field $(, $element)?) {
                        $crate::value_object::FieldValue::assign(&mut self.$field, value)?;
                        return ::std::result::Result::Ok(true);
                    }
                )*
                let _ = value;
                ::std::result::Result::Ok(false)
            }
        }

        impl $crate::value_object::FieldValue for $ty {
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::value_object::from_object(value)
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::object(::std::clone::Clone::clone(self))
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_element {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $element:literal) => {
        $element
    };
}
