//! Ready-made element types.
//!
//! Each type covers a common shape of element content and implements
//! [`Decode`](crate::Decode), [`Encode`](crate::Encode) or both:
//!
//! | Type             | Content
//! |------------------|-----------------------------------------------------------
//! | [`Base`]         | anything; decoded generically, the default for elements without a decoder
//! | [`Cdata`]        | text written as a CDATA section (write only)
//! | [`Elements`]     | a list of empty child elements, such as `<d:resourcetype>`
//! | [`KeyValue`]     | child elements with unique names
//! | [`Uri`]          | a URI, resolved against the base URI of the document
//! | [`XmlFragment`]  | arbitrary markup, kept as text

use crate::context::Decoder;

mod base;
mod cdata;
mod elements;
mod fragment;
mod key_value;
mod uri;

pub use base::Base;
pub use cdata::Cdata;
pub use elements::Elements;
pub use fragment::XmlFragment;
pub use key_value::KeyValue;
pub use uri::{resolve, Uri};

impl Decoder {
    /// Returns the decoder of a ready-made element type by name: `base`,
    /// `elements`, `key-value`, `uri` or `xml-fragment`.
    ///
    /// Any other name returns a [`Decoder::Invalid`], which can be registered
    /// but fails when an element is dispatched to it.
    pub fn standard(name: &str) -> Self {
        match name {
            "base" => Self::of::<Base>(),
            "elements" => Self::of::<Elements>(),
            "key-value" => Self::of::<KeyValue>(),
            "uri" => Self::of::<Uri>(),
            "xml-fragment" => Self::of::<XmlFragment>(),
            _ => Self::Invalid(format!("`{}` is not a known element type", name)),
        }
    }
}
