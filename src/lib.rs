//! Namespace-aware XML data binding.
//!
//! # Description
//!
//! xml-binding maps XML documents to a tree of [`Value`]s and back. Element
//! and attribute names are addressed in clark notation, `{namespace}local-name`,
//! so code never depends on the prefixes a document happens to use.
//!
//! - [`Reader`]: walks a document and dispatches every element to the
//!   [`Decoder`] registered for its name. Elements without a decoder are
//!   decoded generically into lists of [`Element`]s or text.
//! - [`Writer`]: writes values, choosing prefixes for namespaces from a
//!   registry or allocating ad-hoc ones.
//! - [`Service`]: keeps the registries and creates configured readers and
//!   writers. Also maps plain structs ("value objects", see [`value_object!`])
//!   to elements.
//!
//! The [`element`] module contains ready-made element types for common shapes
//! of content, and the [`de`] and [`se`] modules the building blocks to write
//! new ones.
//!
//! # Examples
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use xml_binding::element::KeyValue;
//! use xml_binding::{Decoder, Service, Value};
//!
//! let mut service = Service::new();
//! service.register_decoder("{DAV:}prop", Decoder::of::<KeyValue>());
//!
//! let value = service.expect(&["{DAV:}propfind"], r#"
//!     <d:propfind xmlns:d="DAV:">
//!         <d:prop><d:displayname/><d:getetag/></d:prop>
//!     </d:propfind>
//! "#, None).unwrap();
//!
//! let prop = value.elements().next().unwrap();
//! assert_eq!(prop.name, "{DAV:}prop");
//! assert_eq!(
//!     prop.value.as_map().unwrap().keys().collect::<Vec<_>>(),
//!     ["{DAV:}displayname", "{DAV:}getetag"],
//! );
//! ```
//!
//! # Features
//!
//! `xml-binding` supports the following features:
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!(
        feature_label = "<a id=\"{feature}\" href=\"#{feature}\"><strong><code>{feature}</code></strong></a>"
    ))
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod de;
pub mod element;
pub mod errors;
pub mod name;
pub mod reader;
pub mod se;
pub mod service;
pub mod value;
pub mod value_object;
pub mod writer;

// reexports
pub use crate::context::{Context, Decoder, DecoderMap, Encoder};
pub use crate::de::Decode;
pub use crate::errors::{Error, Result};
pub use crate::reader::{NodeType, Reader};
pub use crate::se::Encode;
pub use crate::service::{Config, Service};
pub use crate::value::{Deferred, Element, Map, Object, Value};
pub use crate::value_object::ValueObject;
pub use crate::writer::Writer;
