//! Error management module

use quick_xml::encoding::EncodingError;
use std::fmt;
use std::io::Error as IoError;
use std::sync::Arc;

/// An error returned when a string is not a valid clark-notation name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatError {
    /// The offending string
    pub input: String,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid clark-notation formatted string",
            self.input
        )
    }
}

impl std::error::Error for FormatError {}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An error raised while reading a document: either the markup itself is
/// malformed or it does not have the structure that the decoders expect.
#[derive(Clone, Debug)]
pub enum ParseError {
    /// Low-level error from the tokenizer, which includes format violations,
    /// mismatched tags and invalid attributes
    Xml(quick_xml::Error),
    /// Input cannot be decoded into a string
    Encoding(EncodingError),
    /// An entity reference which is neither predefined nor a character reference
    UnknownEntity(String),
    /// An element or attribute name uses a prefix that was not declared
    UnboundPrefix(String),
    /// The document ended while an element was still open. Most likely some
    /// decoder consumed more than its own element
    PrematureEnd,
    /// The document does not contain any element
    MissingRoot,
    /// The root element is not one of the expected ones
    UnexpectedRoot {
        /// Names that were acceptable, in clark notation
        expected: Vec<String>,
        /// Name of the actual root element, in clark notation
        found: String,
    },
    /// Content of an element cannot be converted to the type of the field
    /// it is mapped to
    InvalidValue {
        /// Clark-notation name of the element
        element: String,
        /// What went wrong
        message: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Xml(e) => write!(f, "malformed XML: {}", e),
            Self::Encoding(e) => write!(f, "{}", e),
            Self::UnknownEntity(name) => write!(f, "unknown entity `&{};`", name),
            Self::UnboundPrefix(prefix) => write!(f, "namespace prefix `{}` is not bound", prefix),
            Self::PrematureEnd => f.write_str(
                "we hit the end of the document prematurely. This likely means that some decoder \
                 consumes too many elements. Do not attempt to continue parsing",
            ),
            Self::MissingRoot => f.write_str("document does not contain a root element"),
            Self::UnexpectedRoot { expected, found } => write!(
                f,
                "expected {} but received {} as the root element",
                expected.join(" or "),
                found
            ),
            Self::InvalidValue { element, message } => {
                write!(f, "invalid value of element {}: {}", element, message)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(e) => Some(e),
            Self::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A programming error: the registries or the values passed to the writer are
/// not usable. These errors are not expected to be caught and retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The decoder registered for an element cannot decode anything
    InvalidDecoder {
        /// Clark-notation name of the element
        element: String,
        /// Why the registered entry is not usable
        reason: String,
    },
    /// A list entry passed to the writer is not a named element record
    UnnamedEntry {
        /// Position of the entry in the list
        index: usize,
    },
    /// The writer does not know how to serialize a value of this type
    Unserializable(&'static str),
    /// The type was not registered with [`Service::map_value_object`]
    ///
    /// [`Service::map_value_object`]: crate::Service::map_value_object
    UnregisteredType(&'static str),
    /// `end_element` was called with no open element
    NoOpenElement,
    /// An attribute was written while no start tag was open for attributes
    AttributeOutsideTag(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidDecoder { element, reason } => write!(
                f,
                "could not use this entry as a decoder for element {}: {}",
                element, reason
            ),
            Self::UnnamedEntry { index } => write!(
                f,
                "when writing a list every item must be an element with a name, \
                 but item {} is not",
                index
            ),
            Self::Unserializable(ty) => {
                write!(f, "the writer cannot serialize values of type `{}`", ty)
            }
            Self::UnregisteredType(ty) => write!(
                f,
                "`{}` is not a registered value object; map it with `map_value_object` first",
                ty
            ),
            Self::NoOpenElement => f.write_str("there is no open element to close"),
            Self::AttributeOutsideTag(name) => write!(
                f,
                "attribute `{}` written outside of a start tag",
                name
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The error type used by this crate.
#[derive(Clone, Debug)]
pub enum Error {
    /// Malformed clark-notation name supplied by the caller
    Format(FormatError),
    /// Malformed or structurally unexpected document
    Parse(ParseError),
    /// Misuse of the registries, reader or writer
    Config(ConfigError),
    /// Error while writing into the output sink
    Io(Arc<IoError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "format error: {}", e),
            Self::Parse(e) => write!(f, "parse error: {}", e),
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e.as_ref()),
        }
    }
}

impl From<FormatError> for Error {
    #[inline]
    fn from(error: FormatError) -> Self {
        Self::Format(error)
    }
}

impl From<ParseError> for Error {
    #[inline]
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<ConfigError> for Error {
    #[inline]
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<quick_xml::Error> for Error {
    /// Tokenizer errors never cross the library boundary unwrapped
    #[inline]
    fn from(error: quick_xml::Error) -> Self {
        Self::Parse(ParseError::Xml(error))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    #[inline]
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse(ParseError::Xml(quick_xml::Error::InvalidAttr(error)))
    }
}

impl From<EncodingError> for Error {
    #[inline]
    fn from(error: EncodingError) -> Self {
        Self::Parse(ParseError::Encoding(error))
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(error: IoError) -> Self {
        Self::Io(Arc::new(error))
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
