use crate::de::{self, Decode};
use crate::errors::Result;
use crate::reader::Reader;
use crate::se::{self, Encode};
use crate::value::Value;
use crate::writer::Writer;

/// A list of empty child elements, identified by their clark-notation names.
///
/// ```xml
/// <d:resourcetype xmlns:d="DAV:">
///   <d:collection/>
///   <x:calendar xmlns:x="urn:ietf:params:xml:ns:caldav"/>
/// </d:resourcetype>
/// ```
///
/// decodes into a [`Value::List`] of the strings `{DAV:}collection` and
/// `{urn:ietf:params:xml:ns:caldav}calendar`. Content of the children is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Elements(pub Vec<String>);

impl Decode for Elements {
    fn decode(reader: &mut Reader<'_>) -> Result<Value> {
        de::enumeration(reader, None).map(Value::from)
    }
}

impl Encode for Elements {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        se::enumeration(writer, &self.0)
    }
}
