use crate::de::{self, Decode};
use crate::errors::Result;
use crate::reader::Reader;
use crate::se::{self, Encode};
use crate::value::{Map, Value};
use crate::writer::Writer;

/// Child elements with unique names, decoded into a [`Value::Map`] keyed by
/// their clark-notation names.
///
/// Values of the children are decoded with the registered decoders, their
/// attributes are dropped. When written, each entry becomes one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyValue(pub Map);

impl Decode for KeyValue {
    fn decode(reader: &mut Reader<'_>) -> Result<Value> {
        de::key_value(reader, None).map(Value::Map)
    }
}

impl Encode for KeyValue {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        se::entries(writer, &self.0)
    }
}
