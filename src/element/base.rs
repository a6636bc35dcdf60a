use crate::de::Decode;
use crate::errors::Result;
use crate::reader::Reader;
use crate::se::Encode;
use crate::value::Value;
use crate::writer::Writer;

/// Generic content: decoded with [`Reader::decode_inner_tree`] and written
/// with [`Writer::write`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Base(pub Value);

impl Decode for Base {
    fn decode(reader: &mut Reader<'_>) -> Result<Value> {
        reader.decode_inner_tree(None)
    }
}

impl Encode for Base {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write(&self.0)
    }
}
