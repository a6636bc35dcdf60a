use crate::errors::Result;
use crate::se::Encode;
use crate::writer::Writer;

/// Text written as a CDATA section.
///
/// There is no decoder for this type: when reading, CDATA sections are text
/// like any other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cdata(pub String);

impl Encode for Cdata {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_cdata(&self.0)
    }
}
