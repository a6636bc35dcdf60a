use crate::de::Decode;
use crate::errors::Result;
use crate::reader::{NodeType, Reader};
use crate::se::Encode;
use crate::value::Value;
use crate::writer::Writer;

/// Arbitrary markup kept as text.
///
/// When read, the markup gets declarations of all inherited namespaces it
/// uses, so it is well-formed on its own. It has no XML declaration and may
/// have no single root element, or no element at all.
///
/// When written, the markup is parsed and written again node by node, so the
/// namespaces are declared the way the writer declares them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlFragment(pub String);

impl Decode for XmlFragment {
    fn decode(reader: &mut Reader<'_>) -> Result<Value> {
        Ok(Value::encodable(XmlFragment(reader.read_inner_xml()?)))
    }
}

impl Encode for XmlFragment {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        // The container gives root-less markup a single root
        let markup = format!(
            r#"<xml-fragment xmlns="http://sabre.io/ns">{}</xml-fragment>"#,
            self.0
        );
        let mut reader = Reader::from_str(&markup);

        while reader.read()? {
            if reader.depth() < 1 {
                continue;
            }
            match reader.node_type() {
                NodeType::Element => {
                    writer.start_element(&reader.qualified_name().unwrap_or_default())?;
                    writer.write_attributes(reader.attributes())?;
                    if reader.is_empty_element() {
                        writer.end_element()?;
                    }
                }
                NodeType::Text | NodeType::Whitespace => {
                    writer.write_string(reader.text().unwrap_or_default())?;
                }
                NodeType::CData => writer.write_cdata(reader.text().unwrap_or_default())?,
                NodeType::EndElement => writer.end_element()?,
                NodeType::EndOfDocument | NodeType::Other => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Decoder;
    use crate::value::{Element, Map};
    use pretty_assertions::assert_eq;

    /// Pairs of fragment markup: as found in a document, and as read back
    /// from it inside `<root xmlns="http://sabredav.org/ns">`
    const READ: &[(&str, &str)] = &[
        ("hello", "hello"),
        (
            "<element>hello</element>",
            r#"<element xmlns="http://sabredav.org/ns">hello</element>"#,
        ),
        (
            r#"<element foo="bar">hello</element>"#,
            r#"<element foo="bar" xmlns="http://sabredav.org/ns">hello</element>"#,
        ),
        (
            r#"<element x1:foo="bar" xmlns:x1="http://example.org/ns">hello</element>"#,
            r#"<element x1:foo="bar" xmlns:x1="http://example.org/ns" xmlns="http://sabredav.org/ns">hello</element>"#,
        ),
        (
            r#"<element xmlns="http://example.org/ns">hello</element>"#,
            r#"<element xmlns="http://example.org/ns">hello</element>"#,
        ),
        (
            r#"<element xmlns:foo="http://example.org/ns">hello</element>"#,
            r#"<element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns">hello</element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns">hello</foo:element>"#,
            r#"<foo:element xmlns:foo="http://example.org/ns">hello</foo:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns"><child>hello</child></foo:element>"#,
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child>hello</child></foo:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns"><child/></foo:element>"#,
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child/></foo:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns"><child a="b"/></foo:element>"#,
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child a="b"/></foo:element>"#,
        ),
    ];

    #[test]
    fn decode() {
        for (input, expected) in READ {
            let document = format!(
                "<?xml version=\"1.0\"?>\n<root xmlns=\"http://sabredav.org/ns\">\n   <fragment>{}</fragment>\n</root>",
                input
            );
            let mut reader = Reader::from_str(&document);
            reader.context_mut().decoders.insert(
                "{http://sabredav.org/ns}fragment".into(),
                Decoder::of::<XmlFragment>(),
            );

            assert_eq!(
                reader.parse().unwrap(),
                Element::new(
                    "{http://sabredav.org/ns}root",
                    Value::List(vec![Element::new(
                        "{http://sabredav.org/ns}fragment",
                        Value::encodable(XmlFragment(expected.to_string())),
                    )
                    .into()])
                ),
                "input: {}",
                input
            );
        }
    }

    /// Pairs of fragment markup: as stored, and as written inside
    /// `<root xmlns="http://sabredav.org/ns">`
    const WRITE: &[(&str, &str)] = &[
        ("hello", "hello"),
        (
            r#"<element xmlns="http://sabredav.org/ns">hello</element>"#,
            "<element>hello</element>",
        ),
        (
            r#"<element xmlns="http://sabredav.org/ns" foo="bar">hello</element>"#,
            r#"<element foo="bar">hello</element>"#,
        ),
        (
            r#"<element xmlns:x1="http://example.org/ns" xmlns="http://sabredav.org/ns" x1:foo="bar">hello</element>"#,
            r#"<element x1:foo="bar" xmlns:x1="http://example.org/ns">hello</element>"#,
        ),
        (
            r#"<element xmlns="http://example.org/ns">hello</element>"#,
            r#"<x1:element xmlns:x1="http://example.org/ns">hello</x1:element>"#,
        ),
        (
            r#"<element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns">hello</element>"#,
            "<element>hello</element>",
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns">hello</foo:element>"#,
            r#"<x1:element xmlns:x1="http://example.org/ns">hello</x1:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child/></foo:element>"#,
            r#"<x1:element xmlns:x1="http://example.org/ns"><child/></x1:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child>hello</child></foo:element>"#,
            r#"<x1:element xmlns:x1="http://example.org/ns"><child>hello</child></x1:element>"#,
        ),
        (
            r#"<foo:element xmlns:foo="http://example.org/ns" xmlns="http://sabredav.org/ns"><child a="b"/></foo:element>"#,
            r#"<x1:element xmlns:x1="http://example.org/ns"><child a="b"/></x1:element>"#,
        ),
        (
            "<![CDATA[a < b]]> &amp; c",
            "<![CDATA[a < b]]> &amp; c",
        ),
    ];

    #[test]
    fn encode() {
        for (input, expected) in WRITE {
            let mut writer = Writer::new();
            writer
                .context_mut()
                .namespaces
                .insert("http://sabredav.org/ns", String::new());
            writer.start_document().unwrap();
            writer
                .write_element(
                    "{http://sabredav.org/ns}root",
                    &Value::Map(Map::from([(
                        "{http://sabredav.org/ns}fragment",
                        Value::encodable(XmlFragment(input.to_string())),
                    )])),
                )
                .unwrap();

            assert_eq!(
                writer.into_string().unwrap(),
                format!(
                    "<?xml version=\"1.0\"?>\n<root xmlns=\"http://sabredav.org/ns\"><fragment>{}</fragment></root>",
                    expected
                ),
                "input: {}",
                input
            );
        }
    }
}
