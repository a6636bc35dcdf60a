use crate::de::Decode;
use crate::errors::Result;
use crate::reader::Reader;
use crate::se::Encode;
use crate::value::Value;
use crate::writer::Writer;
use url::Url;

/// A single URI, such as `<d:href>/calendars/user/</d:href>`.
///
/// Relative URIs are resolved against the base URI of the context, both when
/// reading and when writing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uri(pub String);

impl Decode for Uri {
    fn decode(reader: &mut Reader<'_>) -> Result<Value> {
        let base = reader.context().base_uri.clone();
        let text = reader.read_text()?;
        Ok(Value::encodable(Uri(resolve(&base, &text))))
    }
}

impl Encode for Uri {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        let resolved = resolve(&writer.context().base_uri, &self.0);
        writer.write_string(&resolved)
    }
}

/// Resolves `relative` against `base`.
///
/// Returns `relative` unchanged if `base` is empty or not an absolute URI, or
/// if the two cannot be joined.
pub fn resolve(base: &str, relative: &str) -> String {
    if base.is_empty() {
        return relative.to_string();
    }
    match Url::parse(base).and_then(|base| base.join(relative)) {
        Ok(url) => url.into(),
        Err(_) => relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Decoder;
    use crate::value::{Element, Map};
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_relative() {
        assert_eq!(resolve("http://example.org/", "/foo/bar"), "http://example.org/foo/bar");
        assert_eq!(resolve("http://example.org/a/b", "c"), "http://example.org/a/c");
        assert_eq!(resolve("http://example.org/a/", "../c"), "http://example.org/c");
        assert_eq!(resolve("http://example.org/", "urn:x:y"), "urn:x:y");
    }

    #[test]
    fn resolve_without_base() {
        assert_eq!(resolve("", "/foo"), "/foo");
        assert_eq!(resolve("not a uri", "/foo"), "/foo");
    }

    #[test]
    fn decode() {
        let mut reader = Reader::from_str(
            r#"<?xml version="1.0"?>
<root xmlns="http://sabredav.org/ns">
  <uri>/foo/bar</uri>
</root>"#,
        );
        reader.context_mut().base_uri = "http://example.org/".into();
        reader
            .context_mut()
            .decoders
            .insert("{http://sabredav.org/ns}uri".into(), Decoder::of::<Uri>());

        assert_eq!(
            reader.parse().unwrap(),
            Element::new(
                "{http://sabredav.org/ns}root",
                Value::List(vec![Element::new(
                    "{http://sabredav.org/ns}uri",
                    Value::encodable(Uri("http://example.org/foo/bar".into())),
                )
                .into()])
            )
        );
    }

    #[test]
    fn equality_compares_stored_strings() {
        // No resolution happens on comparison
        assert_ne!(Uri("/foo".into()), Uri("http://example.org/foo".into()));

        let mut reader = Reader::from_str("<uri>/foo</uri>");
        reader.context_mut().base_uri = "http://example.org/".into();
        reader.read().unwrap();
        let decoded = Uri::decode(&mut reader).unwrap();
        assert_eq!(decoded, Value::encodable(Uri("http://example.org/foo".into())));
        assert_ne!(decoded, Value::encodable(Uri("/foo".into())));
    }

    #[test]
    fn encode() {
        let mut writer = Writer::with_indent(b' ', 1);
        writer
            .context_mut()
            .namespaces
            .insert("http://sabredav.org/ns", String::new());
        writer.context_mut().base_uri = "http://example.org/".into();
        writer.start_document().unwrap();
        writer
            .write_element(
                "{http://sabredav.org/ns}root",
                &Value::Map(Map::from([(
                    "{http://sabredav.org/ns}uri",
                    Value::encodable(Uri("/foo/bar".into())),
                )])),
            )
            .unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<?xml version=\"1.0\"?>\n\
             <root xmlns=\"http://sabredav.org/ns\">\n \
             <uri>http://example.org/foo/bar</uri>\n\
             </root>\n"
        );
    }
}
