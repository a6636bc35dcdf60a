use pretty_assertions::assert_eq;
use xml_binding::errors::{Error, ParseError};
use xml_binding::{value_object, Decoder, Element, Service, Value};

const DOCUMENT: &str = r#"<root xmlns="http://sabre.io/ns">
  <child>value</child>
</root>
"#;

fn children() -> Value {
    Value::from(vec![Element::new("{http://sabre.io/ns}child", "value")])
}

#[test]
fn reader_has_registries() {
    let mut service = Service::new();
    service.register_decoder("{http://sabre.io/ns}test", Decoder::standard("uri"));

    let reader = service.reader("<test/>");
    assert!(reader.context().decoders.contains_key("{http://sabre.io/ns}test"));
}

#[test]
fn writer_has_registries() {
    let mut service = Service::new();
    service.register_namespace("http://sabre.io/ns", "s");

    let writer = service.writer();
    assert_eq!(
        writer.context().namespaces.get("http://sabre.io/ns"),
        Some(&"s".to_string())
    );
}

#[test]
fn parse() {
    let (root, value) = Service::new().parse(DOCUMENT, None).unwrap();
    assert_eq!(root, "{http://sabre.io/ns}root");
    assert_eq!(value, children());
}

#[test]
fn parse_stream() {
    let stream = std::io::Cursor::new(DOCUMENT.as_bytes().to_vec());
    let (root, value) = Service::new().parse_reader(stream, None).unwrap();
    assert_eq!(root, "{http://sabre.io/ns}root");
    assert_eq!(value, children());
}

#[test]
fn expect() {
    let value = Service::new()
        .expect(&["{http://sabre.io/ns}root"], DOCUMENT, None)
        .unwrap();
    assert_eq!(value, children());
}

#[test]
fn expect_wrong() {
    match Service::new().expect(&["{http://sabre.io/ns}error"], DOCUMENT, None) {
        Err(error @ Error::Parse(ParseError::UnexpectedRoot { .. })) => {
            let message = error.to_string();
            assert!(message.contains("{http://sabre.io/ns}error"), "{}", message);
            assert!(message.contains("{http://sabre.io/ns}root"), "{}", message);
        }
        x => panic!("Expected `UnexpectedRoot`, but got `{:?}`", x),
    }
}

#[test]
fn write() {
    let mut service = Service::new();
    service.register_namespace("http://sabre.io/ns", "s");

    let value = Value::Map([("{http://sabre.io/ns}child", Value::from("value"))].into());
    assert_eq!(
        service.write("{http://sabre.io/ns}root", &value, None).unwrap(),
        "<?xml version=\"1.0\"?>\n\
         <s:root xmlns:s=\"http://sabre.io/ns\">\n \
         <s:child>value</s:child>\n\
         </s:root>\n"
    );
}

fn compact(service: &mut Service) -> &mut Service {
    service.config_mut().indent(None).xml_declaration(false);
    service
}

#[test]
fn rewrite_xml_lang() {
    let mut service = Service::new();
    compact(&mut service);

    let (root, value) = service.parse(r#"<a><b xml:lang="en">t</b></a>"#, None).unwrap();
    let xml = service.write(&root, &value, None).unwrap();
    assert_eq!(xml, "<a xmlns=\"\"><b xmlns=\"\" xml:lang=\"en\">t</b></a>\n");
    assert_eq!(service.parse(&xml, None).unwrap(), (root, value));
}

#[test]
fn rewrite_reset_default_namespace() {
    let mut service = Service::new();
    compact(&mut service).register_namespace("urn:a", "");

    let input = r#"<root xmlns="urn:a"><e xmlns=""><child xmlns="urn:a"/></e></root>"#;
    let (root, value) = service.parse(input, None).unwrap();
    let xml = service.write(&root, &value, None).unwrap();
    assert_eq!(xml, format!("{}\n", input));
    assert_eq!(service.parse(&xml, None).unwrap(), (root, value));
}

#[test]
fn rewrite_with_registered_x1_prefix() {
    let mut service = Service::new();
    compact(&mut service).register_namespace("urn:r", "x1");

    let input = r#"<x1:root xmlns:x1="urn:r"><o:a xmlns:o="urn:other"><x1:b/></o:a></x1:root>"#;
    let (root, value) = service.parse(input, None).unwrap();
    let xml = service.write(&root, &value, None).unwrap();
    assert_eq!(
        xml,
        "<x1:root xmlns:x1=\"urn:r\"><x2:a xmlns:x2=\"urn:other\"><x1:b/></x2:a></x1:root>\n"
    );
    assert_eq!(service.parse(&xml, None).unwrap(), (root, value));
}

#[test]
fn write_text_with_registered_prefix() {
    let mut service = Service::new();
    service.register_namespace("http://sabredav.org/ns", "s");
    assert_eq!(
        service
            .write("{http://sabredav.org/ns}root", &Value::from("text"), None)
            .unwrap(),
        "<?xml version=\"1.0\"?>\n<s:root xmlns:s=\"http://sabredav.org/ns\">text</s:root>\n"
    );
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Order {
    id: String,
    amount: String,
    description: String,
    status: OrderStatus,
}
value_object!(Order { id, amount, description, status });

#[derive(Clone, Debug, Default, PartialEq)]
struct OrderStatus {
    id: u32,
    label: String,
}
value_object!(OrderStatus { id, label });

const ORDER: &str = r#"<?xml version="1.0"?>
<order xmlns="http://sabredav.org/ns">
 <id>1234</id>
 <amount>99.99</amount>
 <description>black friday deal</description>
 <status>
  <id>5</id>
  <label>processed</label>
 </status>
</order>
"#;

fn order_service() -> Service {
    let mut service = Service::new();
    service
        .map_value_object::<Order>("{http://sabredav.org/ns}order")
        .unwrap();
    service
        .map_value_object::<OrderStatus>("{http://sabredav.org/ns}status")
        .unwrap();
    service.register_namespace("http://sabredav.org/ns", "");
    service
}

#[test]
fn map_value_object() {
    let service = order_service();

    let (root, value) = service.parse(ORDER, None).unwrap();
    assert_eq!(root, "{http://sabredav.org/ns}order");
    let order = value.downcast_ref::<Order>().unwrap();
    assert_eq!(
        order,
        &Order {
            id: "1234".into(),
            amount: "99.99".into(),
            description: "black friday deal".into(),
            status: OrderStatus {
                id: 5,
                label: "processed".into(),
            },
        }
    );

    let written = service.write_value_object(order, None).unwrap();
    assert_eq!(written, ORDER);

    // The second pass is stable
    let (_, again) = service.parse(&written, None).unwrap();
    assert_eq!(again.downcast_ref::<Order>(), Some(order));
}

#[test]
fn invalid_field_value() {
    let service = order_service();
    let input = r#"<order xmlns="http://sabredav.org/ns"><status><id>five</id></status></order>"#;
    match service.parse(input, None) {
        Err(Error::Parse(ParseError::InvalidValue { element, .. })) => {
            assert_eq!(element, "{http://sabredav.org/ns}id")
        }
        x => panic!("Expected `InvalidValue`, but got `{:?}`", x),
    }
}

#[test]
fn split_qualified_name() {
    assert_eq!(
        Service::split_qualified_name("{http://sabredav.org/ns}elem").unwrap(),
        ("http://sabredav.org/ns", "elem")
    );
    assert_eq!(Service::split_qualified_name("{}elem").unwrap(), ("", "elem"));
    assert!(Service::split_qualified_name("http://sabredav.org/ns}elem").is_err());
}

#[test]
fn shared_between_threads() {
    let service = std::sync::Arc::new(order_service());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.parse(ORDER, None).map(|(root, _)| root))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "{http://sabredav.org/ns}order");
    }
}
