//! Namespace reconciliation of captured inner markup.
//!
//! Markup cut out of a document can use prefixes that are declared on one of
//! its ancestors. To keep such markup self-contained, each top-level element
//! of the captured markup receives the declarations of the inherited
//! namespaces that it or its descendants use without declaring them.

use crate::errors::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::PrefixDeclaration;
use quick_xml::{Reader, Writer};

/// Namespace declaration: `None` prefix for the default namespace.
type Declaration = (Option<String>, String);

/// Adds to each top-level element of `markup` the declarations from `scope`
/// that its sub-tree needs.
pub(crate) fn reconcile(markup: &str, scope: &[Declaration]) -> Result<String> {
    let scope: Vec<&Declaration> = scope
        .iter()
        .filter(|(prefix, namespace)| match prefix {
            Some(prefix) => prefix != "xml",
            None => !namespace.is_empty(),
        })
        .collect();
    if scope.is_empty() {
        return Ok(markup.to_string());
    }

    let needed = collect_needed(markup, &scope)?;
    if needed.iter().all(Vec::is_empty) {
        return Ok(markup.to_string());
    }

    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + 64));
    let mut needed = needed.into_iter();
    let mut depth = 0usize;
    loop {
        let event = reader.read_event()?;
        let event = match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    Event::Start(declare(e, needed.next().unwrap_or_default()))
                } else {
                    Event::Start(e)
                }
            }
            Event::Empty(e) if depth == 0 => {
                Event::Empty(declare(e, needed.next().unwrap_or_default()))
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                Event::End(e)
            }
            Event::Eof => break,
            event => event,
        };
        writer.write_event(event)?;
    }
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn declare<'a>(start: BytesStart<'a>, declarations: Vec<&Declaration>) -> BytesStart<'a> {
    let mut start = start;
    for (prefix, namespace) in declarations {
        match prefix {
            Some(prefix) => {
                start.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace.as_str()))
            }
            None => start.push_attribute(("xmlns", namespace.as_str())),
        }
    }
    start
}

/// For each top-level element, the inherited declarations its sub-tree needs.
fn collect_needed<'s>(markup: &str, scope: &[&'s Declaration]) -> Result<Vec<Vec<&'s Declaration>>> {
    let mut reader = Reader::from_str(markup);
    let decoder = reader.decoder();
    let mut result: Vec<Vec<&Declaration>> = Vec::new();
    // Prefixes declared by each open element of the current top-level sub-tree
    let mut declared: Vec<Vec<Option<String>>> = Vec::new();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => {
                declared.pop();
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };
        if declared.is_empty() {
            result.push(Vec::new());
        }

        let mut own = Vec::new();
        let mut used = vec![match e.name().prefix() {
            Some(prefix) => Some(decoder.decode(prefix.as_ref())?.into_owned()),
            None => None,
        }];
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_namespace_binding() {
                Some(PrefixDeclaration::Default) => own.push(None),
                Some(PrefixDeclaration::Named(prefix)) => {
                    own.push(Some(decoder.decode(prefix)?.into_owned()))
                }
                // Unprefixed attributes are in no namespace
                None => {
                    if let Some(prefix) = attr.key.prefix() {
                        used.push(Some(decoder.decode(prefix.as_ref())?.into_owned()));
                    }
                }
            }
        }
        declared.push(own);

        if let Some(needed) = result.last_mut() {
            for prefix in used {
                if declared.iter().flatten().any(|p| *p == prefix) {
                    continue;
                }
                if let Some(declaration) = scope.iter().find(|(p, _)| *p == prefix) {
                    if !needed.contains(declaration) {
                        needed.push(*declaration);
                    }
                }
            }
        }
        if empty {
            declared.pop();
        }
    }
    Ok(result)
}
