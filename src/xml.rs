use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{CalendarError, Result};
use crate::models::FeedDate;

/// Decoded XML tree. Attributes are never kept and an element's children are
/// keyed by tag name; a tag seen more than once under the same parent turns
/// into a `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Null,
    Text(String),
    Date(FeedDate),
    Element(BTreeMap<String, XmlValue>),
    List(Vec<XmlValue>),
}

impl XmlValue {
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Element(children) => children.get(key),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a repeated tag; a tag seen once yields a single item.
    pub fn into_list(self) -> Vec<XmlValue> {
        match self {
            XmlValue::List(items) => items,
            XmlValue::Null => Vec::new(),
            other => vec![other],
        }
    }
}

pub type ValueProcessor = fn(XmlValue) -> XmlValue;

#[derive(Clone)]
pub struct ParserOptions {
    pub strip_prefix: bool,
    pub normalize_tags: bool,
    pub explicit_root: bool,
    pub trim: bool,
    pub value_processors: Vec<ValueProcessor>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            strip_prefix: true,
            normalize_tags: true,
            explicit_root: false,
            trim: true,
            value_processors: Vec::new(),
        }
    }
}

struct Frame {
    name: String,
    children: BTreeMap<String, XmlValue>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Frame { name, children: BTreeMap::new(), text: String::new() }
    }
}

fn tag_name(start: &BytesStart, options: &ParserOptions) -> Result<String> {
    let name = if options.strip_prefix {
        std::str::from_utf8(start.local_name().as_ref()).map(str::to_string)
    } else {
        std::str::from_utf8(start.name().as_ref()).map(str::to_string)
    }
    .map_err(|e| CalendarError::Decode(format!("tag name is not UTF-8: {}", e)))?;

    Ok(if options.normalize_tags { name.to_lowercase() } else { name })
}

fn insert_child(children: &mut BTreeMap<String, XmlValue>, name: String, value: XmlValue) {
    match children.remove(&name) {
        None => {
            children.insert(name, value);
        }
        Some(XmlValue::List(mut items)) => {
            items.push(value);
            children.insert(name, XmlValue::List(items));
        }
        Some(existing) => {
            children.insert(name, XmlValue::List(vec![existing, value]));
        }
    }
}

fn finish(frame: Frame, options: &ParserOptions) -> XmlValue {
    if !frame.children.is_empty() {
        return XmlValue::Element(frame.children);
    }

    let text = if options.trim { frame.text.trim().to_string() } else { frame.text };
    if text.is_empty() {
        return XmlValue::Null;
    }

    options
        .value_processors
        .iter()
        .fold(XmlValue::Text(text), |value, process| process(value))
}

/// Decode a whole document into an [`XmlValue`] tree.
pub fn parse(data: &str, options: &ParserOptions) -> Result<XmlValue> {
    let mut reader = Reader::from_str(data);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, XmlValue)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(Frame::new(tag_name(&e, options)?));
            }
            Ok(Event::Empty(e)) => {
                let name = tag_name(&e, options)?;
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, XmlValue::Null),
                    None => root = Some((name, XmlValue::Null)),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| CalendarError::Decode(e.to_string()))?;
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else {
                    return Err(CalendarError::Decode("unbalanced closing tag".to_string()));
                };
                let name = frame.name.clone();
                let value = finish(frame, options);
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value),
                    None => root = Some((name, value)),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CalendarError::Decode(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CalendarError::Decode("unexpected end of document".to_string()));
    }

    match root {
        Some((name, value)) if options.explicit_root => {
            Ok(XmlValue::Element(BTreeMap::from([(name, value)])))
        }
        Some((_, value)) => Ok(value),
        None => Err(CalendarError::Decode("document has no root element".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shout(value: XmlValue) -> XmlValue {
        match value {
            XmlValue::Text(s) => XmlValue::Text(s.to_uppercase()),
            other => other,
        }
    }

    #[test]
    fn test_parse_strips_prefixes_and_lowercases_tags() {
        let doc = r#"<rss xmlns:s="urn:x"><channel><Title> Feed </Title><s:GameId>42</s:GameId></channel></rss>"#;
        let tree = parse(doc, &ParserOptions::default()).unwrap();

        let channel = tree.get("channel").unwrap();
        assert_eq!(channel.get("title").and_then(XmlValue::as_text), Some("Feed"));
        assert_eq!(channel.get("gameid").and_then(XmlValue::as_text), Some("42"));
    }

    #[test]
    fn test_parse_repeated_tags_become_list() {
        let doc = "<rss><channel><item><a>1</a></item><item><a>2</a></item><item><a>3</a></item></channel></rss>";
        let tree = parse(doc, &ParserOptions::default()).unwrap();
        let items = tree.get("channel").unwrap().get("item").cloned().unwrap().into_list();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].get("a").and_then(XmlValue::as_text), Some("3"));

        let single = "<rss><channel><item><a>1</a></item></channel></rss>";
        let tree = parse(single, &ParserOptions::default()).unwrap();
        let items = tree.get("channel").unwrap().get("item").cloned().unwrap().into_list();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_ignores_attributes_and_decodes_entities() {
        let doc = r#"<root><t kind="x">Swimming &amp; Diving</t><c><![CDATA[a < b]]></c><e/></root>"#;
        let tree = parse(doc, &ParserOptions::default()).unwrap();
        assert_eq!(tree.get("t").and_then(XmlValue::as_text), Some("Swimming & Diving"));
        assert_eq!(tree.get("c").and_then(XmlValue::as_text), Some("a < b"));
        assert_eq!(tree.get("e"), Some(&XmlValue::Null));
    }

    #[test]
    fn test_parse_applies_value_processors_to_leaves() {
        let options = ParserOptions { value_processors: vec![shout], ..Default::default() };
        let tree = parse("<root><a>duke</a></root>", &options).unwrap();
        assert_eq!(tree.get("a").and_then(XmlValue::as_text), Some("DUKE"));
    }

    #[test]
    fn test_parse_explicit_root_keeps_root_name() {
        let options = ParserOptions { explicit_root: true, ..Default::default() };
        let tree = parse("<rss><a>1</a></rss>", &options).unwrap();
        assert!(tree.get("rss").and_then(|r| r.get("a")).is_some());
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        assert!(matches!(
            parse("<rss><channel></rss>", &ParserOptions::default()),
            Err(CalendarError::Decode(_))
        ));
        assert!(matches!(parse("", &ParserOptions::default()), Err(CalendarError::Decode(_))));
    }
}
