//! Owned XML tree and response validation.
//!
//! Armory responses are small, so the whole document is parsed into an
//! [`XmlNode`] tree up front. Validation then checks every element for an
//! `errCode` attribute before handing back the `<page>` root.

use crate::error::{ArmoryError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Attribute the service uses to report semantic failures
pub const ERROR_CODE_ATTRIBUTE: &str = "errCode";

/// Top-level content element of every successful response
pub const PAGE_ELEMENT: &str = "page";

/// Deepest element nesting accepted in a response
pub const MAX_DEPTH: usize = 256;

/// An element with its attributes, text and child elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Concatenated text content directly inside this element
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Direct children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
    }

    /// First descendant (depth-first, document order) with the given name.
    /// The node itself is not considered.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        let mut pending: Vec<&XmlNode> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            if node.name == name {
                return Some(node);
            }
            pending.extend(node.children.iter().rev());
        }
        None
    }

    /// Follow a path of direct children
    pub fn path(&self, names: &[&str]) -> Option<&XmlNode> {
        names
            .iter()
            .try_fold(self, |node, name| node.child(name))
    }

    /// First element in the subtree, including this one, that carries `attribute`
    pub fn find_with_attr(&self, attribute: &str) -> Option<&XmlNode> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.attr(attribute).is_some() {
                return Some(node);
            }
            pending.extend(node.children.iter().rev());
        }
        None
    }

    /// Write this element and its subtree back out as XML
    pub fn to_xml(&self) -> Result<String> {
        enum Step<'a> {
            Open(&'a XmlNode),
            Close(&'a str),
        }

        let mut writer = Writer::new(Vec::new());
        let mut pending = vec![Step::Open(self)];
        while let Some(step) = pending.pop() {
            let event = match step {
                Step::Open(node) => {
                    let start = BytesStart::new(node.name.as_str()).with_attributes(
                        node.attributes
                            .iter()
                            .map(|(key, value)| (key.as_str(), value.as_str())),
                    );
                    writer
                        .write_event(Event::Start(start))
                        .map_err(|e| ArmoryError::extraction(self.name(), e.to_string()))?;

                    pending.push(Step::Close(&node.name));
                    pending.extend(node.children.iter().rev().map(Step::Open));
                    if node.text.is_empty() {
                        continue;
                    }
                    Event::Text(BytesText::new(&node.text))
                }
                Step::Close(name) => Event::End(BytesEnd::new(name)),
            };
            writer
                .write_event(event)
                .map_err(|e| ArmoryError::extraction(self.name(), e.to_string()))?;
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| ArmoryError::extraction(self.name(), e.to_string()))
    }

    /// Deserialize this element into a serde model
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let xml = self.to_xml()?;
        quick_xml::de::from_str(&xml)
            .map_err(|e| ArmoryError::extraction(self.name(), e.to_string()))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> std::result::Result<XmlNode, String> {
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlNode {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..Default::default()
    })
}

/// Parse a whole document into its root element.
///
/// A document with no root element at all (an empty body, or only a
/// declaration) is not an error and yields `Ok(None)`.
pub fn parse_document(raw: &[u8]) -> Result<Option<XmlNode>> {
    parse_tree(raw).map_err(|message| {
        let input = String::from_utf8_lossy(raw).into_owned();
        warn!("Failed to parse XML response: {}", message);
        warn!("Response content: {}", input);
        ArmoryError::malformed(message, input)
    })
}

fn parse_tree(raw: &[u8]) -> std::result::Result<Option<XmlNode>, String> {
    let content = std::str::from_utf8(raw).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("{} at position {}", e, reader.buffer_position())
        })?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err("multiple root elements".to_string());
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(format!(
                        "nesting too deep at position {}",
                        reader.buffer_position()
                    ));
                }
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_some() => return Err("multiple root elements".to_string()),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside of the root element".to_string()),
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }

    Ok(root)
}

/// Validate a raw response body.
///
/// Fails with the mapped service error for the first `errCode` found anywhere
/// in the document. Otherwise returns the `<page>` element, or `None` when the
/// document has no page (the service answers some misses with an empty body).
pub fn validate(raw: &[u8]) -> Result<Option<XmlNode>> {
    let Some(root) = parse_document(raw)? else {
        return Ok(None);
    };

    if let Some(code) = root
        .find_with_attr(ERROR_CODE_ATTRIBUTE)
        .and_then(|node| node.attr(ERROR_CODE_ATTRIBUTE))
    {
        return Err(ArmoryError::from_service_code(code));
    }

    if root.name == PAGE_ELEMENT {
        Ok(Some(root))
    } else {
        Ok(root.find(PAGE_ELEMENT).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_shape() {
        let root = parse_document(
            br#"<?xml version="1.0"?><page globalSearch="1"><a x="1">hi &amp; bye</a><b/><a x="2"/></page>"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(root.name(), "page");
        assert_eq!(root.attr("globalSearch"), Some("1"));
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.child_text("a"), Some("hi & bye"));
        let xs: Vec<_> = root.children_named("a").filter_map(|a| a.attr("x")).collect();
        assert_eq!(xs, vec!["1", "2"]);
    }

    #[test]
    fn test_find_is_depth_first() {
        let root = parse_document(b"<r><a><t n=\"1\"/></a><t n=\"2\"/></r>")
            .unwrap()
            .unwrap();
        assert_eq!(root.find("t").and_then(|t| t.attr("n")), Some("1"));
        assert_eq!(root.path(&["a", "t"]).and_then(|t| t.attr("n")), Some("1"));
        assert!(root.path(&["a", "missing"]).is_none());
    }

    #[test]
    fn test_find_walks_deep_trees() {
        let depth = MAX_DEPTH - 2;
        let raw = format!(
            "<page>{}<leaf errCode=\"noItem\"/>{}</page>",
            "<a>".repeat(depth),
            "</a>".repeat(depth)
        );
        let root = parse_document(raw.as_bytes()).unwrap().unwrap();
        assert!(root.find("leaf").is_some());
        assert_eq!(
            root.find_with_attr(ERROR_CODE_ATTRIBUTE).map(XmlNode::name),
            Some("leaf")
        );
        assert!(matches!(validate(raw.as_bytes()), Err(ArmoryError::ItemNotFound)));
    }

    #[test]
    fn test_nesting_too_deep_is_malformed() {
        let raw = format!(
            "<page>{}{}</page>",
            "<a>".repeat(20_000),
            "</a>".repeat(20_000)
        );
        match validate(raw.as_bytes()) {
            Err(ArmoryError::MalformedResponse { message, .. }) => {
                assert!(message.contains("nesting too deep"));
            }
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn test_to_xml_reparses_to_same_tree() {
        let root = parse_document(
            br#"<page><item id="1" name="A &amp; B"/><tooltip><name>x &lt; y</name></tooltip></page>"#,
        )
        .unwrap()
        .unwrap();

        let written = root.to_xml().unwrap();
        assert_eq!(parse_document(written.as_bytes()).unwrap(), Some(root));
    }

    #[test]
    fn test_deserialize_attributes() {
        #[derive(serde::Deserialize)]
        struct Item {
            #[serde(rename = "@id")]
            id: u32,
            #[serde(rename = "@name")]
            name: String,
        }

        let root = parse_document(br#"<item id="7" name="A &amp; B" extra="1"/>"#)
            .unwrap()
            .unwrap();
        let item: Item = root.deserialize().unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.name, "A & B");

        let bad = parse_document(br#"<item id="x" name="A"/>"#).unwrap().unwrap();
        assert!(matches!(
            bad.deserialize::<Item>(),
            Err(ArmoryError::Extraction { .. })
        ));
    }

    #[test]
    fn test_empty_document_is_not_an_error() {
        assert_eq!(parse_document(b"").unwrap(), None);
        assert_eq!(parse_document(b"<?xml version=\"1.0\"?>\n").unwrap(), None);
    }

    #[test]
    fn test_malformed_document_keeps_input() {
        match parse_document(b"<page><open></page>") {
            Err(ArmoryError::MalformedResponse { input, .. }) => {
                assert_eq!(input, "<page><open></page>");
            }
            other => panic!("expected malformed response, got {other:?}"),
        }

        assert!(matches!(
            parse_document(b"<page>"),
            Err(ArmoryError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_document(b"not xml at all"),
            Err(ArmoryError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_validate_returns_page() {
        let page = validate(b"<page><itemInfo/></page>").unwrap().unwrap();
        assert_eq!(page.name(), "page");
        assert!(page.child("itemInfo").is_some());
    }

    #[test]
    fn test_validate_without_page_is_no_content() {
        assert_eq!(validate(b"<other><x/></other>").unwrap(), None);
        assert_eq!(validate(b"").unwrap(), None);
    }

    #[test]
    fn test_validate_error_code_wins_over_content() {
        let raw = br#"<page><characterInfo errCode="noCharacter"/><guildInfo><guildHeader name="x"/></guildInfo></page>"#;
        assert!(matches!(validate(raw), Err(ArmoryError::CharacterNotFound)));
    }

    #[test]
    fn test_validate_first_error_code_in_document_order() {
        let raw = br#"<page><a><b errCode="noGuild"/></a><c errCode="noItem"/></page>"#;
        assert!(matches!(validate(raw), Err(ArmoryError::GuildNotFound)));
    }

    #[test]
    fn test_validate_unmapped_code() {
        match validate(br#"<page><x errCode="down"/></page>"#) {
            Err(ArmoryError::UnmappedServiceError { code }) => assert_eq!(code, "down"),
            other => panic!("expected unmapped error, got {other:?}"),
        }
    }
}
