//! Raw XML element trees
//!
//! One [`Element`] is the fully-assembled subtree of a single dump entry,
//! built from decoder tokens. It is the input shape for the schema mappers:
//! the scanner assembles one element at a time, hands it to the mapper, and
//! drops it, so only one entry is ever held in memory.

use crate::decode::{DecodeError, XmlDecoder, XmlToken};
use std::io::BufRead;

/// A raw XML element: tag name, attributes, text content, and child elements
/// in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: String, attrs: Vec<(String, String)>) -> Self {
        Self {
            name,
            attrs,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Assemble the subtree rooted at an already-consumed `Start` token by
    /// pulling tokens until the matching end tag.
    pub fn collect<R: BufRead>(
        decoder: &mut XmlDecoder<R>,
        name: String,
        attrs: Vec<(String, String)>,
    ) -> Result<Self, DecodeError> {
        let mut stack = vec![Element::new(name, attrs)];

        loop {
            let token = match decoder.next_token()? {
                Some(token) => token,
                // The tokenizer reports unclosed tags itself; a clean EOF
                // mid-element still terminates the file.
                None => {
                    return Err(DecodeError::Xml(quick_xml::Error::Io(std::sync::Arc::new(
                        std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "stream ended inside an element",
                        ),
                    ))))
                },
            };

            match token {
                XmlToken::Start { name, attrs } => stack.push(Element::new(name, attrs)),
                XmlToken::Text(text) => {
                    // Stack is never empty between collect() entry and return.
                    let current = stack.last_mut().expect("element stack underflow");
                    if !current.text.is_empty() {
                        current.text.push(' ');
                    }
                    current.text.push_str(text.trim());
                },
                XmlToken::End(_) => {
                    let done = stack.pop().expect("element stack underflow");
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                },
            }
        }
    }

    /// First attribute with the given name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given tag, ignoring extras.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given tag, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content of the first child with the given tag.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Walk a chain of first-matching children, e.g. `["artists", "artist"]`.
    pub fn descendant(&self, path: &[&str]) -> Option<&Element> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    /// Text of every `item`-tagged child under the first `group`-tagged
    /// child; the empty vector when the group is absent.
    pub fn grouped_texts(&self, group: &str, item: &str) -> Vec<String> {
        self.child(group)
            .map(|g| {
                g.children_named(item)
                    .map(|c| c.text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::XmlDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tokio_util::sync::CancellationToken;

    fn parse(xml: &str) -> Element {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        let mut decoder =
            XmlDecoder::from_gzip_bytes(encoder.finish().unwrap(), CancellationToken::new());
        match decoder.next_token().unwrap().unwrap() {
            XmlToken::Start { name, attrs } => {
                Element::collect(&mut decoder, name, attrs).unwrap()
            },
            other => panic!("expected start token, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_nested() {
        let el = parse(r#"<release id="9"><title>Foo</title><tracklist><track><title>A</title></track><track><title>B</title></track></tracklist></release>"#);
        assert_eq!(el.name, "release");
        assert_eq!(el.attr("id"), Some("9"));
        assert_eq!(el.child_text("title"), Some("Foo"));
        let tracks: Vec<_> = el
            .child("tracklist")
            .unwrap()
            .children_named("track")
            .collect();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].child_text("title"), Some("B"));
    }

    #[test]
    fn test_missing_lookups() {
        let el = parse("<artist><name>Nina</name></artist>");
        assert_eq!(el.attr("id"), None);
        assert!(el.child("profile").is_none());
        assert_eq!(el.child_text("profile"), None);
        assert!(el.grouped_texts("urls", "url").is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let el = parse("<a><b>one</b><b>two</b></a>");
        assert_eq!(el.child_text("b"), Some("one"));
        assert_eq!(el.children_named("b").count(), 2);
    }

    #[test]
    fn test_descendant_and_grouped_texts() {
        let el = parse(
            "<release><artists><artist><name>Hobo</name></artist></artists>\
             <styles><style>House</style><style>Dub</style></styles></release>",
        );
        assert_eq!(
            el.descendant(&["artists", "artist", "name"]).map(|e| e.text.as_str()),
            Some("Hobo")
        );
        assert_eq!(el.grouped_texts("styles", "style"), vec!["House", "Dub"]);
    }

    #[test]
    fn test_same_tag_nested_depth() {
        let el = parse("<label><name>Top</name><sublabels><label><name>Sub</name></label></sublabels></label>");
        assert_eq!(el.child_text("name"), Some("Top"));
        let sub = el.descendant(&["sublabels", "label"]).unwrap();
        assert_eq!(sub.child_text("name"), Some("Sub"));
    }
}
