use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use tracing::trace;

use super::{ContentScanner, ScanError};

/// Scans XML documents element by element.
///
/// The scanner keeps a single current node: the name of the most recently
/// opened element and the most recent text seen inside it. Every end tag
/// rebuilds that node as `<name>content</name>` and tests it against the
/// query, then clears it. Only leaf elements are therefore matched; a parent
/// whose children have already closed produces nothing.
///
/// Escaped angle brackets (`&lt;`, `&gt;`) are unescaped before parsing so
/// that markup embedded as text is still matchable. Any parse error rejects
/// the whole document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct XmlScanner;

#[derive(Debug, Default)]
struct Node {
    name: String,
    content: String,
}

impl Node {
    fn open(&mut self, name: String) {
        self.name = name;
        self.content.clear();
    }

    fn close(&mut self) -> Option<String> {
        if self.name.is_empty() {
            return None;
        }
        let rendered = format!("<{0}>{1}</{0}>", self.name, self.content);
        self.name.clear();
        self.content.clear();
        Some(rendered)
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn malformed(reader: &Reader<&[u8]>, msg: impl std::fmt::Display) -> ScanError {
    ScanError::malformed(format!("{} at position {}", msg, reader.buffer_position()))
}

impl ContentScanner for XmlScanner {
    fn scan(&self, content: &[u8], query: &str) -> Result<Vec<String>, ScanError> {
        let text =
            std::str::from_utf8(content).map_err(|e| ScanError::Encoding(e.to_string()))?;
        let text = unescape_brackets(text);

        let needle = query.to_lowercase();
        let mut reader = Reader::from_str(&text);
        reader.config_mut().check_end_names = true;

        let mut matches = Vec::new();
        let mut current = Node::default();
        let mut depth = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| malformed(&reader, e))?;

            let closed = match event {
                Event::Start(e) => {
                    depth += 1;
                    current.open(element_name(&e));
                    None
                }
                Event::Empty(e) => {
                    current.open(element_name(&e));
                    current.close()
                }
                Event::End(_) => {
                    if depth == 0 {
                        return Err(malformed(&reader, "unexpected end tag"));
                    }
                    depth -= 1;
                    current.close()
                }
                Event::Text(e) => {
                    current.content = e
                        .unescape()
                        .map_err(|e| malformed(&reader, e))?
                        .into_owned();
                    None
                }
                Event::CData(e) => {
                    current.content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    None
                }
                Event::Eof => break,
                _ => None,
            };

            if let Some(node) = closed {
                if node.to_lowercase().contains(&needle) {
                    trace!("XML node matched: {}", node);
                    matches.push(node);
                }
            }
        }

        if depth != 0 {
            return Err(ScanError::malformed(format!(
                "{} unclosed element(s) at end of document",
                depth
            )));
        }

        Ok(matches)
    }
}

fn unescape_brackets(text: &str) -> Cow<'_, str> {
    if text.contains("&lt;") || text.contains("&gt;") {
        Cow::Owned(text.replace("&lt;", "<").replace("&gt;", ">"))
    } else {
        Cow::Borrowed(text)
    }
}
