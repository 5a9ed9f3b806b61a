use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Maximum allowed element nesting depth.
/// Prevents stack exhaustion from maliciously crafted deeply nested documents.
const MAX_XML_DEPTH: usize = 50;

/// Errors from generic XML tree construction.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Nesting depth exceeds the safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// The reader hit malformed markup it could not recover from.
    #[error("XML parse error: {0}")]
    Malformed(String),

    /// The document contained no root element.
    #[error("document has no root element")]
    NoRoot,
}

/// A parsed XML element: lowercased name, flattened attributes, folded
/// text/CDATA content, and child elements in document order.
///
/// Names keep their namespace prefix (`media:content`) but are lowercased,
/// so dialect dispatch and fallback-key lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First attribute value with the given (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given (lowercase) name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given (lowercase) name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content, or `None` when absent/whitespace-only.
    pub fn text_content(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Trimmed text of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)?.text_content()
    }

    /// Ordered fallback chain over child names, reduced left to right:
    /// the first name with non-empty text wins.
    pub fn first_text(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.child_text(name))
    }

    /// Ordered fallback chain over child names: the first present child wins.
    pub fn first_child(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().find_map(|name| self.child(name))
    }
}

/// Parses an XML document into a generic element tree.
///
/// Tolerant by construction: attribute entries that fail to decode are
/// skipped, unresolvable entities degrade to empty text, and namespace
/// prefixes are preserved but lowercased. Only structural failures
/// (unbalanced tags, depth abuse, no root) are errors.
pub(crate) fn parse_xml_tree(xml: &str) -> Result<XmlElement, XmlError> {
    // Whitespace is kept at parse time; `text_content()` trims at the
    // edges, preserving interior spacing in CDATA-plus-text content.
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(XmlError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                stack.push(element_from_tag(&e));
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_tag(&e);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(XmlError::Malformed("unbalanced closing tag".to_owned()));
                };
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().unwrap_or_default();
                    parent.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlError::Malformed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".to_owned()));
    }

    root.ok_or(XmlError::NoRoot)
}

fn element_from_tag(e: &quick_xml::events::BytesStart<'_>) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let mut attrs = Vec::new();

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }

    XmlElement {
        name,
        attrs,
        text: String::new(),
        children: Vec::new(),
    }
}

/// Attach a completed element to its parent, or record it as the root.
/// Content after the first root element is ignored.
fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}
