//! Minimal element tree over quick-xml, enough for SOAP envelopes.
//!
//! Names keep their prefixes as written; lookups compare local names so a
//! sender's choice of prefix does not matter.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct XmlError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.local_name() == local_name)
    }

    pub fn child_text(&self, local_name: &str) -> Option<String> {
        self.child(local_name).map(|child| child.text.clone())
    }

    /// Attribute by local name; namespace declarations are skipped.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|(key, _)| !key.starts_with("xmlns"))
            .find(|(key, _)| local(key) == local_name)
            .map(|(_, value)| value.as_str())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| XmlError(err.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| XmlError(err.to_string()))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// Parses a document into its root element. Whitespace between child
/// elements is dropped; text inside leaf elements is kept verbatim.
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| XmlError(format!("at byte {}: {err}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| XmlError("closing tag without an open element".to_string()))?;
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(|err| XmlError(err.to_string()))?;
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&unescaped),
                    None if unescaped.trim().is_empty() => {}
                    None => return Err(XmlError("text outside the root element".to_string())),
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError(format!("element <{}> is never closed", open.name)));
    }
    root.ok_or_else(|| XmlError("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError("document has more than one root element".to_string()));
    }
    *root = Some(element);
    Ok(())
}

/// Serialises `root` behind an XML declaration.
pub fn write(root: &Element) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|err| XmlError(err.to_string()))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|err| XmlError(err.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|err| XmlError(err.to_string()))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|err| XmlError(err.to_string()))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|err| XmlError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_elements_by_local_name() {
        let doc = r#"<?xml version="1.0"?>
            <s:Envelope xmlns:s="urn:x">
              <s:Body><Greeting lang="de">Guten &amp; Tag</Greeting></s:Body>
            </s:Envelope>"#;
        let root = parse(doc).expect("well formed");
        assert_eq!(root.local_name(), "Envelope");
        let greeting = root
            .child("Body")
            .and_then(|body| body.child("Greeting"))
            .expect("greeting present");
        assert_eq!(greeting.text, "Guten & Tag");
        assert_eq!(greeting.attr("lang"), Some("de"));
        assert_eq!(root.attr("s"), None);
        assert!(root.text.is_empty());
    }

    #[test]
    fn written_documents_parse_back() {
        let element = Element::new("a:Root")
            .with_attr("xmlns:a", "urn:a")
            .with_child(Element::new("Leaf").with_text(" padded <text> "))
            .with_child(Element::new("Empty"));
        let bytes = write(&element).expect("writes");
        let text = String::from_utf8(bytes).expect("utf-8");
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(parse(&text).expect("parses"), element);
    }

    #[test]
    fn rejects_unbalanced_documents() {
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a>").is_err());
        assert!(parse("").is_err());
    }
}
