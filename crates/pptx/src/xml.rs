//! Shared OOXML constants and small XML builders.

use deck_core::Result;
use std::borrow::Cow;
use std::fmt::Write as FmtWrite;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PRESENTATION: &str =
    "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// `xmlns` attributes for PresentationML part roots.
pub(crate) fn pml_namespaces() -> String {
    format!(
        r#"xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#,
        NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
    )
}

/// Relationship type URIs.
pub(crate) mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
}

/// Part content types.
pub(crate) mod content_type {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Escape text for use in XML content or attribute values.
///
/// Characters XML 1.0 does not allow at all are dropped.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    if text.chars().any(is_invalid_xml_char) {
        let cleaned: String = text.chars().filter(|c| !is_invalid_xml_char(*c)).collect();
        Cow::Owned(quick_xml::escape::escape(&cleaned).into_owned())
    } else {
        quick_xml::escape::escape(text)
    }
}

fn is_invalid_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// A `.rels` part under construction. Ids are assigned in insertion order.
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    entries: Vec<(String, &'static str, String)>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and return its id (`rId1`, `rId2`, ...).
    pub fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push((id.clone(), rel_type, target.into()));
        id
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.entries.len() * 160);
        xml.push_str(XML_DECLARATION);
        write!(xml, r#"<Relationships xmlns="{}">"#, NS_PACKAGE_RELATIONSHIPS)?;
        for (id, rel_type, target) in &self.entries {
            write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id,
                rel_type,
                escape(target)
            )?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

/// `[Content_Types].xml` under construction.
#[derive(Debug)]
pub(crate) struct ContentTypes {
    defaults: Vec<(String, &'static str)>,
    overrides: Vec<(String, &'static str)>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self {
            defaults: vec![
                ("rels".to_string(), content_type::RELATIONSHIPS),
                ("xml".to_string(), content_type::XML),
            ],
            overrides: Vec::new(),
        }
    }

    /// Register a default content type for a file extension, once.
    pub fn add_default(&mut self, extension: &str, content_type: &'static str) {
        if !self.defaults.iter().any(|(ext, _)| ext == extension) {
            self.defaults.push((extension.to_string(), content_type));
        }
    }

    /// Register a content type for one part (name without leading `/`).
    pub fn add_override(&mut self, part_name: impl Into<String>, content_type: &'static str) {
        self.overrides.push((part_name.into(), content_type));
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.overrides.len() * 160);
        xml.push_str(XML_DECLARATION);
        write!(xml, r#"<Types xmlns="{}">"#, NS_CONTENT_TYPES)?;
        for (extension, content_type) in &self.defaults {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                extension, content_type
            )?;
        }
        for (part_name, content_type) in &self.overrides {
            write!(
                xml,
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                part_name, content_type
            )?;
        }
        xml.push_str("</Types>");
        Ok(xml)
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Q&A <now>"), "Q&amp;A &lt;now&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_escape_drops_invalid_characters() {
        assert_eq!(escape("a\u{1}<b\u{1b}"), "a&lt;b");
        assert_eq!(escape("tab\there\nline"), "tab\there\nline");
    }

    #[test]
    fn test_relationship_ids_in_order() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml"), "rId1");
        assert_eq!(rels.add(rel_type::IMAGE, "../media/image1.png"), "rId2");

        let xml = rels.to_xml().unwrap();
        assert!(xml.contains(r#"Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png""#));
    }

    #[test]
    fn test_content_types_defaults_once() {
        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.add_default("png", "image/png");
        types.add_override("ppt/slides/slide1.xml", content_type::SLIDE);

        let xml = types.to_xml().unwrap();
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains(r#"<Override PartName="/ppt/slides/slide1.xml""#));
    }
}
