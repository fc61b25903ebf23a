//! Read-back of written presentations: per-slide text, pictures, and notes.

use crate::xml::local_name;
use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Text outline of one slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlideOutline {
    /// 1-based position in the presentation.
    pub number: usize,
    /// Non-empty text lines, top-to-bottom then left-to-right.
    pub lines: Vec<String>,
    pub picture_count: usize,
    pub notes: Option<String>,
}

/// Reader for PPTX (Office Open XML) packages.
pub struct OutlineReader;

impl OutlineReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_path(&self, path: &Path) -> Result<Vec<SlideOutline>> {
        let file = File::open(path)?;
        self.read(file)
    }

    /// Read slide outlines from a package.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideOutline>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        let mut outlines = Vec::with_capacity(slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, slide_path)?;
            let shapes = extract_shapes(&content)?;

            let mut outline = SlideOutline {
                number: idx + 1,
                ..SlideOutline::default()
            };
            for shape in shapes {
                if shape.is_picture {
                    outline.picture_count += 1;
                }
                outline.lines.extend(
                    shape
                        .text
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(String::from),
                );
            }

            outline.notes = self.read_notes(&mut archive, slide_path)?;
            outlines.push(outline);
        }

        Ok(outlines)
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| is_slide_relationship(&rel.rel_type))
            .map(|rel| {
                let order =
                    extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target("ppt", &rel.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Notes text of the slide at `slide_path`, following its notesSlide relationship.
    fn read_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file_name) = match slide_path.rsplit_once('/') {
            Some(parts) => parts,
            None => ("", slide_path),
        };
        let rels_path = format!("{}/_rels/{}.rels", dir, file_name);
        if archive.by_name(&rels_path).is_err() {
            return Ok(None);
        }

        let rels_content = self.read_file_from_archive(archive, &rels_path)?;
        let notes_target = parse_relationships(&rels_content)?
            .into_iter()
            .find(|rel| rel.rel_type.ends_with("/notesSlide"))
            .map(|rel| resolve_target(dir, &rel.target));

        let Some(notes_path) = notes_target else {
            return Ok(None);
        };

        let content = self.read_file_from_archive(archive, &notes_path)?;
        let text = extract_shapes(&content)?
            .into_iter()
            .map(|shape| shape.text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(if text.is_empty() { None } else { Some(text) })
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for OutlineReader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct RelationshipEntry {
    id: String,
    rel_type: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<Vec<RelationshipEntry>> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut entry = RelationshipEntry::default();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => entry.id = value,
                        b"Type" => entry.rel_type = value,
                        b"Target" => entry.target = value,
                        _ => {}
                    }
                }
                entries.push(entry);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(entries)
}

fn is_slide_relationship(rel_type: &str) -> bool {
    rel_type.contains("/slide")
        && !rel_type.contains("slideLayout")
        && !rel_type.contains("slideMaster")
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// A shape's text and position.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    is_picture: bool,
}

impl ShapeInfo {
    fn set_offset(&mut self, e: &BytesStart) {
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"x" => {
                    if let Ok(x) = value.parse::<f64>() {
                        self.x = x;
                    }
                }
                b"y" => {
                    if let Ok(y) = value.parse::<f64>() {
                        self.y = y;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Shapes with text or pictures, sorted top-to-bottom then left-to-right.
fn extract_shapes(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut offset_seen = false;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    current_shape = Some(ShapeInfo {
                        is_picture: local_name(e.name().as_ref()) == b"pic",
                        ..ShapeInfo::default()
                    });
                    offset_seen = false;
                }
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    in_paragraph = true;
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                b"br" if in_paragraph => current_text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                // Only the shape's own offset, not a child group's.
                b"off" if !offset_seen => {
                    if let Some(ref mut shape) = current_shape {
                        shape.set_offset(e);
                        offset_seen = true;
                    }
                }
                b"br" if in_paragraph => current_text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(mut shape) = current_shape.take() {
                        shape.text = current_text.trim().to_string();
                        if !shape.text.is_empty() || shape.is_picture {
                            shapes.push(shape);
                        }
                    }
                    current_text.clear();
                    in_text_body = false;
                    in_paragraph = false;
                }
                b"txBody" => in_text_body = false,
                b"p" => in_paragraph = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    shapes.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });
    Ok(shapes)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PptxDeck;
    use deck_core::{DeckWriter, Emu, Paragraph, PlaceholderRole, Rect, Rgb, SlideCanvas, TextStyle};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn body_style() -> TextStyle {
        TextStyle {
            size_pt: 18.0,
            bold: false,
            font: "Arial".to_string(),
            color: Rgb::BLACK,
        }
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide2.xml"),
            "ppt/notesSlides/notesSlide2.xml"
        );
        assert_eq!(resolve_target("ppt", "/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_slide_relationship_filter() {
        assert!(is_slide_relationship(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide"
        ));
        assert!(!is_slide_relationship(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster"
        ));
        assert!(!is_slide_relationship(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme"
        ));
    }

    #[test]
    fn test_shapes_sorted_by_position() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:spPr><a:xfrm><a:off x="0" y="500"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>Lower</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:spPr><a:xfrm><a:off x="0" y="100"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>Upper</a:t></a:r></a:p><a:p><a:r><a:t>Second</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:txBody><a:p></a:p></p:txBody></p:sp>
            </p:spTree></p:cSld></p:sld>"#;
        let shapes = extract_shapes(xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].text, "Upper\nSecond");
        assert_eq!(shapes[1].text, "Lower");
    }

    #[test]
    fn test_not_a_package() {
        let result = OutlineReader::new().read(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_reads_written_deck() {
        let dir = TempDir::new().unwrap();
        let picture = dir.path().join("logo.png");
        image::RgbImage::new(2, 2).save(&picture).unwrap();

        let mut deck = PptxDeck::new();

        let mut first = deck.new_slide(0).unwrap();
        first
            .fill_placeholder(PlaceholderRole::Title, vec![Paragraph::new("Welcome", body_style())])
            .unwrap();
        first
            .fill_placeholder(
                PlaceholderRole::Subtitle,
                vec![Paragraph::new("A & B", body_style())],
            )
            .unwrap();
        first.set_notes("Greet everyone\nThen start").unwrap();
        deck.push_slide(first).unwrap();

        let mut second = deck.new_slide(6).unwrap();
        second
            .add_text_box(
                Rect::inches(1.0, 2.0, 11.0, 4.0),
                vec![Paragraph::new("line one\nline two", body_style())],
            )
            .unwrap();
        second
            .add_picture(&picture, Emu::inches(8.0), Emu::inches(1.5), Emu::inches(1.0))
            .unwrap();
        deck.push_slide(second).unwrap();

        let path = dir.path().join("deck.pptx");
        deck.save(&path).unwrap();

        let outlines = OutlineReader::new().read_path(&path).unwrap();
        assert_eq!(outlines.len(), 2);

        assert_eq!(outlines[0].number, 1);
        assert_eq!(outlines[0].lines, vec!["Welcome", "A & B"]);
        assert_eq!(outlines[0].picture_count, 0);
        assert_eq!(outlines[0].notes.as_deref(), Some("Greet everyone\nThen start"));

        assert_eq!(outlines[1].lines, vec!["line one", "line two"]);
        assert_eq!(outlines[1].picture_count, 1);
        assert_eq!(outlines[1].notes, None);
    }
}
