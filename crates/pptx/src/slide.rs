//! PPTX slide canvas.

use crate::template::{LayoutDef, PlaceholderDef, GROUP_SHAPE_HEADER};
use crate::xml::{escape, pml_namespaces, XML_DECLARATION};
use deck_core::{
    Alignment, Emu, Error, Paragraph, PlaceholderRole, Rect, Result, Rgb, SlideCanvas,
};
use image::{ImageFormat, ImageReader};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Bullet indent used for bulleted body paragraphs.
const BULLET_INDENT: i64 = 285_750;

/// An image file embedded in the package.
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
}

impl EmbeddedImage {
    /// Read and sniff an image file. Only formats PowerPoint renders are accepted.
    fn load(path: &Path) -> Result<(Self, u32, u32)> {
        let bytes = fs::read(path)?;

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| Error::ImageError(format!("{}: {}", path.display(), e)))?;

        let (extension, content_type) = match reader.format() {
            Some(ImageFormat::Png) => ("png", "image/png"),
            Some(ImageFormat::Jpeg) => ("jpeg", "image/jpeg"),
            Some(ImageFormat::Gif) => ("gif", "image/gif"),
            Some(ImageFormat::Bmp) => ("bmp", "image/bmp"),
            Some(ImageFormat::Tiff) => ("tiff", "image/tiff"),
            Some(other) => {
                return Err(Error::ImageError(format!(
                    "{}: unsupported picture format {:?}",
                    path.display(),
                    other
                )))
            }
            None => {
                return Err(Error::ImageError(format!(
                    "{}: unrecognized image data",
                    path.display()
                )))
            }
        };

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| Error::ImageError(format!("{}: {}", path.display(), e)))?;
        if width == 0 || height == 0 {
            return Err(Error::ImageError(format!("{}: empty image", path.display())));
        }

        Ok((
            Self {
                bytes,
                extension,
                content_type,
            },
            width,
            height,
        ))
    }
}

/// A shape added on top of the layout placeholders.
#[derive(Debug, Clone)]
enum Shape {
    TextBox {
        rect: Rect,
        paragraphs: Vec<Paragraph>,
    },
    Picture {
        /// Index into the slide's `images`.
        image: usize,
        rect: Rect,
        description: String,
    },
}

/// A layout placeholder copied onto the slide.
#[derive(Debug, Clone)]
struct PlaceholderShape {
    source: PlaceholderDef,
    paragraphs: Option<Vec<Paragraph>>,
}

/// A slide being built for a [`PptxDeck`](crate::PptxDeck).
#[derive(Debug, Clone)]
pub struct PptxSlide {
    layout_index: usize,
    layout: &'static LayoutDef,
    placeholders: Vec<PlaceholderShape>,
    shapes: Vec<Shape>,
    background: Option<Rgb>,
    notes: Option<String>,
    pub(crate) images: Vec<EmbeddedImage>,
}

impl PptxSlide {
    pub(crate) fn new(layout_index: usize, layout: &'static LayoutDef) -> Self {
        Self {
            layout_index,
            layout,
            placeholders: layout
                .placeholders
                .iter()
                .map(|source| PlaceholderShape {
                    source: *source,
                    paragraphs: None,
                })
                .collect(),
            shapes: Vec::new(),
            background: None,
            notes: None,
            images: Vec::new(),
        }
    }

    /// Index of the layout this slide was created from.
    pub fn layout_index(&self) -> usize {
        self.layout_index
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn picture_count(&self) -> usize {
        self.images.len()
    }

    /// `ppt/slides/slideN.xml`. `image_rel_ids[i]` is the relationship id of `images[i]`.
    pub(crate) fn to_xml(&self, image_rel_ids: &[String]) -> Result<String> {
        let mut xml = String::with_capacity(4096);
        xml.push_str(XML_DECLARATION);
        write!(xml, "<p:sld {}>", pml_namespaces())?;
        xml.push_str("<p:cSld>");

        if let Some(color) = self.background {
            write!(
                xml,
                r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
                color.to_hex()
            )?;
        }

        xml.push_str("<p:spTree>");
        xml.push_str(GROUP_SHAPE_HEADER);

        let mut shape_id = 2;
        for placeholder in &self.placeholders {
            write_placeholder(&mut xml, shape_id, placeholder)?;
            shape_id += 1;
        }

        let mut text_boxes = 0;
        for shape in &self.shapes {
            match shape {
                Shape::TextBox { rect, paragraphs } => {
                    text_boxes += 1;
                    write_text_box(&mut xml, shape_id, text_boxes, *rect, paragraphs)?;
                }
                Shape::Picture {
                    image,
                    rect,
                    description,
                } => {
                    let rel_id = image_rel_ids.get(*image).ok_or_else(|| {
                        Error::CompositionError(format!("no relationship for image {}", image))
                    })?;
                    write_picture(&mut xml, shape_id, rel_id, *rect, description)?;
                }
            }
            shape_id += 1;
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
        Ok(xml)
    }

    /// `ppt/notesSlides/notesSlideN.xml`, if the slide has notes.
    pub(crate) fn notes_xml(&self) -> Option<Result<String>> {
        self.notes.as_deref().map(notes_slide_xml)
    }
}

impl SlideCanvas for PptxSlide {
    fn set_background(&mut self, color: Rgb) -> Result<()> {
        self.background = Some(color);
        Ok(())
    }

    fn has_placeholder(&self, role: PlaceholderRole) -> bool {
        self.layout.placeholder_for(role).is_some()
    }

    fn fill_placeholder(
        &mut self,
        role: PlaceholderRole,
        paragraphs: Vec<Paragraph>,
    ) -> Result<()> {
        let placeholder = self
            .placeholders
            .iter_mut()
            .find(|ph| ph.source.role == Some(role))
            .ok_or_else(|| {
                Error::CompositionError(format!("layout has no {:?} placeholder", role))
            })?;
        placeholder.paragraphs = Some(paragraphs);
        Ok(())
    }

    fn add_text_box(&mut self, rect: Rect, paragraphs: Vec<Paragraph>) -> Result<()> {
        self.shapes.push(Shape::TextBox { rect, paragraphs });
        Ok(())
    }

    fn add_picture(&mut self, path: &Path, left: Emu, top: Emu, height: Emu) -> Result<()> {
        let (image, pixel_width, pixel_height) = EmbeddedImage::load(path)?;
        let width = (height.0 as f64 * pixel_width as f64 / pixel_height as f64).round() as i64;

        log::debug!(
            "Embedding {} ({}x{} px, {})",
            path.display(),
            pixel_width,
            pixel_height,
            image.extension
        );

        let description = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.images.push(image);
        self.shapes.push(Shape::Picture {
            image: self.images.len() - 1,
            rect: Rect {
                left,
                top,
                width: Emu(width),
                height,
            },
            description,
        });
        Ok(())
    }

    fn set_notes(&mut self, text: &str) -> Result<()> {
        self.notes = Some(text.to_string());
        Ok(())
    }
}

fn write_placeholder(xml: &mut String, id: usize, placeholder: &PlaceholderShape) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/>"#,
        id,
        placeholder.source.name,
        placeholder.source.ph_xml()
    )?;
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    match &placeholder.paragraphs {
        Some(paragraphs) if !paragraphs.is_empty() => write_paragraphs(xml, paragraphs)?,
        _ => xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#),
    }
    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_xfrm(xml: &mut String, rect: Rect) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.left.0, rect.top.0, rect.width.0, rect.height.0
    )?;
    Ok(())
}

fn write_text_box(
    xml: &mut String,
    id: usize,
    number: usize,
    rect: Rect,
    paragraphs: &[Paragraph],
) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#,
        id, number
    )?;
    write_xfrm(xml, rect)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
    xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#);
    if paragraphs.is_empty() {
        xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
    } else {
        write_paragraphs(xml, paragraphs)?;
    }
    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_picture(
    xml: &mut String,
    id: usize,
    rel_id: &str,
    rect: Rect,
    description: &str,
) -> Result<()> {
    write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        id,
        id - 1,
        escape(description)
    )?;
    write!(
        xml,
        r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#,
        rel_id
    )?;
    write_xfrm(xml, rect)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
    Ok(())
}

fn write_paragraphs(xml: &mut String, paragraphs: &[Paragraph]) -> Result<()> {
    for paragraph in paragraphs {
        write_paragraph(xml, paragraph)?;
    }
    Ok(())
}

/// One `<a:p>` with a single formatted run per line.
fn write_paragraph(xml: &mut String, paragraph: &Paragraph) -> Result<()> {
    xml.push_str("<a:p>");

    if paragraph.bullet {
        write!(
            xml,
            r#"<a:pPr marL="{}" indent="-{}""#,
            BULLET_INDENT, BULLET_INDENT
        )?;
    } else {
        xml.push_str(r#"<a:pPr marL="0" indent="0""#);
    }
    match paragraph.alignment {
        Some(Alignment::Center) => xml.push_str(r#" algn="ctr""#),
        Some(Alignment::Left) => xml.push_str(r#" algn="l""#),
        None => {}
    }
    xml.push('>');
    if let Some(points) = paragraph.space_after_pt {
        write!(
            xml,
            r#"<a:spcAft><a:spcPts val="{}"/></a:spcAft>"#,
            (points * 100.0).round() as i64
        )?;
    }
    if paragraph.bullet {
        xml.push_str(r#"<a:buFont typeface="Arial"/><a:buChar char="&#8226;"/>"#);
    } else {
        xml.push_str("<a:buNone/>");
    }
    xml.push_str("</a:pPr>");

    let run_properties = run_properties_xml(paragraph)?;
    for (i, line) in paragraph.text.split('\n').enumerate() {
        if i > 0 {
            write!(xml, "<a:br>{}</a:br>", run_properties)?;
        }
        if !line.is_empty() {
            write!(xml, "<a:r>{}<a:t>{}</a:t></a:r>", run_properties, escape(line))?;
        }
    }

    xml.push_str("</a:p>");
    Ok(())
}

/// `<a:rPr>` for a paragraph's style.
fn run_properties_xml(paragraph: &Paragraph) -> Result<String> {
    let style = &paragraph.style;
    let mut rpr = String::with_capacity(160);
    write!(
        rpr,
        r#"<a:rPr lang="en-US" sz="{}""#,
        (style.size_pt * 100.0).round() as i64
    )?;
    if style.bold {
        rpr.push_str(r#" b="1""#);
    }
    write!(
        rpr,
        r#" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr>"#,
        style.color.to_hex(),
        escape(&style.font)
    )?;
    Ok(rpr)
}

fn notes_slide_xml(text: &str) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    write!(xml, "<p:notes {}>", pml_namespaces())?;
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(GROUP_SHAPE_HEADER);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#);
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    for line in text.split('\n') {
        if line.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
        } else {
            write!(
                xml,
                r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            )?;
        }
    }
    xml.push_str("</p:txBody></p:sp></p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>");
    Ok(xml)
}
