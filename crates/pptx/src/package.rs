//! PPTX package assembly.

use crate::slide::PptxSlide;
use crate::template::{
    app_props_xml, core_props_xml, layout_xml, notes_master_xml, pres_props_xml,
    slide_master_xml, table_styles_xml, theme_xml, view_props_xml, LAYOUTS, NOTES_HEIGHT,
    NOTES_WIDTH, SLIDE_HEIGHT, SLIDE_MASTER_ID, SLIDE_WIDTH,
};
use crate::xml::{
    content_type, pml_namespaces, rel_type, ContentTypes, Relationships, XML_DECLARATION,
};
use deck_core::{DeckWriter, Error, Result, Theme};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// First `sldId/@id`; PowerPoint requires values of 256 or more.
const FIRST_SLIDE_ID: usize = 256;

const APPLICATION: &str = "html2pptx";

/// A presentation written as an Office Open XML package.
///
/// The deck carries a built-in widescreen template with the standard layouts
/// ("Title Slide", "Title and Content", ...). Slides are kept in memory until
/// [`save`](DeckWriter::save) or [`to_bytes`](PptxDeck::to_bytes).
#[derive(Debug, Clone)]
pub struct PptxDeck {
    title: String,
    creator: String,
    theme: Theme,
    slides: Vec<PptxSlide>,
}

impl PptxDeck {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            creator: APPLICATION.to_string(),
            theme: Theme::default(),
            slides: Vec::new(),
        }
    }

    /// Set the document title stored in the core properties.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn slides(&self) -> &[PptxSlide] {
        &self.slides
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        self.write_package(&mut zip)?;
        let cursor = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish package: {}", e)))?;
        Ok(cursor.into_inner())
    }

    fn notes_count(&self) -> usize {
        self.slides.iter().filter(|s| s.notes().is_some()).count()
    }

    fn write_package<W: Write + Seek>(&self, zip: &mut ZipWriter<W>) -> Result<()> {
        let has_notes = self.notes_count() > 0;
        let mut types = ContentTypes::new();

        // Package root
        let mut root_rels = Relationships::new();
        root_rels.add(rel_type::OFFICE_DOCUMENT, "ppt/presentation.xml");
        root_rels.add(rel_type::CORE_PROPERTIES, "docProps/core.xml");
        root_rels.add(rel_type::EXTENDED_PROPERTIES, "docProps/app.xml");
        write_part(zip, "_rels/.rels", &root_rels.to_xml()?)?;

        write_part(zip, "docProps/core.xml", &core_props_xml(&self.title, &self.creator))?;
        types.add_override("docProps/core.xml", content_type::CORE_PROPERTIES);
        write_part(
            zip,
            "docProps/app.xml",
            &app_props_xml(APPLICATION, self.slides.len(), self.notes_count()),
        )?;
        types.add_override("docProps/app.xml", content_type::EXTENDED_PROPERTIES);

        // Presentation part and its relationships
        let mut pres_rels = Relationships::new();
        let master_rel = pres_rels.add(rel_type::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
        let notes_master_rel = if has_notes {
            Some(pres_rels.add(rel_type::NOTES_MASTER, "notesMasters/notesMaster1.xml"))
        } else {
            None
        };
        let slide_rels: Vec<String> = (1..=self.slides.len())
            .map(|n| pres_rels.add(rel_type::SLIDE, format!("slides/slide{}.xml", n)))
            .collect();
        pres_rels.add(rel_type::PRES_PROPS, "presProps.xml");
        pres_rels.add(rel_type::VIEW_PROPS, "viewProps.xml");
        pres_rels.add(rel_type::THEME, "theme/theme1.xml");
        pres_rels.add(rel_type::TABLE_STYLES, "tableStyles.xml");

        let presentation = presentation_xml(&master_rel, notes_master_rel.as_deref(), &slide_rels)?;
        write_part(zip, "ppt/presentation.xml", &presentation)?;
        types.add_override("ppt/presentation.xml", content_type::PRESENTATION);
        write_part(zip, "ppt/_rels/presentation.xml.rels", &pres_rels.to_xml()?)?;

        write_part(zip, "ppt/presProps.xml", &pres_props_xml())?;
        types.add_override("ppt/presProps.xml", content_type::PRES_PROPS);
        write_part(zip, "ppt/viewProps.xml", &view_props_xml())?;
        types.add_override("ppt/viewProps.xml", content_type::VIEW_PROPS);
        write_part(zip, "ppt/tableStyles.xml", &table_styles_xml())?;
        types.add_override("ppt/tableStyles.xml", content_type::TABLE_STYLES);

        // Master, layouts, theme
        write_part(zip, "ppt/slideMasters/slideMaster1.xml", &slide_master_xml(LAYOUTS.len())?)?;
        types.add_override("ppt/slideMasters/slideMaster1.xml", content_type::SLIDE_MASTER);
        let mut master_rels = Relationships::new();
        for n in 1..=LAYOUTS.len() {
            master_rels
                .add(rel_type::SLIDE_LAYOUT, format!("../slideLayouts/slideLayout{}.xml", n));
        }
        master_rels.add(rel_type::THEME, "../theme/theme1.xml");
        write_part(zip, "ppt/slideMasters/_rels/slideMaster1.xml.rels", &master_rels.to_xml()?)?;

        for (i, layout) in LAYOUTS.iter().enumerate() {
            let name = format!("ppt/slideLayouts/slideLayout{}.xml", i + 1);
            write_part(zip, &name, &layout_xml(layout)?)?;
            types.add_override(name, content_type::SLIDE_LAYOUT);

            let mut layout_rels = Relationships::new();
            layout_rels.add(rel_type::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
            write_part(
                zip,
                &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", i + 1),
                &layout_rels.to_xml()?,
            )?;
        }

        write_part(zip, "ppt/theme/theme1.xml", &theme_xml("Deck Theme", &self.theme)?)?;
        types.add_override("ppt/theme/theme1.xml", content_type::THEME);

        if has_notes {
            write_part(zip, "ppt/theme/theme2.xml", &theme_xml("Notes Theme", &self.theme)?)?;
            types.add_override("ppt/theme/theme2.xml", content_type::THEME);
            write_part(zip, "ppt/notesMasters/notesMaster1.xml", &notes_master_xml()?)?;
            types.add_override("ppt/notesMasters/notesMaster1.xml", content_type::NOTES_MASTER);
            let mut notes_master_rels = Relationships::new();
            notes_master_rels.add(rel_type::THEME, "../theme/theme2.xml");
            write_part(
                zip,
                "ppt/notesMasters/_rels/notesMaster1.xml.rels",
                &notes_master_rels.to_xml()?,
            )?;
        }

        // Slides
        let mut media_count = 0;
        for (i, slide) in self.slides.iter().enumerate() {
            let number = i + 1;
            let mut rels = Relationships::new();
            rels.add(
                rel_type::SLIDE_LAYOUT,
                format!("../slideLayouts/slideLayout{}.xml", slide.layout_index() + 1),
            );

            let mut image_rel_ids = Vec::with_capacity(slide.images.len());
            for image in &slide.images {
                media_count += 1;
                let media_name = format!("image{}.{}", media_count, image.extension);
                write_binary_part(zip, &format!("ppt/media/{}", media_name), &image.bytes)?;
                types.add_default(image.extension, image.content_type);
                image_rel_ids.push(rels.add(rel_type::IMAGE, format!("../media/{}", media_name)));
            }

            if let Some(notes) = slide.notes_xml() {
                let notes_name = format!("ppt/notesSlides/notesSlide{}.xml", number);
                write_part(zip, &notes_name, &notes?)?;
                types.add_override(notes_name, content_type::NOTES_SLIDE);

                let mut notes_rels = Relationships::new();
                notes_rels.add(rel_type::NOTES_MASTER, "../notesMasters/notesMaster1.xml");
                notes_rels.add(rel_type::SLIDE, format!("../slides/slide{}.xml", number));
                write_part(
                    zip,
                    &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", number),
                    &notes_rels.to_xml()?,
                )?;

                rels.add(
                    rel_type::NOTES_SLIDE,
                    format!("../notesSlides/notesSlide{}.xml", number),
                );
            }

            let slide_name = format!("ppt/slides/slide{}.xml", number);
            write_part(zip, &slide_name, &slide.to_xml(&image_rel_ids)?)?;
            types.add_override(slide_name, content_type::SLIDE);
            write_part(
                zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                &rels.to_xml()?,
            )?;
        }

        write_part(zip, "[Content_Types].xml", &types.to_xml()?)?;
        Ok(())
    }
}

impl Default for PptxDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckWriter for PptxDeck {
    type Slide = PptxSlide;

    fn layout_names(&self) -> Vec<String> {
        LAYOUTS.iter().map(|layout| layout.name.to_string()).collect()
    }

    fn apply_theme(&mut self, theme: &Theme) {
        self.theme = theme.clone();
    }

    fn new_slide(&mut self, layout_index: usize) -> Result<PptxSlide> {
        let layout = LAYOUTS.get(layout_index).ok_or_else(|| {
            Error::LayoutError(format!(
                "Layout index {} out of range ({} layouts)",
                layout_index,
                LAYOUTS.len()
            ))
        })?;
        Ok(PptxSlide::new(layout_index, layout))
    }

    fn push_slide(&mut self, slide: PptxSlide) -> Result<()> {
        self.slides.push(slide);
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        log::info!(
            "Wrote {} ({} slides, {} bytes)",
            path.display(),
            self.slides.len(),
            bytes.len()
        );
        Ok(())
    }
}

/// `ppt/presentation.xml`.
fn presentation_xml(
    master_rel: &str,
    notes_master_rel: Option<&str>,
    slide_rels: &[String],
) -> Result<String> {
    let mut xml = String::with_capacity(1024 + slide_rels.len() * 48);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, pml_namespaces())?;
    write!(
        xml,
        r#"<p:sldMasterIdLst><p:sldMasterId id="{}" r:id="{}"/></p:sldMasterIdLst>"#,
        SLIDE_MASTER_ID, master_rel
    )?;
    if let Some(rel) = notes_master_rel {
        write!(
            xml,
            r#"<p:notesMasterIdLst><p:notesMasterId r:id="{}"/></p:notesMasterIdLst>"#,
            rel
        )?;
    }
    if !slide_rels.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (i, rel) in slide_rels.iter().enumerate() {
            write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, FIRST_SLIDE_ID + i, rel)?;
        }
        xml.push_str("</p:sldIdLst>");
    }
    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/>"#,
        SLIDE_WIDTH, SLIDE_HEIGHT, NOTES_WIDTH, NOTES_HEIGHT
    )?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

fn write_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, content: &str) -> Result<()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to add {}: {}", name, e)))?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

/// Media is already compressed; store it as-is.
fn write_binary_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &[u8],
) -> Result<()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to add {}: {}", name, e)))?;
    zip.write_all(content)?;
    Ok(())
}
