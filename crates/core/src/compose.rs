//! Deck composition: turns extracted slides into writer calls.

use crate::assets::AssetResolver;
use crate::canvas::{
    Alignment, DeckWriter, Emu, Paragraph, PlaceholderRole, Rect, SlideCanvas, TextStyle,
};
use crate::error::{Error, Result};
use crate::normalize::truncate_chars;
use crate::style::{Rgb, Theme};
use crate::types::{ContentBlock, ExtractedDeck, LayoutId, SlideRecord, SlideType};
use std::path::Path;

const TITLE_SLIDE_TITLE_PT: f64 = 54.0;
const TITLE_PT: f64 = 40.0;
const SUBTITLE_PT: f64 = 24.0;
const HEADING_PT: f64 = 20.0;
const BODY_PT: f64 = 18.0;
const HEADING_SPACE_AFTER_PT: f64 = 6.0;

/// Outcome of a composition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeReport {
    pub slides_written: usize,
    pub images_placed: usize,
    pub images_skipped: usize,
    pub notes_attached: usize,
    /// Recoverable problems, in the order they occurred.
    pub warnings: Vec<String>,
}

impl ComposeReport {
    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Index of the template layout to use for `layout`.
///
/// Layout names are matched case-insensitively against the layout's search
/// names in template order. Without a match the positional fallback is used.
pub fn select_layout(layout: LayoutId, names: &[String]) -> Option<usize> {
    let wanted: Vec<String> = layout
        .search_names()
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    names
        .iter()
        .position(|name| {
            let name = name.to_lowercase();
            wanted.iter().any(|w| name.contains(w.as_str()))
        })
        .or_else(|| layout.fallback_index(names.len()))
}

/// Where pictures go on a slide: (left, top, height).
pub fn picture_placement(slide: &SlideRecord) -> (Emu, Emu, Emu) {
    if slide.slide_type == SlideType::Image || slide.layout == LayoutId::TwoColumn {
        (Emu::inches(6.5), Emu::inches(1.0), Emu::inches(5.5))
    } else if slide.slide_type == SlideType::Title {
        (Emu::inches(5.5), Emu::inches(5.5), Emu::inches(1.5))
    } else {
        (Emu::inches(8.0), Emu::inches(1.5), Emu::inches(4.0))
    }
}

/// Fallback body area when the layout has no body placeholder.
fn content_box() -> Rect {
    Rect::inches(1.0, 2.0, 11.0, 4.0)
}

/// Builds a presentation from an [`ExtractedDeck`] through a [`DeckWriter`].
#[derive(Debug, Clone)]
pub struct DeckComposer {
    theme: Theme,
    progress: bool,
}

impl DeckComposer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            progress: false,
        }
    }

    /// Log one info line per slide while composing.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Background and text colors for a slide.
    pub fn slide_colors(&self, slide: &SlideRecord) -> (Rgb, Rgb) {
        if let Some(background) = slide.background {
            return (background, self.theme.text_for_background(background));
        }

        if slide.slide_type.prefers_dark_background() || slide.has_class_fragment("dark") {
            (self.theme.background_dark, self.theme.text_on_dark)
        } else {
            (self.theme.background_primary, self.theme.text_primary)
        }
    }

    /// Write every slide of `deck` and save the result to `output`.
    ///
    /// Temporary image files held by `assets` are removed before saving.
    pub fn compose<W: DeckWriter>(
        &self,
        deck: &ExtractedDeck,
        writer: &mut W,
        assets: &mut AssetResolver,
        output: &Path,
    ) -> Result<ComposeReport> {
        if deck.is_empty() {
            return Err(Error::NoSlides);
        }

        let layout_names = writer.layout_names();
        if layout_names.is_empty() {
            return Err(Error::LayoutError("template has no slide layouts".to_string()));
        }

        writer.apply_theme(&self.theme);

        let mut report = ComposeReport::default();
        let total = deck.slides.len();

        for slide in &deck.slides {
            if self.progress {
                log::info!(
                    "  [{}/{}] {} slide: {}",
                    slide.number,
                    total,
                    slide.slide_type,
                    truncate_chars(slide.title_text(), 50)
                );
            }

            let layout_index = select_layout(slide.layout, &layout_names).ok_or_else(|| {
                Error::LayoutError(format!("no layout available for {}", slide.layout))
            })?;
            log::debug!(
                "Slide {}: layout {} -> '{}'",
                slide.number,
                slide.layout,
                layout_names[layout_index]
            );

            let mut canvas = writer.new_slide(layout_index)?;
            self.compose_slide(slide, &mut canvas, assets, &mut report)?;
            writer.push_slide(canvas)?;
            report.slides_written += 1;
        }

        assets.cleanup();
        log::debug!("Saving {} slides to {}", writer.slide_count(), output.display());
        writer.save(output)?;

        log::debug!(
            "Composed {} slides ({} images placed, {} skipped, {} notes)",
            report.slides_written,
            report.images_placed,
            report.images_skipped,
            report.notes_attached
        );

        Ok(report)
    }

    fn compose_slide<S: SlideCanvas>(
        &self,
        slide: &SlideRecord,
        canvas: &mut S,
        assets: &mut AssetResolver,
        report: &mut ComposeReport,
    ) -> Result<()> {
        let (background, text_color) = self.slide_colors(slide);

        if let Err(e) = canvas.set_background(background) {
            report.warn(format!("Slide {}: could not set background: {}", slide.number, e));
        }

        self.write_title(slide, canvas, text_color)?;
        self.write_subtitle(slide, canvas, text_color)?;
        self.write_content(slide, canvas, text_color)?;
        self.place_images(slide, canvas, assets, report);

        if let Some(notes) = slide.speaker_notes.as_deref().filter(|n| !n.is_empty()) {
            match canvas.set_notes(notes) {
                Ok(()) => report.notes_attached += 1,
                Err(e) => {
                    report.warn(format!("Slide {}: could not add notes: {}", slide.number, e))
                }
            }
        }

        Ok(())
    }

    fn write_title<S: SlideCanvas>(
        &self,
        slide: &SlideRecord,
        canvas: &mut S,
        color: Rgb,
    ) -> Result<()> {
        let Some(title) = slide.title.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        if !canvas.has_placeholder(PlaceholderRole::Title) {
            log::debug!("Slide {}: layout has no title placeholder", slide.number);
            return Ok(());
        }

        let is_title_slide = slide.slide_type == SlideType::Title;
        let style = TextStyle {
            size_pt: if is_title_slide { TITLE_SLIDE_TITLE_PT } else { TITLE_PT },
            bold: true,
            font: self.theme.display_font.clone(),
            color,
        };

        let mut paragraph = Paragraph::new(title, style);
        if is_title_slide {
            paragraph = paragraph.with_alignment(Alignment::Center);
        }

        canvas.fill_placeholder(PlaceholderRole::Title, vec![paragraph])
    }

    fn write_subtitle<S: SlideCanvas>(
        &self,
        slide: &SlideRecord,
        canvas: &mut S,
        color: Rgb,
    ) -> Result<()> {
        if !slide.slide_type.shows_subtitle() {
            return Ok(());
        }
        let Some(subtitle) = slide.subtitle.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        if !canvas.has_placeholder(PlaceholderRole::Subtitle) {
            return Ok(());
        }

        let style = TextStyle {
            size_pt: SUBTITLE_PT,
            bold: false,
            font: self.theme.body_font.clone(),
            color,
        };
        let paragraph = Paragraph::new(subtitle, style).with_alignment(Alignment::Center);

        canvas.fill_placeholder(PlaceholderRole::Subtitle, vec![paragraph])
    }

    fn write_content<S: SlideCanvas>(
        &self,
        slide: &SlideRecord,
        canvas: &mut S,
        color: Rgb,
    ) -> Result<()> {
        if slide.content.is_empty() {
            return Ok(());
        }

        let paragraphs: Vec<Paragraph> = slide
            .content
            .iter()
            .map(|block| self.block_paragraph(block, color))
            .collect();

        if canvas.has_placeholder(PlaceholderRole::Body) {
            canvas.fill_placeholder(PlaceholderRole::Body, paragraphs)
        } else {
            log::debug!("Slide {}: no body placeholder, adding text box", slide.number);
            canvas.add_text_box(content_box(), paragraphs)
        }
    }

    fn block_paragraph(&self, block: &ContentBlock, color: Rgb) -> Paragraph {
        match block {
            ContentBlock::Heading { text, .. } => Paragraph::new(
                text.as_str(),
                TextStyle {
                    size_pt: HEADING_PT,
                    bold: true,
                    font: self.theme.display_font.clone(),
                    color,
                },
            )
            .with_space_after(HEADING_SPACE_AFTER_PT),
            ContentBlock::Text { text } | ContentBlock::Bullet { text } => Paragraph::new(
                text.as_str(),
                TextStyle {
                    size_pt: BODY_PT,
                    bold: false,
                    font: self.theme.body_font.clone(),
                    color,
                },
            )
            .with_bullet(block.is_bullet()),
        }
    }

    fn place_images<S: SlideCanvas>(
        &self,
        slide: &SlideRecord,
        canvas: &mut S,
        assets: &mut AssetResolver,
        report: &mut ComposeReport,
    ) {
        let (left, top, height) = picture_placement(slide);

        for image in &slide.images {
            let Some(path) = assets.resolve(&image.src) else {
                report.images_skipped += 1;
                report.warn(format!(
                    "Slide {}: image not available: {}",
                    slide.number,
                    truncate_chars(&image.src, 80)
                ));
                continue;
            };

            match canvas.add_picture(&path, left, top, height) {
                Ok(()) => report.images_placed += 1,
                Err(e) => {
                    report.images_skipped += 1;
                    report.warn(format!(
                        "Slide {}: could not add image {}: {}",
                        slide.number,
                        path.display(),
                        e
                    ));
                }
            }
        }
    }
}
