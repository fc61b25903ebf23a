//! Presentation writer interface used by the deck composer.
//!
//! A [`DeckWriter`] owns a template with named layouts and produces
//! [`SlideCanvas`]es. The PPTX backend lives in the `deck-pptx` crate.

use crate::error::Result;
use crate::style::{Rgb, Theme};
use std::path::Path;

/// English Metric Units, the OOXML length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Emu(pub i64);

impl Emu {
    pub const PER_INCH: i64 = 914_400;
    pub const PER_POINT: i64 = 12_700;

    pub fn inches(value: f64) -> Self {
        Emu((value * Self::PER_INCH as f64).round() as i64)
    }

    pub fn points(value: f64) -> Self {
        Emu((value * Self::PER_POINT as f64).round() as i64)
    }

    pub fn as_inches(&self) -> f64 {
        self.0 as f64 / Self::PER_INCH as f64
    }
}

/// Position and size of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Rect {
    /// Build a rectangle from inch values.
    pub fn inches(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: Emu::inches(left),
            top: Emu::inches(top),
            width: Emu::inches(width),
            height: Emu::inches(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

/// Character formatting applied to a whole paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size_pt: f64,
    pub bold: bool,
    pub font: String,
    pub color: Rgb,
}

/// One paragraph of text with a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// May contain `\n`, rendered as line breaks.
    pub text: String,
    pub style: TextStyle,
    /// `None` inherits the placeholder's alignment.
    pub alignment: Option<Alignment>,
    pub space_after_pt: Option<f64>,
    pub bullet: bool,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            alignment: None,
            space_after_pt: None,
            bullet: false,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn with_space_after(mut self, points: f64) -> Self {
        self.space_after_pt = Some(points);
        self
    }

    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }
}

/// Template placeholder kinds the composer fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderRole {
    Title,
    Subtitle,
    Body,
}

/// A slide being built.
pub trait SlideCanvas {
    /// Fill the slide background with a solid color.
    fn set_background(&mut self, color: Rgb) -> Result<()>;

    /// Whether the slide's layout provides a placeholder for `role`.
    fn has_placeholder(&self, role: PlaceholderRole) -> bool;

    /// Replace the placeholder's text with `paragraphs`.
    fn fill_placeholder(&mut self, role: PlaceholderRole, paragraphs: Vec<Paragraph>)
        -> Result<()>;

    /// Add a free-standing text box.
    fn add_text_box(&mut self, rect: Rect, paragraphs: Vec<Paragraph>) -> Result<()>;

    /// Embed the picture at `path`, scaled to `height` with its aspect ratio kept.
    fn add_picture(&mut self, path: &Path, left: Emu, top: Emu, height: Emu) -> Result<()>;

    fn set_notes(&mut self, text: &str) -> Result<()>;
}

/// A presentation under construction.
pub trait DeckWriter {
    type Slide: SlideCanvas;

    /// Template layout names in template order.
    fn layout_names(&self) -> Vec<String>;

    /// Use the deck theme for master colors and fonts.
    fn apply_theme(&mut self, theme: &Theme);

    /// Start a slide from the layout at `layout_index`.
    fn new_slide(&mut self, layout_index: usize) -> Result<Self::Slide>;

    /// Append a finished slide to the deck.
    fn push_slide(&mut self, slide: Self::Slide) -> Result<()>;

    /// Number of slides pushed so far.
    fn slide_count(&self) -> usize;

    fn save(&mut self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_conversions() {
        assert_eq!(Emu::inches(1.0), Emu(914_400));
        assert_eq!(Emu::inches(13.333_333), Emu(12_192_000));
        assert_eq!(Emu::points(18.0), Emu(228_600));
        assert!((Emu(457_200).as_inches() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rect_inches() {
        let rect = Rect::inches(1.0, 2.0, 11.0, 4.0);
        assert_eq!(rect.left, Emu(914_400));
        assert_eq!(rect.top, Emu(1_828_800));
        assert_eq!(rect.width, Emu(10_058_400));
        assert_eq!(rect.height, Emu(3_657_600));
    }

    #[test]
    fn test_paragraph_builder() {
        let style = TextStyle {
            size_pt: 18.0,
            bold: false,
            font: "Arial".to_string(),
            color: Rgb::BLACK,
        };
        let para = Paragraph::new("Point", style)
            .with_bullet(true)
            .with_space_after(6.0)
            .with_alignment(Alignment::Center);
        assert!(para.bullet);
        assert_eq!(para.space_after_pt, Some(6.0));
        assert_eq!(para.alignment, Some(Alignment::Center));
    }
}
