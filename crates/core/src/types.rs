//! Domain types for representing slides extracted from an HTML deck.

use crate::style::{Rgb, StyleSheet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the extractor learned from one HTML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDeck {
    /// Slides in document order.
    pub slides: Vec<SlideRecord>,

    /// CSS custom properties from the `:root` block.
    pub stylesheet: StyleSheet,
}

impl ExtractedDeck {
    /// Whether no slide container was recognized.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// Semantic slide type inferred from the slide's CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Title,
    Content,
    Split,
    Stats,
    Quote,
    Image,
    Section,
    Closing,
    Blank,
}

impl SlideType {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Title => "title",
            SlideType::Content => "content",
            SlideType::Split => "split",
            SlideType::Stats => "stats",
            SlideType::Quote => "quote",
            SlideType::Image => "image",
            SlideType::Section => "section",
            SlideType::Closing => "closing",
            SlideType::Blank => "blank",
        }
    }

    /// Types rendered on the dark background by default.
    pub fn prefers_dark_background(&self) -> bool {
        matches!(self, SlideType::Title | SlideType::Section | SlideType::Closing)
    }

    /// Types that show a subtitle under the title.
    pub fn shows_subtitle(&self) -> bool {
        matches!(self, SlideType::Title | SlideType::Closing)
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template layout a slide should be instantiated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutId {
    TitleSlide,
    TitleContent,
    TwoColumn,
    SectionHeader,
    Blank,
}

impl LayoutId {
    /// Canonical layout identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutId::TitleSlide => "title_slide",
            LayoutId::TitleContent => "title_content",
            LayoutId::TwoColumn => "two_column",
            LayoutId::SectionHeader => "section_header",
            LayoutId::Blank => "blank",
        }
    }

    /// Template layout names that satisfy this layout, most specific first.
    pub fn search_names(&self) -> &'static [&'static str] {
        match self {
            LayoutId::TitleSlide => &["Title Slide", "Title Only", "title"],
            LayoutId::TitleContent => &["Title and Content", "Title Content", "content"],
            LayoutId::SectionHeader => &["Section Header", "Section", "section"],
            LayoutId::TwoColumn => &["Two Content", "Two Column", "Comparison", "comparison"],
            LayoutId::Blank => &["Blank", "blank"],
        }
    }

    /// Positional fallback when no layout name matches.
    pub fn fallback_index(&self, layout_count: usize) -> Option<usize> {
        let preferred = match self {
            LayoutId::TitleSlide => Some(0),
            LayoutId::TitleContent => Some(1),
            LayoutId::SectionHeader => Some(2),
            LayoutId::TwoColumn => Some(3),
            LayoutId::Blank => None,
        };

        match preferred {
            Some(idx) if idx < layout_count => Some(idx),
            _ => layout_count.checked_sub(1),
        }
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed piece of slide body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { text: String, level: u8 },
    Text { text: String },
    Bullet { text: String },
}

impl ContentBlock {
    /// The block's text.
    pub fn text(&self) -> &str {
        match self {
            ContentBlock::Heading { text, .. }
            | ContentBlock::Text { text }
            | ContentBlock::Bullet { text } => text,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, ContentBlock::Heading { .. })
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self, ContentBlock::Bullet { .. })
    }
}

/// An `<img>` found inside a slide. Resolved at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// URL, path, or data URI from the `src` attribute.
    pub src: String,

    pub alt: String,

    /// Inline `style` attribute, kept verbatim.
    pub style: String,
}

/// A single slide extracted from the HTML deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub number: usize,

    pub slide_type: SlideType,

    pub layout: LayoutId,

    /// Raw value of the container's `class` attribute.
    pub classes: String,

    pub title: Option<String>,

    pub subtitle: Option<String>,

    /// Body content in document order.
    pub content: Vec<ContentBlock>,

    pub images: Vec<ImageRef>,

    pub speaker_notes: Option<String>,

    /// Background detected from the class list, if any.
    pub background: Option<Rgb>,
}

impl SlideRecord {
    /// Create an empty slide with the given number and classification.
    pub fn new(
        number: usize,
        classes: impl Into<String>,
        slide_type: SlideType,
        layout: LayoutId,
    ) -> Self {
        Self {
            number,
            slide_type,
            layout,
            classes: classes.into(),
            title: None,
            subtitle: None,
            content: Vec::new(),
            images: Vec::new(),
            speaker_notes: None,
            background: None,
        }
    }

    /// Title text, or an empty string.
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    /// Set the title unless one is already set. Returns whether it was set.
    pub fn set_title_if_empty(&mut self, text: impl Into<String>) -> bool {
        if self.title.is_some() {
            return false;
        }
        self.title = Some(text.into());
        true
    }

    /// Set the subtitle unless one is already set.
    pub fn set_subtitle_if_empty(&mut self, text: impl Into<String>) -> bool {
        if self.subtitle.is_some() {
            return false;
        }
        self.subtitle = Some(text.into());
        true
    }

    /// Append a content block.
    pub fn add_block(&mut self, block: ContentBlock) {
        self.content.push(block);
    }

    /// Append speaker notes, joining with any notes already present.
    pub fn append_notes(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.speaker_notes {
            Some(ref mut existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.speaker_notes = Some(text.to_string()),
        }
    }

    /// Whether the class string contains the given fragment.
    pub fn has_class_fragment(&self, fragment: &str) -> bool {
        self.classes.contains(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_first_wins() {
        let mut slide = SlideRecord::new(1, "slide", SlideType::Content, LayoutId::TitleContent);
        assert!(slide.set_title_if_empty("First"));
        assert!(!slide.set_title_if_empty("Second"));
        assert_eq!(slide.title_text(), "First");
    }

    #[test]
    fn test_append_notes_joins_lines() {
        let mut slide = SlideRecord::new(1, "slide", SlideType::Content, LayoutId::TitleContent);
        slide.append_notes("");
        assert_eq!(slide.speaker_notes, None);
        slide.append_notes("one");
        slide.append_notes("two");
        assert_eq!(slide.speaker_notes.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_layout_fallback_index() {
        assert_eq!(LayoutId::TitleSlide.fallback_index(7), Some(0));
        assert_eq!(LayoutId::TwoColumn.fallback_index(7), Some(3));
        assert_eq!(LayoutId::TwoColumn.fallback_index(2), Some(1));
        assert_eq!(LayoutId::Blank.fallback_index(7), Some(6));
        assert_eq!(LayoutId::TitleContent.fallback_index(0), None);
    }

    #[test]
    fn test_dark_background_types() {
        assert!(SlideType::Title.prefers_dark_background());
        assert!(SlideType::Section.prefers_dark_background());
        assert!(SlideType::Closing.prefers_dark_background());
        assert!(!SlideType::Stats.prefers_dark_background());
        assert!(SlideType::Closing.shows_subtitle());
        assert!(!SlideType::Section.shows_subtitle());
    }

    #[test]
    fn test_content_block_text() {
        let heading = ContentBlock::Heading {
            text: "Agenda".to_string(),
            level: 3,
        };
        assert_eq!(heading.text(), "Agenda");
        assert!(heading.is_heading());
        assert!(ContentBlock::Bullet { text: "x".into() }.is_bullet());
    }
}
