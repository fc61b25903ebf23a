//! Slide extraction from scanner events.
//!
//! [`SlideExtractor`] is a state machine fed by [`scan`]. It recognizes slide
//! containers (`<section class="slide ...">`), captures heading, paragraph and
//! list item text, collects images and speaker notes, and buffers `<style>`
//! text for the style resolver. Unbalanced markup is tolerated: end tags that
//! do not match anything open are ignored.

use crate::classify::{classify, infer_background};
use crate::normalize::{truncate_chars, TextNormalizer};
use crate::scanner::{scan, MarkupEvent, MarkupHandler, StartTag};
use crate::style::StyleSheet;
use crate::types::{ContentBlock, ExtractedDeck, ImageRef, SlideRecord};

/// Paragraphs shorter than this (in characters) may become the slide title.
const TITLE_PARAGRAPH_MAX_CHARS: usize = 100;

/// Tags whose text is captured inside a slide.
const CAPTURED_TAGS: &[&str] = &["h1", "h2", "h3", "p", "li", "span", "em", "strong"];

/// Where the extractor currently is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    OutsideSlide,
    InsideSlide,
    InsideSpeakerNotes,
    InsideCapturedTag,
    InsideStyle,
}

/// Extract every slide and the `:root` custom properties from an HTML document.
pub fn extract_deck(html: &str) -> ExtractedDeck {
    let mut extractor = SlideExtractor::new();
    scan(html, &mut extractor);
    extractor.finish()
}

fn is_slide_container(tag: &StartTag) -> bool {
    tag.name == "section"
        && tag
            .class()
            .split_whitespace()
            .any(|token| token.contains("slide"))
}

fn is_inline_capture(name: &str) -> bool {
    matches!(name, "span" | "em" | "strong")
}

/// Text being buffered for one open captured element.
#[derive(Debug)]
struct Capture {
    tag: String,
    text: String,
}

/// Speaker-notes container being read.
#[derive(Debug, Default)]
struct NotesCapture {
    /// Nested `div`s opened inside the notes container.
    div_depth: usize,
    text: String,
}

/// The slide currently being extracted.
#[derive(Debug)]
struct OpenSlide {
    record: SlideRecord,
    /// Nested `section`s opened inside the slide container.
    section_depth: usize,
    notes: Option<NotesCapture>,
    captures: Vec<Capture>,
}

impl OpenSlide {
    fn new(record: SlideRecord) -> Self {
        Self {
            record,
            section_depth: 0,
            notes: None,
            captures: Vec::new(),
        }
    }

    fn is_open(&self, tag: &str) -> bool {
        self.captures.iter().any(|c| c.tag == tag)
    }

    /// Close the innermost open `tag` and everything opened after it.
    fn close_capture(&mut self, tag: &str, normalizer: &TextNormalizer) {
        if let Some(index) = self.captures.iter().rposition(|c| c.tag == tag) {
            self.close_captures_from(index, normalizer);
        }
    }

    fn close_captures_from(&mut self, index: usize, normalizer: &TextNormalizer) {
        while self.captures.len() > index {
            if let Some(capture) = self.captures.pop() {
                self.apply_capture(capture, normalizer);
            }
        }
    }

    fn apply_capture(&mut self, capture: Capture, normalizer: &TextNormalizer) {
        if is_inline_capture(&capture.tag) {
            if let Some(parent) = self.captures.last_mut() {
                parent.text.push_str(&capture.text);
            }
            return;
        }

        let text = normalizer.normalize_inline(&capture.text);
        if text.is_empty() {
            return;
        }

        let slide = &mut self.record;
        match capture.tag.as_str() {
            "h1" => {
                slide.set_title_if_empty(text);
            }
            "h2" => {
                if !slide.has_title() {
                    slide.set_title_if_empty(text);
                } else {
                    slide.set_subtitle_if_empty(text);
                }
            }
            "h3" => slide.add_block(ContentBlock::Heading { text, level: 3 }),
            "p" => {
                if !slide.has_title() && text.chars().count() < TITLE_PARAGRAPH_MAX_CHARS {
                    slide.set_title_if_empty(text);
                } else {
                    slide.add_block(ContentBlock::Text { text });
                }
            }
            "li" => slide.add_block(ContentBlock::Bullet { text }),
            _ => {}
        }
    }

    fn finish_notes(&mut self, normalizer: &TextNormalizer) {
        if let Some(notes) = self.notes.take() {
            let text = normalizer.normalize_block(&notes.text);
            self.record.append_notes(&text);
        }
    }

    fn finish(mut self, normalizer: &TextNormalizer) -> SlideRecord {
        self.close_captures_from(0, normalizer);
        self.finish_notes(normalizer);
        self.record.background = infer_background(&self.record.classes);
        self.record
    }
}

/// Event-driven slide extractor.
#[derive(Debug)]
pub struct SlideExtractor {
    normalizer: TextNormalizer,
    slides: Vec<SlideRecord>,
    current: Option<OpenSlide>,
    in_style: bool,
    style_text: String,
    stylesheet: StyleSheet,
}

impl Default for SlideExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideExtractor {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            slides: Vec::new(),
            current: None,
            in_style: false,
            style_text: String::new(),
            stylesheet: StyleSheet::new(),
        }
    }

    /// Use a custom text normalizer.
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn state(&self) -> ExtractorState {
        if self.in_style {
            return ExtractorState::InsideStyle;
        }
        match &self.current {
            None => ExtractorState::OutsideSlide,
            Some(slide) if slide.notes.is_some() => ExtractorState::InsideSpeakerNotes,
            Some(slide) if !slide.captures.is_empty() => ExtractorState::InsideCapturedTag,
            Some(_) => ExtractorState::InsideSlide,
        }
    }

    /// Slides completed so far.
    pub fn slides(&self) -> &[SlideRecord] {
        &self.slides
    }

    /// Finalize any open slide and return the extracted deck.
    pub fn finish(mut self) -> ExtractedDeck {
        if self.in_style {
            self.end_style();
        }
        if let Some(open) = self.current.take() {
            log::debug!("Slide {} was not closed, finalizing", open.record.number);
            self.push_slide(open);
        }

        ExtractedDeck {
            slides: self.slides,
            stylesheet: self.stylesheet,
        }
    }

    fn start_tag(&mut self, tag: &StartTag) {
        if tag.name == "style" {
            self.in_style = true;
            return;
        }

        if is_slide_container(tag) {
            if let Some(open) = self.current.take() {
                log::debug!(
                    "Slide {} still open at next slide container, finalizing",
                    open.record.number
                );
                self.push_slide(open);
            }
            self.open_slide(tag);
            return;
        }

        if self.current.is_none() {
            return;
        }

        let normalizer = &self.normalizer;
        let Some(slide) = self.current.as_mut() else {
            return;
        };

        if let Some(notes) = slide.notes.as_mut() {
            match tag.name.as_str() {
                "div" => {
                    notes.div_depth += 1;
                    notes.text.push('\n');
                }
                "p" | "li" | "br" => notes.text.push('\n'),
                _ => {}
            }
            return;
        }

        match tag.name.as_str() {
            "section" => slide.section_depth += 1,
            "div" if tag.class().contains("speaker-notes") => {
                slide.notes = Some(NotesCapture::default());
            }
            "img" => {
                let src = tag.attr("src").unwrap_or("").trim();
                if !src.is_empty() {
                    slide.record.images.push(ImageRef {
                        src: src.to_string(),
                        alt: tag.attr("alt").unwrap_or("").to_string(),
                        style: tag.attr("style").unwrap_or("").to_string(),
                    });
                }
            }
            "br" => {
                if let Some(capture) = slide.captures.last_mut() {
                    capture.text.push(' ');
                }
            }
            name if CAPTURED_TAGS.contains(&name) => {
                if !is_inline_capture(name) {
                    slide.close_capture("p", normalizer);
                }
                if name == "li" {
                    slide.close_capture("li", normalizer);
                }
                slide.captures.push(Capture {
                    tag: name.to_string(),
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        if name == "style" {
            if self.in_style {
                self.end_style();
            }
            return;
        }

        let normalizer = &self.normalizer;
        let Some(slide) = self.current.as_mut() else {
            return;
        };

        if let Some(notes) = slide.notes.as_mut() {
            match name {
                "div" if notes.div_depth == 0 => slide.finish_notes(normalizer),
                "div" => {
                    notes.div_depth -= 1;
                    notes.text.push('\n');
                }
                "p" | "li" => notes.text.push('\n'),
                _ => {}
            }
            return;
        }

        match name {
            "section" if slide.section_depth > 0 => slide.section_depth -= 1,
            "section" => {
                if let Some(open) = self.current.take() {
                    self.push_slide(open);
                }
            }
            name if CAPTURED_TAGS.contains(&name) && slide.is_open(name) => {
                slide.close_capture(name, normalizer);
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_style {
            self.style_text.push_str(text);
            return;
        }

        let Some(slide) = self.current.as_mut() else {
            return;
        };

        if let Some(notes) = slide.notes.as_mut() {
            notes.text.push_str(text);
        } else if let Some(capture) = slide.captures.last_mut() {
            capture.text.push_str(text);
        }
    }

    fn open_slide(&mut self, tag: &StartTag) {
        let classes = tag.class().trim().to_string();
        let (slide_type, layout) = classify(&classes);
        let number = self.slides.len() + 1;

        log::debug!(
            "Slide {}: class=\"{}\" -> {} / {}",
            number,
            classes,
            slide_type,
            layout
        );

        self.current = Some(OpenSlide::new(SlideRecord::new(
            number, classes, slide_type, layout,
        )));
    }

    fn push_slide(&mut self, open: OpenSlide) {
        let record = open.finish(&self.normalizer);
        log::debug!(
            "Extracted slide {} ({}): \"{}\", {} blocks, {} images",
            record.number,
            record.slide_type,
            truncate_chars(record.title_text(), 40),
            record.content.len(),
            record.images.len()
        );
        self.slides.push(record);
    }

    fn end_style(&mut self) {
        self.in_style = false;
        self.style_text.push('\n');
        self.stylesheet = StyleSheet::parse(&self.style_text);
        log::debug!("Parsed {} CSS custom properties", self.stylesheet.len());
    }
}

impl MarkupHandler for SlideExtractor {
    fn handle(&mut self, event: MarkupEvent<'_>) {
        match event {
            MarkupEvent::Start(tag) => self.start_tag(tag),
            MarkupEvent::End { name } => self.end_tag(name),
            MarkupEvent::Text(text) => self.text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{DARK_BACKGROUND, LIGHT_BACKGROUND};
    use crate::types::{LayoutId, SlideType};

    fn text(s: &str) -> ContentBlock {
        ContentBlock::Text { text: s.to_string() }
    }

    fn bullet(s: &str) -> ContentBlock {
        ContentBlock::Bullet { text: s.to_string() }
    }

    #[test]
    fn test_slides_numbered_in_order() {
        let deck = extract_deck(
            r#"<html><body>
            <section class="slide title-slide"><h1>One</h1></section>
            <section class="slide"><h1>Two</h1></section>
            <section class="slide closing"><h1>Three</h1></section>
            </body></html>"#,
        );

        assert_eq!(deck.slides.len(), 3);
        let numbers: Vec<usize> = deck.slides.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(deck.slides[0].slide_type, SlideType::Title);
        assert_eq!(deck.slides[1].slide_type, SlideType::Content);
        assert_eq!(deck.slides[2].layout, LayoutId::TitleSlide);
        assert_eq!(deck.slides[2].title_text(), "Three");
    }

    #[test]
    fn test_title_and_subtitle() {
        let deck = extract_deck(
            r#"<section class="slide title-slide bg-dark">
                <h1>Launch   Plan</h1>
                <h2>Q3 review</h2>
                <h2>Ignored</h2>
            </section>"#,
        );

        let slide = &deck.slides[0];
        assert_eq!(slide.title.as_deref(), Some("Launch Plan"));
        assert_eq!(slide.subtitle.as_deref(), Some("Q3 review"));
        assert_eq!(slide.slide_type, SlideType::Title);
        assert_eq!(slide.layout, LayoutId::TitleSlide);
        assert_eq!(slide.background, Some(DARK_BACKGROUND));
    }

    #[test]
    fn test_h2_becomes_title_without_h1() {
        let deck = extract_deck(r#"<section class="slide"><h2>Only h2</h2></section>"#);
        assert_eq!(deck.slides[0].title_text(), "Only h2");
        assert_eq!(deck.slides[0].subtitle, None);
    }

    #[test]
    fn test_first_h1_wins() {
        let deck = extract_deck(r#"<section class="slide"><h1>A</h1><h1>B</h1></section>"#);
        assert_eq!(deck.slides[0].title_text(), "A");
    }

    #[test]
    fn test_short_paragraph_becomes_title() {
        let deck = extract_deck(
            r#"<section class="slide"><p>Short</p><p>Second paragraph</p></section>"#,
        );
        let slide = &deck.slides[0];
        assert_eq!(slide.title_text(), "Short");
        assert_eq!(slide.content, vec![text("Second paragraph")]);
    }

    #[test]
    fn test_long_paragraph_is_content() {
        let long = "word ".repeat(30);
        let html = format!(r#"<section class="slide"><p>{}</p></section>"#, long);
        let deck = extract_deck(&html);
        let slide = &deck.slides[0];
        assert_eq!(slide.title, None);
        assert_eq!(slide.content, vec![text(long.trim())]);
    }

    #[test]
    fn test_inline_text_kept_in_paragraph() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>T</h1>
               <p>Hello <strong>bold</strong> and <em>very <span>nested</span></em> world</p>
            </section>"#,
        );
        assert_eq!(
            deck.slides[0].content,
            vec![text("Hello bold and very nested world")]
        );
    }

    #[test]
    fn test_headings_and_bullets() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>Agenda</h1>
               <h3>Topics</h3>
               <ul><li>First</li><li>Second</li></ul>
            </section>"#,
        );
        assert_eq!(
            deck.slides[0].content,
            vec![
                ContentBlock::Heading {
                    text: "Topics".to_string(),
                    level: 3
                },
                bullet("First"),
                bullet("Second"),
            ]
        );
    }

    #[test]
    fn test_optional_end_tags() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>T</h1>
               <p>one
               <p>two
               <ul><li>a<li>b</ul>
            </section>"#,
        );
        assert_eq!(
            deck.slides[0].content,
            vec![text("one"), text("two"), bullet("a"), bullet("b")]
        );
    }

    #[test]
    fn test_unmatched_end_tags_ignored() {
        let deck = extract_deck(
            r#"<section class="slide"></p></li></h2></strong>
               <h1>Title</h1></h3><p>Body text here</p></span>
            </section>"#,
        );
        let slide = &deck.slides[0];
        assert_eq!(slide.title_text(), "Title");
        assert_eq!(slide.content, vec![text("Body text here")]);
    }

    #[test]
    fn test_end_tag_closes_inner_captures() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>T</h1><li>item <strong>bold</li><p>after</p></section>"#,
        );
        assert_eq!(
            deck.slides[0].content,
            vec![bullet("item bold"), text("after")]
        );
    }

    #[test]
    fn test_speaker_notes() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>T</h1>
               <div class="speaker-notes">
                 <p>Line   one</p>
                 <div>Line two</div>
               </div>
               <p>Visible text</p>
               <div class="speaker-notes">More</div>
            </section>"#,
        );
        let slide = &deck.slides[0];
        assert_eq!(
            slide.speaker_notes.as_deref(),
            Some("Line one\nLine two\nMore")
        );
        assert_eq!(slide.content, vec![text("Visible text")]);
    }

    #[test]
    fn test_no_notes_when_absent() {
        let deck = extract_deck(r#"<section class="slide"><h1>T</h1></section>"#);
        assert_eq!(deck.slides[0].speaker_notes, None);
    }

    #[test]
    fn test_images() {
        let deck = extract_deck(
            r#"<section class="slide image-slide">
               <img src="photo.png" alt="A photo" style="width: 50%">
               <img src="">
               <div class="speaker-notes"><img src="notes.png"></div>
               <p><img src="inline.jpg"/>Caption</p>
            </section>"#,
        );
        let slide = &deck.slides[0];
        assert_eq!(slide.images.len(), 2);
        assert_eq!(slide.images[0].src, "photo.png");
        assert_eq!(slide.images[0].alt, "A photo");
        assert_eq!(slide.images[0].style, "width: 50%");
        assert_eq!(slide.images[1].src, "inline.jpg");
        assert_eq!(slide.title_text(), "Caption");
    }

    #[test]
    fn test_nested_sections() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>Outer</h1>
               <section class="column"><p>Inner paragraph text</p></section>
               <p>After the column</p>
            </section>
            <section class="slide"><h1>Next</h1></section>"#,
        );
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(
            deck.slides[0].content,
            vec![text("Inner paragraph text"), text("After the column")]
        );
    }

    #[test]
    fn test_unclosed_slide_ends_at_next_slide() {
        let deck = extract_deck(
            r#"<section class="slide"><h1>A</h1>
               <section class="slide"><h1>B</h1><p>Body of the second slide</p></section>
               <section class="slide"><h1>C</h1></section>"#,
        );
        let titles: Vec<&str> = deck.slides.iter().map(|s| s.title_text()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(
            deck.slides.iter().map(|s| s.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(deck.slides[0].content.is_empty());
        assert_eq!(deck.slides[1].content, vec![text("Body of the second slide")]);
    }

    #[test]
    fn test_non_slide_markup_ignored() {
        let deck = extract_deck(
            r#"<h1>Page heading</h1>
               <section class="intro"><h1>Not a slide</h1></section>
               <div class="slide"><h1>Div slide</h1></div>"#,
        );
        assert!(deck.is_empty());
    }

    #[test]
    fn test_unclosed_slide_finalized() {
        let deck = extract_deck(r#"<section class="slide bg-light"><h1>Dangling"#);
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.slides[0].title_text(), "Dangling");
        assert_eq!(deck.slides[0].background, Some(LIGHT_BACKGROUND));
    }

    #[test]
    fn test_style_with_markup_characters() {
        let deck = extract_deck(
            r#"<head><style>
                 a > b, p < q { color: red; }
                 :root { --accent: #ff0000; --font-display: 'Inter', sans-serif; }
               </style></head>
               <section class="slide"><h1>T</h1></section>"#,
        );
        assert_eq!(deck.stylesheet.get("accent"), Some("#ff0000"));
        assert_eq!(deck.stylesheet.len(), 2);
        assert_eq!(deck.slides[0].title_text(), "T");
        assert!(deck.slides[0].content.is_empty());
    }

    #[test]
    fn test_style_accumulates_across_blocks() {
        let deck = extract_deck(
            r#"<style>body { margin: 0; }</style>
               <style>:root { --bg-dark: #111111; }</style>"#,
        );
        assert_eq!(deck.stylesheet.get("bg-dark"), Some("#111111"));
    }

    #[test]
    fn test_state_transitions() {
        let mut extractor = SlideExtractor::new();
        assert_eq!(extractor.state(), ExtractorState::OutsideSlide);

        scan(r#"<section class="slide"><p>open"#, &mut extractor);
        assert_eq!(extractor.state(), ExtractorState::InsideCapturedTag);

        scan(r#"</p><div class="speaker-notes">"#, &mut extractor);
        assert_eq!(extractor.state(), ExtractorState::InsideSpeakerNotes);

        scan("</div>", &mut extractor);
        assert_eq!(extractor.state(), ExtractorState::InsideSlide);

        scan("</section>", &mut extractor);
        assert_eq!(extractor.state(), ExtractorState::OutsideSlide);
        assert_eq!(extractor.slides().len(), 1);
        assert_eq!(extractor.slides()[0].title_text(), "open");
    }
}
