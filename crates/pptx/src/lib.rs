//! PPTX (Office Open XML) writer backend for HTML slide decks.
//!
//! Writes .pptx files, which are ZIP archives containing XML documents, from a
//! built-in widescreen template, and reads their slide text back.

mod package;
mod reader;
mod slide;
mod template;
mod xml;

pub use package::PptxDeck;
pub use reader::{OutlineReader, SlideOutline};
pub use slide::PptxSlide;
pub use template::{SLIDE_HEIGHT, SLIDE_WIDTH};
