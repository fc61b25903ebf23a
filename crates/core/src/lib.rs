//! Core domain types, HTML slide extraction, theming, and deck composition
//! for converting HTML slide decks to presentations.

pub mod assets;
pub mod canvas;
pub mod classify;
pub mod compose;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod scanner;
pub mod style;
pub mod types;

pub use assets::AssetResolver;
pub use canvas::{
    Alignment, DeckWriter, Emu, Paragraph, PlaceholderRole, Rect, SlideCanvas, TextStyle,
};
pub use compose::{ComposeReport, DeckComposer};
pub use error::{Error, Result};
pub use extract::{extract_deck, SlideExtractor};
pub use normalize::TextNormalizer;
pub use style::{Rgb, StyleSheet, Theme};
pub use types::{ContentBlock, ExtractedDeck, ImageRef, LayoutId, SlideRecord, SlideType};
