//! Error types for HTML to PowerPoint conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting an HTML deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input document contained no recognizable slide containers.
    #[error("No slides found in HTML document")]
    NoSlides,

    /// An image reference could not be turned into a readable file.
    #[error("Asset error: {0}")]
    AssetError(String),

    /// An image could not be decoded or is not a supported picture format.
    #[error("Image error: {0}")]
    ImageError(String),

    /// The template has no usable layout, or a layout index is out of range.
    #[error("Layout error: {0}")]
    LayoutError(String),

    /// A slide operation was not possible (missing placeholder, etc.).
    #[error("Composition error: {0}")]
    CompositionError(String),

    /// XML generation or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Failed to format generated markup.
    #[error("Formatting error: {0}")]
    FormatError(#[from] std::fmt::Error),
}
