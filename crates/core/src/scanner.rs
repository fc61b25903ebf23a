//! Streaming HTML scanning on top of the html5ever tokenizer.
//!
//! No tree is built. Tags and text are forwarded to a [`MarkupHandler`] as
//! they are tokenized, so malformed documents never fail to scan.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// A start tag with its attributes. Names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl StartTag {
    fn from_tag(tag: &Tag) -> Self {
        Self {
            name: tag.name.to_string(),
            attrs: tag
                .attrs
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
            self_closing: tag.self_closing,
        }
    }

    /// Value of the named attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `class` attribute, or an empty string.
    pub fn class(&self) -> &str {
        self.attr("class").unwrap_or("")
    }
}

/// A markup event delivered to a [`MarkupHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupEvent<'a> {
    Start(&'a StartTag),
    End { name: &'a str },
    /// Character data with references decoded. One text run may arrive in several events.
    Text(&'a str),
}

/// Receiver of markup events.
pub trait MarkupHandler {
    fn handle(&mut self, event: MarkupEvent<'_>);
}

/// Tokenizer mode to switch to after a start tag whose content is not markup.
fn raw_kind(name: &str) -> Option<RawKind> {
    match name {
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "script" => Some(RawKind::ScriptData),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

struct EventSink<'h, H: MarkupHandler> {
    handler: &'h mut H,
}

impl<'h, H: MarkupHandler> TokenSink for EventSink<'h, H> {
    type Handle = ();

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    let start = StartTag::from_tag(&tag);
                    self.handler.handle(MarkupEvent::Start(&start));
                    if let Some(kind) = raw_kind(&start.name) {
                        return TokenSinkResult::RawData(kind);
                    }
                }
                TagKind::EndTag => {
                    self.handler.handle(MarkupEvent::End { name: &tag.name });
                }
            },
            Token::CharacterTokens(text) => {
                self.handler.handle(MarkupEvent::Text(&text));
            }
            Token::ParseError(message) => {
                log::trace!("HTML parse error at line {}: {}", line_number, message);
            }
            Token::DoctypeToken(_)
            | Token::CommentToken(_)
            | Token::NullCharacterToken
            | Token::EOFToken => {}
        }

        TokenSinkResult::Continue
    }
}

/// Tokenize `html` and deliver every tag and text run to `handler` in document order.
pub fn scan<H: MarkupHandler>(html: &str, handler: &mut H) {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(EventSink { handler }, TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
}
