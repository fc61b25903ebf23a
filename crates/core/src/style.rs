//! CSS custom-property extraction and theme resolution.
//!
//! Only the first `:root { ... }` block is read. Values are stored raw and
//! parsed into colors and font names when the [`Theme`] is resolved.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Matches CSS block comments.
static CSS_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Matches the body of the first `:root` rule.
static ROOT_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s):root\s*\{([^}]+)\}").unwrap());

/// Matches `--name: value` declarations inside a rule body.
static CUSTOM_PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([A-Za-z0-9_-]+)\s*:\s*([^;]+)").unwrap());

/// Matches the channel list of `rgb()` / `rgba()`.
static RGB_FUNCTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)").unwrap()
});

/// Default dark background, also used for class-inferred dark slides.
pub const DARK_BACKGROUND: Rgb = Rgb::new(0x0A, 0x0A, 0x0A);

/// Default light background, also used for class-inferred light slides.
pub const LIGHT_BACKGROUND: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

/// Relative luminance below which light text reads better than dark text.
const DARK_LUMINANCE_THRESHOLD: f64 = 0.179;

/// A 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS color value.
    ///
    /// Supports `#rgb`, `#rrggbb`, `#rrggbbaa` (alpha ignored), `rgb()`/`rgba()`
    /// and a handful of named colors.
    pub fn parse(value: &str) -> Option<Rgb> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex(hex);
        }

        if let Some(caps) = RGB_FUNCTION_REGEX.captures(value) {
            let channel = |i: usize| -> u8 {
                caps[i].parse::<u32>().map(|v| v.min(255) as u8).unwrap_or(255)
            };
            return Some(Rgb::new(channel(1), channel(2), channel(3)));
        }

        match value.to_ascii_lowercase().as_str() {
            "white" | "transparent" => Some(Rgb::WHITE),
            "black" => Some(Rgb::BLACK),
            "red" => Some(Rgb::new(0xFF, 0x00, 0x00)),
            "green" => Some(Rgb::new(0x00, 0xFF, 0x00)),
            "blue" => Some(Rgb::new(0x00, 0x00, 0xFF)),
            _ => None,
        }
    }

    /// Parse hex digits without the leading `#`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex[..6].to_string(),
            _ => return None,
        };

        let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
    }

    /// Uppercase hex without `#`, as used by DrawingML `srgbClr`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    pub fn luminance(&self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = channel as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// Whether light text should be used on this background.
    pub fn is_dark(&self) -> bool {
        self.luminance() < DARK_LUMINANCE_THRESHOLD
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value).ok_or_else(|| format!("invalid color: {}", value))
    }
}

/// CSS custom properties declared under `:root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    vars: BTreeMap<String, String>,
}

impl StyleSheet {
    /// Create an empty stylesheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract custom properties from the first `:root` block of `css`.
    pub fn parse(css: &str) -> Self {
        let css = CSS_COMMENT_REGEX.replace_all(css, "");
        let mut sheet = Self::new();

        let Some(root) = ROOT_BLOCK_REGEX.captures(&css) else {
            return sheet;
        };

        for caps in CUSTOM_PROPERTY_REGEX.captures_iter(&root[1]) {
            let value = caps[2].trim();
            if !value.is_empty() {
                sheet.insert(caps[1].trim(), value);
            }
        }

        sheet
    }

    /// Set a property (name without the leading `--`).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Raw value of a property (name without the leading `--`).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// First property present among `names`.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Deck colors and fonts resolved from the stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub background_primary: Rgb,
    pub background_dark: Rgb,
    pub text_primary: Rgb,
    pub text_on_dark: Rgb,
    pub accent: Rgb,
    pub display_font: String,
    pub body_font: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_primary: LIGHT_BACKGROUND,
            background_dark: DARK_BACKGROUND,
            text_primary: Rgb::new(0x1A, 0x1A, 0x1A),
            text_on_dark: Rgb::WHITE,
            accent: Rgb::new(0x00, 0xE3, 0xAA),
            display_font: "Arial".to_string(),
            body_font: "Arial".to_string(),
        }
    }
}

impl Theme {
    /// Resolve the theme, falling back to defaults for missing or unparseable keys.
    pub fn from_stylesheet(sheet: &StyleSheet) -> Self {
        let defaults = Self::default();

        Self {
            background_primary: resolve_color(
                sheet,
                &["background-primary", "bg-primary"],
                defaults.background_primary,
            ),
            background_dark: resolve_color(
                sheet,
                &["background-dark", "bg-dark"],
                defaults.background_dark,
            ),
            text_primary: resolve_color(sheet, &["text-primary"], defaults.text_primary),
            text_on_dark: resolve_color(sheet, &["text-on-dark"], defaults.text_on_dark),
            accent: resolve_color(sheet, &["accent"], defaults.accent),
            display_font: resolve_font(
                sheet,
                &["display-font", "font-display"],
                defaults.display_font,
            ),
            body_font: resolve_font(sheet, &["body-font", "font-body"], defaults.body_font),
        }
    }

    /// Text color to use on the given background.
    pub fn text_for_background(&self, background: Rgb) -> Rgb {
        if background.is_dark() {
            self.text_on_dark
        } else {
            self.text_primary
        }
    }
}

fn resolve_color(sheet: &StyleSheet, keys: &[&str], fallback: Rgb) -> Rgb {
    match sheet.get_any(keys) {
        Some(raw) => Rgb::parse(raw).unwrap_or_else(|| {
            log::warn!("Unrecognized color '{}' for --{}, using {}", raw, keys[0], fallback);
            fallback
        }),
        None => fallback,
    }
}

fn resolve_font(sheet: &StyleSheet, keys: &[&str], fallback: String) -> String {
    sheet
        .get_any(keys)
        .and_then(first_font_family)
        .unwrap_or(fallback)
}

/// First family of a CSS font stack, without quotes.
pub fn first_font_family(value: &str) -> Option<String> {
    let family = value
        .split(',')
        .next()?
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();

    if family.is_empty() {
        None
    } else {
        Some(family.to_string())
    }
}
