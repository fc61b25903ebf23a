//! Slide classification from container CSS classes.

use crate::style::{Rgb, DARK_BACKGROUND, LIGHT_BACKGROUND};
use crate::types::{LayoutId, SlideType};

/// A classification rule: any of `patterns` appearing in the class string selects the pair.
struct ClassRule {
    patterns: &'static [&'static str],
    slide_type: SlideType,
    layout: LayoutId,
}

/// Checked in order; first match wins.
const CLASS_RULES: &[ClassRule] = &[
    ClassRule {
        patterns: &["title-slide"],
        slide_type: SlideType::Title,
        layout: LayoutId::TitleSlide,
    },
    ClassRule {
        patterns: &["split-slide", "two-column"],
        slide_type: SlideType::Split,
        layout: LayoutId::TwoColumn,
    },
    ClassRule {
        patterns: &["stats-slide", "stats"],
        slide_type: SlideType::Stats,
        layout: LayoutId::TitleContent,
    },
    ClassRule {
        patterns: &["quote-slide", "quote"],
        slide_type: SlideType::Quote,
        layout: LayoutId::TitleContent,
    },
    ClassRule {
        patterns: &["image-slide", "image-heavy"],
        slide_type: SlideType::Image,
        layout: LayoutId::TitleContent,
    },
    ClassRule {
        patterns: &["section-header", "section"],
        slide_type: SlideType::Section,
        layout: LayoutId::SectionHeader,
    },
    ClassRule {
        patterns: &["closing-slide", "closing"],
        slide_type: SlideType::Closing,
        layout: LayoutId::TitleSlide,
    },
    ClassRule {
        patterns: &["blank"],
        slide_type: SlideType::Blank,
        layout: LayoutId::Blank,
    },
];

const DARK_PATTERNS: &[&str] = &["title-slide", "bg-dark", "dark"];
const LIGHT_PATTERNS: &[&str] = &["bg-light", "light"];

/// Map a slide container's class string to a slide type and template layout.
///
/// Unrecognized class strings classify as `Content` / `TitleContent`.
pub fn classify(classes: &str) -> (SlideType, LayoutId) {
    CLASS_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| classes.contains(p)))
        .map(|rule| (rule.slide_type, rule.layout))
        .unwrap_or((SlideType::Content, LayoutId::TitleContent))
}

/// Background color implied by the class string, if any.
pub fn infer_background(classes: &str) -> Option<Rgb> {
    if DARK_PATTERNS.iter().any(|p| classes.contains(p)) {
        Some(DARK_BACKGROUND)
    } else if LIGHT_PATTERNS.iter().any(|p| classes.contains(p)) {
        Some(LIGHT_BACKGROUND)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_classes() {
        assert_eq!(classify("slide title-slide"), (SlideType::Title, LayoutId::TitleSlide));
        assert_eq!(classify("slide split-slide"), (SlideType::Split, LayoutId::TwoColumn));
        assert_eq!(classify("slide two-column"), (SlideType::Split, LayoutId::TwoColumn));
        assert_eq!(classify("slide stats"), (SlideType::Stats, LayoutId::TitleContent));
        assert_eq!(classify("slide quote-slide"), (SlideType::Quote, LayoutId::TitleContent));
        assert_eq!(classify("slide image-heavy"), (SlideType::Image, LayoutId::TitleContent));
        assert_eq!(
            classify("slide section-header"),
            (SlideType::Section, LayoutId::SectionHeader)
        );
        assert_eq!(classify("slide closing"), (SlideType::Closing, LayoutId::TitleSlide));
        assert_eq!(classify("slide blank"), (SlideType::Blank, LayoutId::Blank));
    }

    #[test]
    fn test_classify_default() {
        assert_eq!(classify("slide"), (SlideType::Content, LayoutId::TitleContent));
        assert_eq!(classify(""), (SlideType::Content, LayoutId::TitleContent));
    }

    #[test]
    fn test_classify_first_rule_wins() {
        // both title-slide and closing present
        assert_eq!(
            classify("slide closing title-slide"),
            (SlideType::Title, LayoutId::TitleSlide)
        );
        // "section" also matches inside "section-header"
        assert_eq!(
            classify("slide stats section"),
            (SlideType::Stats, LayoutId::TitleContent)
        );
    }

    #[test]
    fn test_infer_background() {
        assert_eq!(infer_background("slide title-slide bg-dark"), Some(DARK_BACKGROUND));
        assert_eq!(infer_background("slide title-slide"), Some(DARK_BACKGROUND));
        assert_eq!(infer_background("slide dark"), Some(DARK_BACKGROUND));
        assert_eq!(infer_background("slide bg-light"), Some(LIGHT_BACKGROUND));
        assert_eq!(infer_background("slide"), None);
    }

    #[test]
    fn test_dark_wins_over_light() {
        assert_eq!(infer_background("slide light dark"), Some(DARK_BACKGROUND));
    }
}
