//! Built-in widescreen template: slide master, layouts, themes, and the
//! static package parts.

use crate::xml::{escape, pml_namespaces, XML_DECLARATION, NS_DRAWING};
use deck_core::{PlaceholderRole, Result, Rgb, Theme};
use std::fmt::Write as FmtWrite;

/// 13.333in x 7.5in.
pub const SLIDE_WIDTH: i64 = 12_192_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;
pub const NOTES_WIDTH: i64 = 6_858_000;
pub const NOTES_HEIGHT: i64 = 9_144_000;

/// First id of the slide master's `sldLayoutIdLst`; the master itself is one below.
const FIRST_LAYOUT_ID: u64 = 2_147_483_649;
pub(crate) const SLIDE_MASTER_ID: u64 = 2_147_483_648;

/// A placeholder as declared by a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlaceholderDef {
    pub name: &'static str,
    /// `ph/@type`; `None` is an object placeholder.
    pub ph_type: Option<&'static str>,
    pub idx: Option<u32>,
    pub role: Option<PlaceholderRole>,
    /// x, y, cx, cy in EMU.
    pub frame: (i64, i64, i64, i64),
}

impl PlaceholderDef {
    /// The `<p:ph .../>` element for this placeholder.
    pub fn ph_xml(&self) -> String {
        let mut ph = String::from("<p:ph");
        if let Some(ph_type) = self.ph_type {
            ph.push_str(&format!(r#" type="{}""#, ph_type));
        }
        if let Some(idx) = self.idx {
            ph.push_str(&format!(r#" idx="{}""#, idx));
        }
        ph.push_str("/>");
        ph
    }
}

/// A slide layout of the built-in template.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LayoutDef {
    pub name: &'static str,
    /// `sldLayout/@type`.
    pub kind: &'static str,
    pub placeholders: &'static [PlaceholderDef],
}

impl LayoutDef {
    /// First placeholder filling `role`.
    pub fn placeholder_for(&self, role: PlaceholderRole) -> Option<&PlaceholderDef> {
        self.placeholders.iter().find(|ph| ph.role == Some(role))
    }
}

const TITLE: PlaceholderDef = PlaceholderDef {
    name: "Title 1",
    ph_type: Some("title"),
    idx: None,
    role: Some(PlaceholderRole::Title),
    frame: (838_200, 365_125, 10_515_600, 1_325_563),
};

pub(crate) const LAYOUTS: &[LayoutDef] = &[
    LayoutDef {
        name: "Title Slide",
        kind: "title",
        placeholders: &[
            PlaceholderDef {
                name: "Title 1",
                ph_type: Some("ctrTitle"),
                idx: None,
                role: Some(PlaceholderRole::Title),
                frame: (1_524_000, 1_122_363, 9_144_000, 2_387_600),
            },
            PlaceholderDef {
                name: "Subtitle 2",
                ph_type: Some("subTitle"),
                idx: Some(1),
                role: Some(PlaceholderRole::Subtitle),
                frame: (1_524_000, 3_602_038, 9_144_000, 1_655_762),
            },
        ],
    },
    LayoutDef {
        name: "Title and Content",
        kind: "obj",
        placeholders: &[
            TITLE,
            PlaceholderDef {
                name: "Content Placeholder 2",
                ph_type: None,
                idx: Some(1),
                role: Some(PlaceholderRole::Body),
                frame: (838_200, 1_825_625, 10_515_600, 4_351_338),
            },
        ],
    },
    LayoutDef {
        name: "Section Header",
        kind: "secHead",
        placeholders: &[
            PlaceholderDef {
                name: "Title 1",
                ph_type: Some("title"),
                idx: None,
                role: Some(PlaceholderRole::Title),
                frame: (831_850, 1_709_738, 10_515_600, 2_852_737),
            },
            PlaceholderDef {
                name: "Text Placeholder 2",
                ph_type: Some("body"),
                idx: Some(1),
                role: Some(PlaceholderRole::Body),
                frame: (831_850, 4_589_463, 10_515_600, 1_500_187),
            },
        ],
    },
    LayoutDef {
        name: "Two Content",
        kind: "twoObj",
        placeholders: &[
            TITLE,
            PlaceholderDef {
                name: "Content Placeholder 2",
                ph_type: None,
                idx: Some(1),
                role: Some(PlaceholderRole::Body),
                frame: (838_200, 1_825_625, 5_181_600, 4_351_338),
            },
            PlaceholderDef {
                name: "Content Placeholder 3",
                ph_type: None,
                idx: Some(2),
                role: None,
                frame: (6_172_200, 1_825_625, 5_181_600, 4_351_338),
            },
        ],
    },
    LayoutDef {
        name: "Comparison",
        kind: "twoTxTwoObj",
        placeholders: &[
            TITLE,
            PlaceholderDef {
                name: "Text Placeholder 2",
                ph_type: Some("body"),
                idx: Some(1),
                role: None,
                frame: (839_788, 1_681_163, 5_157_787, 823_912),
            },
            PlaceholderDef {
                name: "Content Placeholder 3",
                ph_type: None,
                idx: Some(2),
                role: Some(PlaceholderRole::Body),
                frame: (839_788, 2_505_075, 5_157_787, 3_684_588),
            },
            PlaceholderDef {
                name: "Text Placeholder 4",
                ph_type: Some("body"),
                idx: Some(3),
                role: None,
                frame: (6_172_200, 1_681_163, 5_183_188, 823_912),
            },
            PlaceholderDef {
                name: "Content Placeholder 5",
                ph_type: None,
                idx: Some(4),
                role: None,
                frame: (6_172_200, 2_505_075, 5_183_188, 3_684_588),
            },
        ],
    },
    LayoutDef {
        name: "Title Only",
        kind: "titleOnly",
        placeholders: &[TITLE],
    },
    LayoutDef {
        name: "Blank",
        kind: "blank",
        placeholders: &[],
    },
];

/// Empty group-shape header every `spTree` starts with.
pub(crate) const GROUP_SHAPE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn write_placeholder_with_frame(xml: &mut String, id: usize, ph: &PlaceholderDef) -> Result<()> {
    let (x, y, cx, cy) = ph.frame;
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr>"#,
        id,
        ph.name,
        ph.ph_xml()
    )?;
    write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr>"#,
        x, y, cx, cy
    )?;
    xml.push_str(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#);
    Ok(())
}

/// `ppt/slideLayouts/slideLayoutN.xml`.
pub(crate) fn layout_xml(layout: &LayoutDef) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<p:sldLayout {} type="{}" preserve="1"><p:cSld name="{}"><p:spTree>"#,
        pml_namespaces(),
        layout.kind,
        escape(layout.name)
    )?;
    xml.push_str(GROUP_SHAPE_HEADER);
    for (i, ph) in layout.placeholders.iter().enumerate() {
        write_placeholder_with_frame(&mut xml, i + 2, ph)?;
    }
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}

fn level_style(xml: &mut String, level: usize, bullet: bool, size_pt: u32) -> Result<()> {
    let margin = 228_600 + 457_200 * (level - 1);
    if bullet {
        write!(
            xml,
            r#"<a:lvl{}pPr marL="{}" indent="-228600" algn="l"><a:spcBef><a:spcPts val="1000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/><a:defRPr sz="{}"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl{}pPr>"#,
            level,
            margin,
            size_pt * 100,
            level
        )?;
    } else {
        write!(
            xml,
            r#"<a:lvl{}pPr marL="{}" algn="l"><a:defRPr sz="{}"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl{}pPr>"#,
            level,
            margin - 228_600,
            size_pt * 100,
            level
        )?;
    }
    Ok(())
}

/// `ppt/slideMasters/slideMaster1.xml`. Layout relationships are `rId1..=rIdN`.
pub(crate) fn slide_master_xml(layout_count: usize) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    write!(xml, "<p:sldMaster {}>", pml_namespaces())?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    xml.push_str(GROUP_SHAPE_HEADER);
    write_placeholder_with_frame(&mut xml, 2, &TITLE)?;
    write_placeholder_with_frame(
        &mut xml,
        3,
        &PlaceholderDef {
            name: "Text Placeholder 2",
            ph_type: Some("body"),
            idx: Some(1),
            role: Some(PlaceholderRole::Body),
            frame: (838_200, 1_825_625, 10_515_600, 4_351_338),
        },
    )?;
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);

    xml.push_str("<p:sldLayoutIdLst>");
    for i in 0..layout_count {
        write!(
            xml,
            r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#,
            FIRST_LAYOUT_ID + i as u64,
            i + 1
        )?;
    }
    xml.push_str("</p:sldLayoutIdLst>");

    xml.push_str("<p:txStyles>");
    xml.push_str(r#"<p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400" b="1"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#);
    xml.push_str("<p:bodyStyle>");
    for (level, size) in [(1, 28), (2, 24), (3, 20)] {
        level_style(&mut xml, level, true, size)?;
    }
    xml.push_str("</p:bodyStyle>");
    xml.push_str("<p:otherStyle>");
    level_style(&mut xml, 1, false, 18)?;
    xml.push_str("</p:otherStyle>");
    xml.push_str("</p:txStyles></p:sldMaster>");
    Ok(xml)
}

/// `ppt/notesMasters/notesMaster1.xml`.
pub(crate) fn notes_master_xml() -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    write!(xml, "<p:notesMaster {}>", pml_namespaces())?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    xml.push_str(GROUP_SHAPE_HEADER);
    write_placeholder_with_frame(
        &mut xml,
        2,
        &PlaceholderDef {
            name: "Slide Image Placeholder 1",
            ph_type: Some("sldImg"),
            idx: Some(2),
            role: None,
            frame: (685_800, 1_143_000, 5_486_400, 3_086_100),
        },
    )?;
    write_placeholder_with_frame(
        &mut xml,
        3,
        &PlaceholderDef {
            name: "Notes Placeholder 2",
            ph_type: Some("body"),
            idx: Some(3),
            role: None,
            frame: (685_800, 4_400_550, 5_486_400, 3_600_450),
        },
    )?;
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str("<p:notesStyle>");
    level_style(&mut xml, 1, false, 12)?;
    xml.push_str("</p:notesStyle></p:notesMaster>");
    Ok(xml)
}

/// Office accents 2-6, kept after the deck accent.
const SECONDARY_ACCENTS: [&str; 5] = ["ED7D31", "A5A5A5", "FFC000", "5B9BD5", "70AD47"];

/// `ppt/theme/themeN.xml` built from the deck theme.
pub(crate) fn theme_xml(name: &str, theme: &Theme) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<a:theme xmlns:a="{}" name="{}"><a:themeElements>"#,
        NS_DRAWING,
        escape(name)
    )?;

    let srgb = |color: Rgb| format!(r#"<a:srgbClr val="{}"/>"#, color.to_hex());
    write!(xml, r#"<a:clrScheme name="{}">"#, escape(name))?;
    write!(xml, "<a:dk1>{}</a:dk1>", srgb(theme.text_primary))?;
    write!(xml, "<a:lt1>{}</a:lt1>", srgb(theme.background_primary))?;
    write!(xml, "<a:dk2>{}</a:dk2>", srgb(theme.background_dark))?;
    write!(xml, "<a:lt2>{}</a:lt2>", srgb(theme.text_on_dark))?;
    write!(xml, "<a:accent1>{}</a:accent1>", srgb(theme.accent))?;
    for (i, accent) in SECONDARY_ACCENTS.iter().enumerate() {
        write!(
            xml,
            r#"<a:accent{0}><a:srgbClr val="{1}"/></a:accent{0}>"#,
            i + 2,
            accent
        )?;
    }
    xml.push_str(r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#);
    xml.push_str("</a:clrScheme>");

    write!(xml, r#"<a:fontScheme name="{}">"#, escape(name))?;
    write!(
        xml,
        r#"<a:majorFont><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        escape(&theme.display_font)
    )?;
    write!(
        xml,
        r#"<a:minorFont><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        escape(&theme.body_font)
    )?;
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        write!(
            xml,
            r#"<a:ln w="{}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln>"#,
            width
        )?;
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    Ok(xml)
}

/// `ppt/presProps.xml`.
pub(crate) fn pres_props_xml() -> String {
    format!(
        "{}<p:presentationPr {}/>",
        XML_DECLARATION,
        pml_namespaces()
    )
}

/// `ppt/viewProps.xml`.
pub(crate) fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr {}><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECLARATION,
        pml_namespaces()
    )
}

/// `ppt/tableStyles.xml`.
pub(crate) fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECLARATION, NS_DRAWING
    )
}

/// `docProps/core.xml`.
pub(crate) fn core_props_xml(title: &str, creator: &str) -> String {
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>{}</dc:creator><cp:revision>1</cp:revision>",
            "</cp:coreProperties>"
        ),
        XML_DECLARATION,
        escape(title),
        escape(creator)
    )
}

/// `docProps/app.xml`.
pub(crate) fn app_props_xml(application: &str, slides: usize, notes: usize) -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>{}</Application><PresentationFormat>Widescreen</PresentationFormat>",
            "<Slides>{}</Slides><Notes>{}</Notes></Properties>"
        ),
        XML_DECLARATION,
        escape(application),
        slides,
        notes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_order() {
        let names: Vec<&str> = LAYOUTS.iter().map(|l| l.name).collect();
        assert_eq!(
            names,
            vec![
                "Title Slide",
                "Title and Content",
                "Section Header",
                "Two Content",
                "Comparison",
                "Title Only",
                "Blank"
            ]
        );
    }

    #[test]
    fn test_layout_roles() {
        let title_slide = &LAYOUTS[0];
        assert!(title_slide.placeholder_for(PlaceholderRole::Subtitle).is_some());
        assert!(title_slide.placeholder_for(PlaceholderRole::Body).is_none());

        let two_content = &LAYOUTS[3];
        assert_eq!(
            two_content.placeholder_for(PlaceholderRole::Body).map(|ph| ph.idx),
            Some(Some(1))
        );

        let blank = &LAYOUTS[6];
        assert!(blank.placeholder_for(PlaceholderRole::Title).is_none());
    }

    #[test]
    fn test_ph_xml() {
        assert_eq!(LAYOUTS[0].placeholders[0].ph_xml(), r#"<p:ph type="ctrTitle"/>"#);
        assert_eq!(LAYOUTS[1].placeholders[1].ph_xml(), r#"<p:ph idx="1"/>"#);
        assert_eq!(LAYOUTS[2].placeholders[1].ph_xml(), r#"<p:ph type="body" idx="1"/>"#);
    }

    #[test]
    fn test_layout_xml() {
        let xml = layout_xml(&LAYOUTS[2]).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(r#"type="secHead""#));
        assert!(xml.contains(r#"<p:cSld name="Section Header">"#));
        assert!(xml.contains(r#"<a:off x="831850" y="4589463"/>"#));
    }

    #[test]
    fn test_slide_master_lists_layouts() {
        let xml = slide_master_xml(LAYOUTS.len()).unwrap();
        assert_eq!(xml.matches("<p:sldLayoutId ").count(), 7);
        assert!(xml.contains(r#"<p:sldLayoutId id="2147483649" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<p:sldLayoutId id="2147483655" r:id="rId7"/>"#));
    }

    #[test]
    fn test_theme_xml_uses_deck_theme() {
        let theme = Theme {
            accent: Rgb::new(0x12, 0x34, 0x56),
            display_font: "Playfair & Co".to_string(),
            ..Theme::default()
        };
        let xml = theme_xml("Deck", &theme).unwrap();
        assert!(xml.contains(r#"<a:accent1><a:srgbClr val="123456"/></a:accent1>"#));
        assert!(xml.contains(r#"<a:dk2><a:srgbClr val="0A0A0A"/></a:dk2>"#));
        assert!(xml.contains(r#"<a:majorFont><a:latin typeface="Playfair &amp; Co"/>"#));
        assert!(xml.contains(r#"<a:minorFont><a:latin typeface="Arial"/>"#));
    }

    #[test]
    fn test_doc_props() {
        let core = core_props_xml("Q&A", "html2pptx");
        assert!(core.contains("<dc:title>Q&amp;A</dc:title>"));

        let app = app_props_xml("html2pptx", 3, 1);
        assert!(app.contains("<Slides>3</Slides><Notes>1</Notes>"));
    }
}
