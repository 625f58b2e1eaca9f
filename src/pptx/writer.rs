//! OOXML package writer for exported decks.
//!
//! Builds every part of a minimal presentation (content types, relationships,
//! presentation, one master with a blank layout, a theme generated from the
//! deck theme, slides and media) and zips them in memory.

use crate::theme::{is_dark, Theme};
use crate::{Error, Result};
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;
/// 10 inches.
pub const SLIDE_WIDTH_EMU: i64 = 9_144_000;
/// 5.625 inches (16:9 with the width above).
pub const SLIDE_HEIGHT_EMU: i64 = 5_143_500;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const CT_PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";

/// Escape XML special characters.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn fmt_err(e: std::fmt::Error) -> Error {
    Error::PackageError(e.to_string())
}

/// Position and size of a shape in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn bottom(&self) -> i64 {
        self.y + self.cy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Align::Left),
            "center" | "centre" | "middle" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            _ => None,
        }
    }

    fn as_ooxml(&self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Middle,
}

/// Font sizes PowerPoint accepts for `a:rPr/@sz`, in points.
pub const MIN_FONT_PT: f64 = 1.0;
pub const MAX_FONT_PT: f64 = 4000.0;

/// Run and paragraph formatting shared by every paragraph of a text shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size_pt: f64,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    pub anchor: Anchor,
    pub bullets: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Rect,
    RoundRect,
    Ellipse,
}

impl Geometry {
    fn preset(&self) -> &'static str {
        match self {
            Geometry::Rect => "rect",
            Geometry::RoundRect => "roundRect",
            Geometry::Ellipse => "ellipse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect the format from a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// A native shape placed on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text {
        frame: Frame,
        paragraphs: Vec<String>,
        style: TextStyle,
        fill: Option<String>,
    },
    Fill {
        frame: Frame,
        geometry: Geometry,
        color: String,
    },
    Line {
        frame: Frame,
        color: String,
        width_emu: i64,
    },
    Picture {
        frame: Frame,
        data: Vec<u8>,
        format: ImageFormat,
        description: String,
    },
}

impl Shape {
    pub fn frame(&self) -> Frame {
        match self {
            Shape::Text { frame, .. }
            | Shape::Fill { frame, .. }
            | Shape::Line { frame, .. }
            | Shape::Picture { frame, .. } => *frame,
        }
    }
}

/// One slide ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidePart {
    pub name: String,
    pub background: String,
    pub shapes: Vec<Shape>,
}

/// Collects slides and writes the zipped package.
#[derive(Debug)]
pub struct PackageWriter<'t> {
    theme: &'t Theme,
    title: String,
    slides: Vec<SlidePart>,
}

impl<'t> PackageWriter<'t> {
    pub fn new(theme: &'t Theme, title: impl Into<String>) -> Self {
        Self {
            theme,
            title: title.into(),
            slides: Vec::new(),
        }
    }

    pub fn add_slide(&mut self, slide: SlidePart) {
        self.slides.push(slide);
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Serialize the package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, data: &[u8]| -> Result<()> {
            let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            zip.start_file(path, options)?;
            zip.write_all(data)?;
            Ok(())
        };

        put(&mut zip, "[Content_Types].xml", self.content_types_xml()?.as_bytes())?;
        put(&mut zip, "_rels/.rels", root_rels_xml().as_bytes())?;
        put(&mut zip, "docProps/core.xml", self.core_xml().as_bytes())?;
        put(&mut zip, "docProps/app.xml", self.app_xml().as_bytes())?;
        put(&mut zip, "ppt/presentation.xml", self.presentation_xml()?.as_bytes())?;
        put(&mut zip, "ppt/_rels/presentation.xml.rels", self.presentation_rels_xml()?.as_bytes())?;
        put(&mut zip, "ppt/presProps.xml", pres_props_xml().as_bytes())?;
        put(&mut zip, "ppt/viewProps.xml", view_props_xml().as_bytes())?;
        put(&mut zip, "ppt/tableStyles.xml", table_styles_xml().as_bytes())?;
        put(&mut zip, "ppt/theme/theme1.xml", theme_xml(self.theme)?.as_bytes())?;
        put(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes())?;
        put(&mut zip, "ppt/slideMasters/_rels/slideMaster1.xml.rels", slide_master_rels_xml().as_bytes())?;
        put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes())?;
        put(&mut zip, "ppt/slideLayouts/_rels/slideLayout1.xml.rels", slide_layout_rels_xml().as_bytes())?;

        let mut media_index = 0usize;
        for (i, slide) in self.slides.iter().enumerate() {
            let mut media = Vec::new();
            for shape in &slide.shapes {
                if let Shape::Picture { data, format, .. } = shape {
                    media_index += 1;
                    let name = format!("image{}.{}", media_index, format.extension());
                    put(&mut zip, &format!("ppt/media/{}", name), data)?;
                    media.push(name);
                }
            }
            put(&mut zip, &format!("ppt/slides/slide{}.xml", i + 1), slide_xml(slide)?.as_bytes())?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                slide_rels_xml(&media)?.as_bytes(),
            )?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn content_types_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECL);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif] {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                format.extension(),
                format.content_type()
            )
            .map_err(fmt_err)?;
        }
        let overrides = [
            ("/ppt/presentation.xml", format!("{}.presentation.main+xml", CT_PML)),
            ("/ppt/slideMasters/slideMaster1.xml", format!("{}.slideMaster+xml", CT_PML)),
            ("/ppt/slideLayouts/slideLayout1.xml", format!("{}.slideLayout+xml", CT_PML)),
            ("/ppt/presProps.xml", format!("{}.presProps+xml", CT_PML)),
            ("/ppt/viewProps.xml", format!("{}.viewProps+xml", CT_PML)),
            ("/ppt/tableStyles.xml", format!("{}.tableStyles+xml", CT_PML)),
            ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
            ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml".to_string()),
            (
                "/docProps/app.xml",
                "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string(),
            ),
        ];
        for (part, ct) in overrides {
            write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct).map_err(fmt_err)?;
        }
        for i in 1..=self.slides.len() {
            write!(
                xml,
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}.slide+xml"/>"#,
                i, CT_PML
            )
            .map_err(fmt_err)?;
        }
        xml.push_str("</Types>");
        Ok(xml)
    }

    fn core_xml(&self) -> String {
        format!(
            r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>slidewright</dc:creator></cp:coreProperties>"#,
            XML_DECL,
            escape_xml(&self.title)
        )
    }

    fn app_xml(&self) -> String {
        format!(
            r#"{}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>slidewright</Application><Slides>{}</Slides></Properties>"#,
            XML_DECL,
            self.slides.len()
        )
    }

    fn presentation_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        write!(
            xml,
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            NS_A, NS_R, NS_P
        )
        .map_err(fmt_err)?;
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.slides.len() {
                write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, FIRST_SLIDE_REL + i).map_err(fmt_err)?;
            }
            xml.push_str("</p:sldIdLst>");
        }
        write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, SLIDE_WIDTH_EMU, SLIDE_HEIGHT_EMU).map_err(fmt_err)?;
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        Ok(xml)
    }

    fn presentation_rels_xml(&self) -> Result<String> {
        let mut rels = vec![
            ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
            ("rId3".to_string(), "presProps", "presProps.xml".to_string()),
            ("rId4".to_string(), "viewProps", "viewProps.xml".to_string()),
            ("rId5".to_string(), "tableStyles", "tableStyles.xml".to_string()),
        ];
        for i in 0..self.slides.len() {
            rels.push((format!("rId{}", FIRST_SLIDE_REL + i), "slide", format!("slides/slide{}.xml", i + 1)));
        }
        relationships_xml(rels.iter().map(|(id, kind, target)| (id.as_str(), *kind, target.as_str())))
    }
}

// Presentation relationships 1..=5 are fixed parts; slides follow.
const FIRST_SLIDE_REL: usize = 6;

fn relationships_xml<'a>(rels: impl Iterator<Item = (&'a str, &'a str, &'a str)>) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_PKG_REL).map_err(fmt_err)?;
    for (id, kind, target) in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_BASE, kind, target
        )
        .map_err(fmt_err)?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn root_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{}/extended-properties" Target="docProps/app.xml"/></Relationships>"#,
        XML_DECL, NS_PKG_REL, REL_BASE, REL_BASE
    )
}

fn pres_props_xml() -> String {
    format!(r#"{}<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#, XML_DECL, NS_A, NS_R, NS_P)
}

fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL, NS_A
    )
}

const GROUP_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn slide_master_xml() -> String {
    format!(
        r#"{}<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        XML_DECL, NS_A, NS_R, NS_P, GROUP_HEADER
    )
}

fn slide_master_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{}/theme" Target="../theme/theme1.xml"/></Relationships>"#,
        XML_DECL, NS_PKG_REL, REL_BASE, REL_BASE
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"{}<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        XML_DECL, NS_A, NS_R, NS_P, GROUP_HEADER
    )
}

fn slide_layout_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
        XML_DECL, NS_PKG_REL, REL_BASE
    )
}

fn slide_rels_xml(media: &[String]) -> Result<String> {
    let mut rels = vec![("rId1".to_string(), "slideLayout", "../slideLayouts/slideLayout1.xml".to_string())];
    for (i, name) in media.iter().enumerate() {
        rels.push((format!("rId{}", i + 2), "image", format!("../media/{}", name)));
    }
    relationships_xml(rels.iter().map(|(id, kind, target)| (id.as_str(), *kind, target.as_str())))
}

/// Theme part built from the deck palette.
pub(crate) fn theme_xml(theme: &Theme) -> Result<String> {
    let (dark, light) = if is_dark(theme.background) {
        (theme.background, theme.text)
    } else {
        (theme.text, theme.background)
    };
    let colors = [
        ("dk1", dark),
        ("lt1", light),
        ("dk2", theme.surface),
        ("lt2", theme.muted),
        ("accent1", theme.primary),
        ("accent2", theme.accent),
        ("accent3", theme.muted),
        ("accent4", theme.surface),
        ("accent5", theme.primary),
        ("accent6", theme.accent),
        ("hlink", theme.primary),
        ("folHlink", theme.muted),
    ];

    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, r#"<a:theme xmlns:a="{}" name="{}"><a:themeElements>"#, NS_A, escape_xml(theme.name)).map_err(fmt_err)?;
    write!(xml, r#"<a:clrScheme name="{}">"#, escape_xml(theme.name)).map_err(fmt_err)?;
    for (slot, color) in colors {
        write!(xml, r#"<a:{slot}><a:srgbClr val="{color}"/></a:{slot}>"#, slot = slot, color = color).map_err(fmt_err)?;
    }
    xml.push_str("</a:clrScheme>");
    write!(
        xml,
        r#"<a:fontScheme name="{name}"><a:majorFont><a:latin typeface="{major}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{minor}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
        name = escape_xml(theme.name),
        major = escape_xml(theme.heading_font),
        minor = escape_xml(theme.body_font)
    )
    .map_err(fmt_err)?;

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    write!(xml, r#"<a:fmtScheme name="{}"><a:fillStyleLst>"#, escape_xml(theme.name)).map_err(fmt_err)?;
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for w in [6350, 12700, 19050] {
        write!(xml, r#"<a:ln w="{}">{}</a:ln>"#, w, solid).map_err(fmt_err)?;
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    Ok(xml)
}

/// Slide part XML.
pub(crate) fn slide_xml(slide: &SlidePart) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P).map_err(fmt_err)?;
    write!(xml, r#"<p:cSld name="{}">"#, escape_xml(&slide.name)).map_err(fmt_err)?;
    write!(
        xml,
        r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        slide.background
    )
    .map_err(fmt_err)?;
    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_HEADER);

    let mut image_rel = 1usize;
    for (i, shape) in slide.shapes.iter().enumerate() {
        let id = i as u32 + 2;
        let rel = if matches!(shape, Shape::Picture { .. }) {
            image_rel += 1;
            Some(format!("rId{}", image_rel))
        } else {
            None
        };
        shape_xml(&mut xml, id, shape, rel.as_deref())?;
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok(xml)
}

fn xfrm(xml: &mut String, frame: &Frame) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x,
        frame.y,
        frame.cx.max(0),
        frame.cy.max(0)
    )
    .map_err(fmt_err)
}

fn shape_xml(xml: &mut String, id: u32, shape: &Shape, rel_id: Option<&str>) -> Result<()> {
    match shape {
        Shape::Text {
            frame,
            paragraphs,
            style,
            fill,
        } => {
            xml.push_str("<p:sp><p:nvSpPr>");
            write!(xml, r#"<p:cNvPr id="{}" name="Text {}"/>"#, id, id).map_err(fmt_err)?;
            xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#);
            xfrm(xml, frame)?;
            xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
            match fill {
                Some(color) => write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color).map_err(fmt_err)?,
                None => xml.push_str("<a:noFill/>"),
            }
            xml.push_str("</p:spPr><p:txBody>");
            let anchor = match style.anchor {
                Anchor::Top => "t",
                Anchor::Middle => "ctr",
            };
            write!(
                xml,
                r#"<a:bodyPr wrap="square" lIns="0" tIns="0" rIns="0" bIns="0" anchor="{}"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
                anchor
            )
            .map_err(fmt_err)?;

            if paragraphs.is_empty() {
                xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
            }
            for paragraph in paragraphs {
                xml.push_str("<a:p>");
                if style.bullets {
                    write!(
                        xml,
                        r#"<a:pPr marL="285750" indent="-285750" algn="{}"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#,
                        style.align.as_ooxml()
                    )
                    .map_err(fmt_err)?;
                } else {
                    write!(xml, r#"<a:pPr algn="{}"><a:buNone/></a:pPr>"#, style.align.as_ooxml()).map_err(fmt_err)?;
                }
                write!(xml, r#"<a:r><a:rPr lang="en-US" sz="{}""#, (style.size_pt.clamp(MIN_FONT_PT, MAX_FONT_PT) * 100.0).round() as u32)
                    .map_err(fmt_err)?;
                if style.bold {
                    xml.push_str(r#" b="1""#);
                }
                if style.italic {
                    xml.push_str(r#" i="1""#);
                }
                write!(
                    xml,
                    r#" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr>"#,
                    style.color,
                    escape_xml(&style.font)
                )
                .map_err(fmt_err)?;
                write!(xml, "<a:t>{}</a:t></a:r></a:p>", escape_xml(paragraph)).map_err(fmt_err)?;
            }
            xml.push_str("</p:txBody></p:sp>");
        }
        Shape::Fill { frame, geometry, color } => {
            xml.push_str("<p:sp><p:nvSpPr>");
            write!(xml, r#"<p:cNvPr id="{}" name="Shape {}"/>"#, id, id).map_err(fmt_err)?;
            xml.push_str("<p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>");
            xfrm(xml, frame)?;
            write!(
                xml,
                r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:ln><a:noFill/></a:ln>"#,
                geometry.preset(),
                color
            )
            .map_err(fmt_err)?;
            xml.push_str("</p:spPr></p:sp>");
        }
        Shape::Line { frame, color, width_emu } => {
            xml.push_str("<p:cxnSp><p:nvCxnSpPr>");
            write!(xml, r#"<p:cNvPr id="{}" name="Line {}"/>"#, id, id).map_err(fmt_err)?;
            xml.push_str("<p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr>");
            xfrm(xml, frame)?;
            write!(
                xml,
                r#"<a:prstGeom prst="line"><a:avLst/></a:prstGeom><a:ln w="{}"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:ln>"#,
                width_emu, color
            )
            .map_err(fmt_err)?;
            xml.push_str("</p:spPr></p:cxnSp>");
        }
        Shape::Picture { frame, description, .. } => {
            xml.push_str("<p:pic><p:nvPicPr>");
            write!(
                xml,
                r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
                id,
                id,
                escape_xml(description)
            )
            .map_err(fmt_err)?;
            xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill>"#);
            let rid = rel_id.ok_or_else(|| Error::PackageError("Picture without relationship id".into()))?;
            write!(xml, r#"<a:blip r:embed="{}"/>"#, rid).map_err(fmt_err)?;
            xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>");
            xfrm(xml, frame)?;
            xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn text(y: i64, body: &str) -> Shape {
        Shape::Text {
            frame: Frame { x: 0, y, cx: 100, cy: 100 },
            paragraphs: vec![body.to_string()],
            style: TextStyle {
                font: "Inter".into(),
                size_pt: 18.0,
                color: "000000".into(),
                bold: true,
                italic: false,
                align: Align::Center,
                anchor: Anchor::Top,
                bullets: false,
            },
            fill: None,
        }
    }

    #[test]
    fn test_slide_xml_escapes_text() {
        let slide = SlidePart {
            name: "title".into(),
            background: "FFFFFF".into(),
            shapes: vec![text(0, "Q&A <live>")],
        };
        let xml = slide_xml(&slide).unwrap();
        assert!(xml.contains("Q&amp;A &lt;live&gt;"));
        assert!(xml.contains(r#"sz="1800" b="1""#));
        assert!(xml.contains(r#"algn="ctr""#));
        assert!(xml.contains(r#"<a:srgbClr val="FFFFFF"/>"#));
    }

    #[test]
    fn test_run_size_is_bounded() {
        let mut huge = text(0, "big");
        if let Shape::Text { style, .. } = &mut huge {
            style.size_pt = 99_999.0;
        }
        let slide = SlidePart {
            name: "big".into(),
            background: "FFFFFF".into(),
            shapes: vec![huge],
        };
        let xml = slide_xml(&slide).unwrap();
        assert!(xml.contains(r#"sz="400000""#), "{}", xml);
    }

    #[test]
    fn test_package_contains_all_parts() {
        let theme = Theme::lookup("paper").unwrap();
        let mut writer = PackageWriter::new(theme, "Demo");
        writer.add_slide(SlidePart {
            name: "one".into(),
            background: theme.background.into(),
            shapes: vec![
                text(0, "Hello"),
                Shape::Picture {
                    frame: Frame { x: 0, y: 0, cx: 10, cy: 10 },
                    data: vec![0x89, b'P', b'N', b'G'],
                    format: ImageFormat::Png,
                    description: "logo".into(),
                },
            ],
        });
        writer.add_slide(SlidePart {
            name: "two".into(),
            background: theme.surface.into(),
            shapes: vec![],
        });
        let bytes = writer.to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/media/image1.png",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {}", part);
        }

        let mut pres = String::new();
        archive.by_name("ppt/presentation.xml").unwrap().read_to_string(&mut pres).unwrap();
        assert!(pres.contains(r#"<p:sldId id="257" r:id="rId7"/>"#));
        assert!(pres.contains(r#"cx="9144000" cy="5143500""#));

        let mut rels = String::new();
        archive
            .by_name("ppt/slides/_rels/slide1.xml.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains(r#"Id="rId2""#) && rels.contains("../media/image1.png"));
    }

    #[test]
    fn test_theme_xml_uses_palette() {
        let theme = Theme::lookup("slate").unwrap();
        let xml = theme_xml(theme).unwrap();
        assert!(xml.contains(r#"<a:dk1><a:srgbClr val="0F172A"/></a:dk1>"#));
        assert!(xml.contains(r#"<a:accent1><a:srgbClr val="38BDF8"/></a:accent1>"#));
        assert!(xml.contains(r#"<a:latin typeface="Inter"/>"#));
    }
}
