//! PresentationML part bodies.

use std::fmt::Write;

use crate::deck::{header_frame, GridCell, Rect, Slide};

pub const SLIDE_WIDTH_EMU: i64 = 12_192_000;
pub const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_PML: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const EMPTY_GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One package relationship: (id, type suffix, target)
pub struct Rel {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

impl Rel {
    pub fn new(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Self {
        Self { id: id.into(), kind, target: target.into() }
    }
}

pub fn relationships(rels: &[Rel]) -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, r#"<Relationships xmlns="{}">"#, REL_NS)?;
    for rel in rels {
        // Package-level types live under a different base
        let base = if rel.kind == "metadata/core-properties" {
            "http://schemas.openxmlformats.org/package/2006/relationships"
        } else {
            REL_TYPE
        };
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            rel.id,
            base,
            rel.kind,
            xml_escape(&rel.target)
        )?;
    }
    write!(xml, "</Relationships>")?;
    Ok(xml)
}

/// `defaults` is (extension, content type) for media; slides are numbered 1..=slide_count.
pub fn content_types(defaults: &[(String, String)], slide_count: usize) -> Result<String, std::fmt::Error> {
    const PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#)?;
    write!(xml, r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#)?;
    write!(xml, r#"<Default Extension="xml" ContentType="application/xml"/>"#)?;
    for (ext, content_type) in defaults {
        write!(xml, r#"<Default Extension="{}" ContentType="{}"/>"#, ext, content_type)?;
    }
    write!(xml, r#"<Override PartName="/ppt/presentation.xml" ContentType="{}.presentation.main+xml"/>"#, PML)?;
    write!(xml, r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{}.slideMaster+xml"/>"#, PML)?;
    write!(xml, r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{}.slideLayout+xml"/>"#, PML)?;
    for n in 1..=slide_count {
        write!(xml, r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}.slide+xml"/>"#, n, PML)?;
    }
    write!(xml, r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#)?;
    write!(xml, r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#)?;
    write!(xml, r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#)?;
    write!(xml, "</Types>")?;
    Ok(xml)
}

pub fn core_properties(title: &str) -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(
        xml,
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    )?;
    write!(xml, "<dc:title>{}</dc:title><dc:creator>{}</dc:creator>", xml_escape(title), env!("CARGO_PKG_NAME"))?;
    write!(xml, "</cp:coreProperties>")?;
    Ok(xml)
}

pub fn app_properties(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(
        xml,
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{}</Application><Slides>{}</Slides></Properties>"#,
        env!("CARGO_PKG_NAME"),
        slide_count
    )?;
    Ok(xml)
}

/// Slide relationship ids start at rId3 (rId1 master, rId2 theme).
pub fn presentation(slide_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, NS_PML)?;
    write!(xml, r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#)?;
    write!(xml, "<p:sldIdLst>")?;
    for n in 0..slide_count {
        write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n, n + 3)?;
    }
    write!(xml, "</p:sldIdLst>")?;
    write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, SLIDE_WIDTH_EMU, SLIDE_HEIGHT_EMU)?;
    write!(xml, r#"<p:notesSz cx="6858000" cy="9144000"/>"#)?;
    write!(xml, "</p:presentation>")?;
    Ok(xml)
}

pub fn slide_master() -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, "<p:sldMaster {}>", NS_PML)?;
    write!(
        xml,
        r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{}</p:spTree></p:cSld>"#,
        EMPTY_GROUP
    )?;
    write!(
        xml,
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#
    )?;
    write!(xml, r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#)?;
    write!(xml, "<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>")?;
    write!(xml, "</p:sldMaster>")?;
    Ok(xml)
}

pub fn blank_layout() -> Result<String, std::fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, r#"<p:sldLayout {} type="blank" preserve="1">"#, NS_PML)?;
    write!(xml, r#"<p:cSld name="Blank"><p:spTree>{}</p:spTree></p:cSld>"#, EMPTY_GROUP)?;
    write!(xml, "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>")?;
    write!(xml, "</p:sldLayout>")?;
    Ok(xml)
}

pub fn theme() -> Result<String, std::fmt::Error> {
    const COLORS: [(&str, &str); 10] = [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ];
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Report">"#)?;
    write!(xml, "<a:themeElements>")?;
    write!(xml, r#"<a:clrScheme name="Report">"#)?;
    write!(xml, r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#)?;
    write!(xml, r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#)?;
    for (name, rgb) in COLORS {
        write!(xml, r#"<a:{name}><a:srgbClr val="{rgb}"/></a:{name}>"#)?;
    }
    write!(xml, "</a:clrScheme>")?;
    write!(xml, r#"<a:fontScheme name="Report">"#)?;
    for slot in ["majorFont", "minorFont"] {
        write!(xml, r#"<a:{slot}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{slot}>"#)?;
    }
    write!(xml, "</a:fontScheme>")?;
    write!(xml, r#"<a:fmtScheme name="Report">"#)?;
    write!(xml, "<a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst>")?;
    write!(xml, "<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst>")?;
    write!(xml, "<a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>")?;
    write!(xml, "<a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst>")?;
    write!(xml, "</a:fmtScheme>")?;
    write!(xml, "</a:themeElements>")?;
    write!(xml, "</a:theme>")?;
    Ok(xml)
}

/// Text box settings for one paragraph.
struct Text<'a> {
    body: &'a str,
    size_hundredths: u32,
    bold: bool,
}

fn write_text_box(xml: &mut String, id: u32, frame: Rect, text: Text<'_>) -> std::fmt::Result {
    let (x, y, cx, cy) = frame.to_emu();
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#
    )?;
    write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#
    )?;
    write!(
        xml,
        r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        text.size_hundredths,
        u8::from(text.bold),
        xml_escape(text.body)
    )
}

fn write_picture(xml: &mut String, id: u32, rel_id: &str, descr: &str, frame: Rect) -> std::fmt::Result {
    let (x, y, cx, cy) = frame.to_emu();
    write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        xml_escape(descr)
    )?;
    write!(xml, r#"<p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#)?;
    write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
    )
}

/// Slide body. `image_rels[i]` is the relationship id for cell `i` of a grid slide.
pub fn slide(slide: &Slide, image_rels: &[String]) -> Result<String, std::fmt::Error> {
    use crate::deck::layout::{MARGIN, SLIDE_HEIGHT};

    let mut xml = String::new();
    writeln!(xml, "{}", XML_HEADER)?;
    write!(xml, "<p:sld {}><p:cSld><p:spTree>{}", NS_PML, EMPTY_GROUP)?;

    match slide {
        Slide::Title { title, subtitle } => {
            let width = header_frame().width;
            let title_frame = Rect { left: MARGIN, top: SLIDE_HEIGHT * 0.3, width, height: 1.5 };
            let subtitle_frame = Rect { left: MARGIN, top: SLIDE_HEIGHT * 0.3 + 1.7, width, height: 0.8 };
            write_text_box(&mut xml, 2, title_frame, Text { body: title, size_hundredths: 4400, bold: true })?;
            write_text_box(&mut xml, 3, subtitle_frame, Text { body: subtitle, size_hundredths: 2000, bold: false })?;
        }
        Slide::Grid { header, cells, .. } => {
            write_text_box(&mut xml, 2, header_frame(), Text { body: header, size_hundredths: 2400, bold: true })?;
            let mut id = 3;
            for (cell, rel_id) in cells.iter().zip(image_rels) {
                write_cell(&mut xml, &mut id, cell, rel_id)?;
            }
        }
    }

    write!(xml, "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>")?;
    Ok(xml)
}

fn write_cell(xml: &mut String, id: &mut u32, cell: &GridCell, rel_id: &str) -> std::fmt::Result {
    write_picture(xml, *id, rel_id, &cell.image.filename, cell.frame)?;
    write_text_box(
        xml,
        *id + 1,
        cell.caption_frame,
        Text { body: &cell.caption, size_hundredths: 1000, bold: false },
    )?;
    *id += 2;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape(r#"a<b>&"c""#), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_presentation_lists_slides() {
        let xml = presentation(3).unwrap();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId3"/>"#));
        assert!(xml.contains(r#"<p:sldId id="258" r:id="rId5"/>"#));
        assert!(!xml.contains("rId6"));
        assert!(xml.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#));
    }

    #[test]
    fn test_title_slide_escapes_text() {
        let s = Slide::Title { title: "Smith & Co".into(), subtitle: "Generated on now".into() };
        let xml = slide(&s, &[]).unwrap();
        assert!(xml.contains("<a:t>Smith &amp; Co</a:t>"));
        assert!(xml.contains("<a:t>Generated on now</a:t>"));
        assert!(!xml.contains("<p:pic>"));
    }

    #[test]
    fn test_core_relationship_type() {
        let xml = relationships(&[
            Rel::new("rId1", "officeDocument", "ppt/presentation.xml"),
            Rel::new("rId2", "metadata/core-properties", "docProps/core.xml"),
        ])
        .unwrap();
        assert!(xml.contains(
            r#"Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument""#
        ));
        assert!(xml.contains(
            r#"Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties""#
        ));
    }
}
