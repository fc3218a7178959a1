use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{Alignment, Document, Paragraph, Run};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#;

fn pts_to_twips(pts: f32) -> i64 {
    (pts * 20.0).round() as i64
}

fn escape_xml(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // not representable in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
}

fn write_run(run: &Run, out: &mut String) {
    out.push_str("<w:r><w:rPr>");
    if !run.font_name.is_empty() {
        out.push_str("<w:rFonts w:ascii=\"");
        escape_xml(&run.font_name, out);
        out.push_str("\" w:hAnsi=\"");
        escape_xml(&run.font_name, out);
        out.push_str("\"/>");
    }
    if run.bold {
        out.push_str("<w:b/>");
    }
    if run.italic {
        out.push_str("<w:i/>");
    }
    if let Some([r, g, b]) = run.color {
        let _ = write!(out, "<w:color w:val=\"{r:02X}{g:02X}{b:02X}\"/>");
    }
    let half_points = (run.font_size * 2.0).round() as i64;
    let _ = write!(out, "<w:sz w:val=\"{half_points}\"/></w:rPr>");

    // tabs are their own element; everything else goes in w:t
    for (i, chunk) in run.text.split('\t').enumerate() {
        if i > 0 {
            out.push_str("<w:tab/>");
        }
        if !chunk.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            escape_xml(chunk, out);
            out.push_str("</w:t>");
        }
    }
    out.push_str("</w:r>");
}

fn write_paragraph(para: &Paragraph, out: &mut String) {
    out.push_str("<w:p><w:pPr>");
    if para.page_break_before {
        out.push_str("<w:pageBreakBefore/>");
    }
    let _ = write!(
        out,
        "<w:spacing w:before=\"{}\" w:after=\"{}\"/>",
        pts_to_twips(para.space_before),
        pts_to_twips(para.space_after)
    );
    if para.indent_left > 0.0 || para.indent_hanging > 0.0 {
        let _ = write!(
            out,
            "<w:ind w:left=\"{}\" w:hanging=\"{}\"/>",
            pts_to_twips(para.indent_left),
            pts_to_twips(para.indent_hanging)
        );
    }
    let jc = match para.alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    };
    if let Some(jc) = jc {
        let _ = write!(out, "<w:jc w:val=\"{jc}\"/>");
    }
    out.push_str("</w:pPr>");
    for run in &para.runs {
        write_run(run, out);
    }
    out.push_str("</w:p>");
}

/// Builds the `word/document.xml` part for `doc`.
pub(crate) fn document_xml(doc: &Document) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>",
    );
    for para in &doc.paragraphs {
        write_paragraph(para, &mut out);
    }
    let _ = write!(
        out,
        "<w:sectPr><w:pgSz w:w=\"{}\" w:h=\"{}\"/>\
         <w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/>\
         </w:sectPr></w:body></w:document>",
        pts_to_twips(doc.page_width),
        pts_to_twips(doc.page_height),
        pts_to_twips(doc.margin_top),
        pts_to_twips(doc.margin_right),
        pts_to_twips(doc.margin_bottom),
        pts_to_twips(doc.margin_left),
    );
    out
}

/// Writes a minimal WordprocessingML package.
pub fn write_to<W: Write + Seek>(doc: &Document, sink: W) -> Result<(), Error> {
    let mut zip = zip::ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, &str); 4] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(doc).as_bytes())?;

    zip.finish()?.flush()?;
    Ok(())
}

pub fn write(doc: &Document, path: &Path) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    write_to(doc, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn sample() -> Document {
        let mut doc = Document::letter();
        doc.paragraphs.push(Paragraph::plain("Fish & <Chips>", 11.0));
        let mut second = Paragraph::plain("col1\tcol2", 14.0);
        second.page_break_before = true;
        second.alignment = Alignment::Center;
        second.runs[0].bold = true;
        second.runs[0].color = Some([0x12, 0xAB, 0x00]);
        doc.paragraphs.push(second);
        doc
    }

    #[test]
    fn document_xml_is_well_formed_and_escaped() {
        let xml = document_xml(&sample());
        let parsed = roxmltree::Document::parse(&xml).unwrap();
        let texts: Vec<&str> = parsed
            .descendants()
            .filter(|n| n.tag_name().name() == "t")
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(texts, vec!["Fish & <Chips>", "col1", "col2"]);
        assert!(xml.contains("<w:pageBreakBefore/>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.contains("<w:color w:val=\"12AB00\"/>"));
        assert!(xml.contains("<w:sz w:val=\"28\"/>"));
        assert!(xml.contains("<w:pgSz w:w=\"12240\" w:h=\"15840\"/>"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let mut out = String::new();
        escape_xml("a\u{0}b\u{1b}c\td", &mut out);
        assert_eq!(out, "abc\td");
    }

    #[test]
    fn package_contains_required_parts() {
        let mut buf = Cursor::new(Vec::new());
        write_to(&sample(), &mut buf).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Fish &amp; &lt;Chips&gt;"));
    }
}
