use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use docflip::{Config, ConversionRequest, Dispatcher, Error, PageRange};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};
use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn build_docx(path: &Path, body: &str) {
    build_docx_with_parts(path, body, &[]);
}

fn build_docx_with_parts(path: &Path, body: &str, parts: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
    )
    .unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    let xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{W_NS}"><w:body>{body}</w:body></w:document>"#);
    zip.write_all(xml.as_bytes()).unwrap();
    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// One line of Helvetica text per page, A4.
fn build_pdf(path: &Path, pages: &[&str]) {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let ids: Vec<(Ref, Ref)> = (0..pages.len() as i32)
        .map(|i| (Ref::new(4 + 2 * i), Ref::new(5 + 2 * i)))
        .collect();

    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(ids.iter().map(|(page, _)| *page))
        .count(pages.len() as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (text, (page_id, content_id)) in pages.iter().zip(&ids) {
        let mut content = Content::new();
        content
            .begin_text()
            .set_font(Name(b"F1"), 12.0)
            .next_line(72.0, 700.0)
            .show(Str(text.as_bytes()))
            .end_text();
        pdf.stream(*content_id, &content.finish());

        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, 595.0, 842.0))
            .parent(tree_id)
            .contents(*content_id);
        page.resources().fonts().pair(Name(b"F1"), font_id);
    }
    std::fs::write(path, pdf.finish()).unwrap();
}

fn document_xml(path: &Path) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

/// Text of each `w:p`, plus the number of paragraphs that start a new page.
fn docx_paragraphs(path: &Path) -> (Vec<String>, usize) {
    let xml = document_xml(path);
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let paragraphs = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "p")
        .map(|p| {
            p.descendants()
                .filter(|n| n.tag_name().name() == "t")
                .filter_map(|n| n.text())
                .collect::<String>()
        })
        .collect();
    let breaks = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "pageBreakBefore")
        .count();
    (paragraphs, breaks)
}

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tmp")).unwrap();
        Workspace { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Config::from_host().with_temp_dir(self.path("tmp")))
    }

    fn temp_is_empty(&self) -> bool {
        std::fs::read_dir(self.path("tmp")).unwrap().next().is_none()
    }
}

#[test]
fn docx_to_pdf_keeps_text_and_page_breaks() {
    let ws = Workspace::new();
    let input = ws.path("letter.docx");
    let output = ws.path("letter.pdf");
    build_docx(
        &input,
        r#"<w:p><w:r><w:t>Hello world</w:t></w:r></w:p>
           <w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Centered heading</w:t></w:r></w:p>
           <w:p><w:r><w:br w:type="page"/><w:t>Second page text</w:t></w:r></w:p>
           <w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
    );

    let outcome = ws.dispatcher().convert(&ConversionRequest::new(&input, &output));
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(ws.temp_is_empty());

    let pdf = lopdf::Document::load(&output).unwrap();
    assert_eq!(pdf.get_pages().len(), 2);
    let first = pdf.extract_text(&[1]).unwrap();
    assert!(first.contains("Hello world"), "{first:?}");
    assert!(first.contains("Centered heading"), "{first:?}");
    let second = pdf.extract_text(&[2]).unwrap();
    assert!(second.contains("Second page text"), "{second:?}");
    assert!(!second.contains("Hello"));
}

#[test]
fn long_docx_flows_onto_more_pages() {
    let ws = Workspace::new();
    let input = ws.path("long.docx");
    let output = ws.path("long.pdf");
    let body: String = (0..150)
        .map(|i| format!("<w:p><w:r><w:t>Paragraph number {i}</w:t></w:r></w:p>"))
        .collect();
    build_docx(&input, &body);

    let outcome = ws.dispatcher().convert(&ConversionRequest::new(&input, &output));
    assert!(outcome.is_success(), "{outcome:?}");

    let pdf = lopdf::Document::load(&output).unwrap();
    let pages = pdf.get_pages().len();
    assert!(pages >= 2, "150 lines fit on {pages} page(s)");
    let last = pdf.extract_text(&[pages as u32]).unwrap();
    assert!(last.contains("Paragraph number 149"), "{last:?}");
}

#[test]
fn invalid_docx_fails_without_leftovers() {
    let ws = Workspace::new();
    let input = ws.path("fake.docx");
    std::fs::write(&input, b"this is not a zip archive").unwrap();

    let dispatcher =
        Dispatcher::new(Config::from_host().with_temp_dir(ws.path("tmp")).with_stage_docx(true));
    let outcome = dispatcher.convert(&ConversionRequest::new(&input, ws.path("fake.pdf")));
    assert!(matches!(outcome.error(), Some(Error::Zip(_))), "{outcome:?}");
    assert!(ws.temp_is_empty());
}

#[test]
fn docx_without_body_is_rejected() {
    let ws = Workspace::new();
    let input = ws.path("empty.docx");
    let mut zip = zip::ZipWriter::new(File::create(&input).unwrap());
    zip.start_file("word/styles.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<styles/>").unwrap();
    zip.finish().unwrap();

    let outcome = ws
        .dispatcher()
        .convert(&ConversionRequest::new(&input, ws.path("empty.pdf")));
    let err = outcome.error().expect("missing document part must fail");
    assert!(matches!(err, Error::InvalidDocx(_)));
    assert_eq!(err.to_string(), "not a valid DOCX file: missing word/document.xml");
}

#[test]
fn pdf_to_docx_converts_selected_pages() {
    let ws = Workspace::new();
    let input = ws.path("book.pdf");
    let output = ws.path("book.docx");
    build_pdf(&input, &["Page one alpha", "Page two beta", "Page three gamma"]);

    let request = ConversionRequest::new(&input, &output).with_pages(Some("2"), Some("3"));
    let outcome = ws.dispatcher().convert(&request);
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(ws.temp_is_empty());

    let (paragraphs, breaks) = docx_paragraphs(&output);
    assert_eq!(paragraphs, vec!["Page two beta", "Page three gamma"]);
    assert_eq!(breaks, 1);
    assert!(document_xml(&output).contains("w:w=\"11900\""));
}

#[test]
fn pdf_to_docx_without_bounds_converts_everything() {
    let ws = Workspace::new();
    let input = ws.path("all.PDF");
    let output = ws.path("all.docx");
    build_pdf(&input, &["First", "Second"]);

    let outcome = ws.dispatcher().convert(&ConversionRequest::new(&input, &output));
    assert!(outcome.is_success(), "{outcome:?}");
    let (paragraphs, breaks) = docx_paragraphs(&output);
    assert_eq!(paragraphs, vec!["First", "Second"]);
    assert_eq!(breaks, 1);
}

#[test]
fn end_bound_past_document_is_clamped() {
    let ws = Workspace::new();
    let input = ws.path("short.pdf");
    let output = ws.path("short.docx");
    build_pdf(&input, &["Only", "Two"]);

    let request = ConversionRequest::new(&input, &output).with_pages(None, Some("40"));
    assert!(ws.dispatcher().convert(&request).is_success());
    assert_eq!(docx_paragraphs(&output).0, vec!["Only", "Two"]);
}

#[test]
fn start_past_last_page_fails_and_cleans_up() {
    let ws = Workspace::new();
    let input = ws.path("short.pdf");
    build_pdf(&input, &["Only", "Two"]);

    let request =
        ConversionRequest::new(&input, ws.path("short.docx")).with_pages(Some("5"), None);
    let outcome = ws.dispatcher().convert(&request);
    let err = outcome.error().expect("empty selection must fail");
    assert!(err.to_string().contains("no pages selected (document has 2 pages)"));
    assert!(ws.temp_is_empty());
}

#[test]
fn docx_survives_a_trip_through_pdf() {
    let ws = Workspace::new();
    let docx = ws.path("trip.docx");
    let pdf = ws.path("trip.pdf");
    let back = ws.path("trip-back.docx");
    build_docx(
        &docx,
        r#"<w:p><w:r><w:t>Alpha bravo</w:t></w:r></w:p>
           <w:p><w:pPr><w:pageBreakBefore/></w:pPr><w:r><w:t>Charlie delta</w:t></w:r></w:p>"#,
    );

    let dispatcher = ws.dispatcher();
    assert!(dispatcher.convert(&ConversionRequest::new(&docx, &pdf)).is_success());
    assert!(dispatcher.convert(&ConversionRequest::new(&pdf, &back)).is_success());

    let (paragraphs, breaks) = docx_paragraphs(&back);
    assert_eq!(paragraphs, vec!["Alpha bravo", "Charlie delta"]);
    assert_eq!(breaks, 1);
    assert!(ws.temp_is_empty());
}

#[test]
fn malformed_run_color_falls_back_to_black() {
    let ws = Workspace::new();
    let input = ws.path("color.docx");
    let output = ws.path("color.pdf");
    build_docx(
        &input,
        r#"<w:p><w:r><w:rPr><w:color w:val="1é234"/></w:rPr><w:t>Odd color</w:t></w:r></w:p>"#,
    );

    let outcome = ws.dispatcher().convert(&ConversionRequest::new(&input, &output));
    assert!(outcome.is_success(), "{outcome:?}");
    let pdf = lopdf::Document::load(&output).unwrap();
    assert!(pdf.extract_text(&[1]).unwrap().contains("Odd color"));
}

#[test]
fn out_of_range_list_level_renders_without_label() {
    let ws = Workspace::new();
    let input = ws.path("levels.docx");
    let output = ws.path("levels.pdf");
    let numbering = format!(
        r#"<w:numbering xmlns:w="{W_NS}">
             <w:abstractNum w:abstractNumId="0">
               <w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
               <w:lvl w:ilvl="255"><w:numFmt w:val="decimal"/><w:lvlText w:val="%256."/></w:lvl>
             </w:abstractNum>
             <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
           </w:numbering>"#
    );
    build_docx_with_parts(
        &input,
        r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="255"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Deep item</w:t></w:r></w:p>
           <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Top item</w:t></w:r></w:p>"#,
        &[("word/numbering.xml", &numbering)],
    );

    let outcome = ws.dispatcher().convert(&ConversionRequest::new(&input, &output));
    assert!(outcome.is_success(), "{outcome:?}");
    let text = lopdf::Document::load(&output).unwrap().extract_text(&[1]).unwrap();
    assert!(text.contains("Deep item"), "{text:?}");
    assert!(text.contains("1."), "{text:?}");
    assert!(text.contains("Top item"), "{text:?}");
}

#[test]
fn library_helpers_convert_directly() {
    let ws = Workspace::new();
    let docx = ws.path("helper.docx");
    let pdf = ws.path("helper.pdf");
    let back = ws.path("helper-back.docx");
    build_docx(
        &docx,
        r#"<w:p><w:r><w:t>Echo foxtrot</w:t></w:r></w:p>
           <w:p><w:pPr><w:pageBreakBefore/></w:pPr><w:r><w:t>Golf hotel</w:t></w:r></w:p>"#,
    );

    docflip::convert_docx_to_pdf(&docx, &pdf).unwrap();
    let pages = PageRange { start: Some(1), end: None };
    docflip::convert_pdf_to_docx(&pdf, &back, pages).unwrap();

    assert_eq!(docx_paragraphs(&back).0, vec!["Golf hotel"]);
}
