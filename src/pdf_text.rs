use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId};

use crate::error::Error;
use crate::model::{Document, Paragraph};
use crate::request::PageRange;

const BODY_FONT_SIZE: f32 = 11.0;

/// Reads the text of the selected pages into the document model.
///
/// Every non-blank line becomes its own paragraph; the first paragraph of each
/// page after the first starts a new page.
pub fn extract(path: &Path, pages: PageRange) -> Result<Document, Error> {
    let pdf = lopdf::Document::load(path)?;
    let page_ids = pdf.get_pages();
    let page_count = page_ids.len() as u32;

    let selected: Vec<u32> = pages.page_numbers(page_count).collect();
    if selected.is_empty() {
        return Err(Error::Pdf(format!(
            "no pages selected (document has {page_count} pages)"
        )));
    }

    let mut doc = Document::letter();
    if let Some((width, height)) = page_ids
        .get(&selected[0])
        .and_then(|id| media_box(&pdf, *id))
    {
        doc.page_width = width;
        doc.page_height = height;
    }

    for (i, page_no) in selected.iter().enumerate() {
        let text = pdf.extract_text(&[*page_no])?;
        let mut first_on_page = true;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut para = Paragraph::plain(line, BODY_FONT_SIZE);
            para.page_break_before = first_on_page && i > 0;
            first_on_page = false;
            doc.paragraphs.push(para);
        }
        if first_on_page && i > 0 {
            // keep blank pages as blank pages
            let mut para = Paragraph::plain("", BODY_FONT_SIZE);
            para.runs.clear();
            para.page_break_before = true;
            doc.paragraphs.push(para);
        }
    }

    log::debug!(
        "Extracted {} paragraphs from pages {:?} of {}",
        doc.paragraphs.len(),
        pages.page_numbers(page_count),
        path.display()
    );
    Ok(doc)
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// MediaBox of a page, following the `Parent` chain for inherited values.
fn media_box(pdf: &lopdf::Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let mut dict: &Dictionary = pdf.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(obj) = dict.get(b"MediaBox") {
            let obj = match obj {
                Object::Reference(id) => pdf.get_object(*id).ok()?,
                other => other,
            };
            let coords: Vec<f32> = obj.as_array().ok()?.iter().filter_map(number).collect();
            let [x0, y0, x1, y1] = coords.as_slice() else {
                return None;
            };
            return Some(((x1 - x0).abs(), (y1 - y0).abs()));
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        dict = pdf.get_dictionary(parent).ok()?;
    }
    None
}
