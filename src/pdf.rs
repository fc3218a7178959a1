use std::collections::HashMap;

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{self, FontEntry};
use crate::model::{Alignment, Document, Paragraph, Run};

const EMPTY_LINE_SIZE: f32 = 11.0;

type FontKey = (String, bool, bool);

/// Fonts used by a document, in registration order.
pub(crate) struct FontSet {
    entries: Vec<FontEntry>,
    by_key: HashMap<FontKey, usize>,
}

impl FontSet {
    fn key(run: &Run) -> FontKey {
        (
            fonts::primary_font_name(&run.font_name).to_string(),
            run.bold,
            run.italic,
        )
    }

    fn collect(doc: &Document, pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> FontSet {
        let mut set = FontSet { entries: Vec::new(), by_key: HashMap::new() };
        for run in doc.paragraphs.iter().flat_map(|p| &p.runs) {
            let key = FontSet::key(run);
            if set.by_key.contains_key(&key) {
                continue;
            }
            let pdf_name = format!("F{}", set.entries.len() + 1);
            let entry = fonts::register_font(pdf, &key.0, key.1, key.2, pdf_name, alloc);
            set.by_key.insert(key, set.entries.len());
            set.entries.push(entry);
        }
        set
    }

    fn index_of(&self, run: &Run) -> usize {
        self.by_key.get(&FontSet::key(run)).copied().unwrap_or(0)
    }
}

/// A word (or the part of one inside a single run) with its style.
struct Piece<'d> {
    text: String,
    run: &'d Run,
    space_before: bool,
}

fn split_pieces(para: &Paragraph) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut pending_space = false;
    for run in &para.runs {
        let mut word = String::new();
        for c in run.text.chars() {
            if c.is_whitespace() {
                if !word.is_empty() {
                    pieces.push(Piece {
                        text: std::mem::take(&mut word),
                        run,
                        space_before: pending_space,
                    });
                }
                pending_space = true;
            } else {
                word.push(c);
            }
        }
        if !word.is_empty() {
            pieces.push(Piece { text: word, run, space_before: pending_space });
            pending_space = false;
        }
    }
    pieces
}

struct Placed {
    font: usize,
    size: f32,
    color: Option<[u8; 3]>,
    text: String,
    width: f32,
}

#[derive(Default)]
struct Line {
    items: Vec<Placed>,
    width: f32,
    height: f32,
    ascent: f32,
}

/// Greedy word wrap; a break is only taken where the source had whitespace.
fn wrap(para: &Paragraph, fonts: &FontSet, avail: f32, spacing: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();

    for piece in split_pieces(para) {
        let font_idx = fonts.index_of(piece.run);
        let font = &fonts.entries[font_idx];
        let size = piece.run.font_size;

        let mut text = if piece.space_before && !line.items.is_empty() {
            format!(" {}", piece.text)
        } else {
            piece.text.clone()
        };
        let mut width = font.text_width(&text, size);

        if piece.space_before && !line.items.is_empty() && line.width + width > avail {
            lines.push(std::mem::take(&mut line));
            text = piece.text;
            width = font.text_width(&text, size);
        }

        line.height = line.height.max(font.line_height(size) * spacing);
        line.ascent = line.ascent.max(size * 0.8);
        line.width += width;
        line.items.push(Placed {
            font: font_idx,
            size,
            color: piece.run.color,
            text,
            width,
        });
    }

    if !line.items.is_empty() || lines.is_empty() {
        if line.items.is_empty() {
            line.height = EMPTY_LINE_SIZE * 1.2 * spacing;
            line.ascent = EMPTY_LINE_SIZE * 0.8;
        }
        lines.push(line);
    }
    lines
}

struct Layout<'a> {
    doc: &'a Document,
    fonts: &'a FontSet,
    pages: Vec<Content>,
    content: Content,
    y: f32,
    page_has_content: bool,
}

impl<'a> Layout<'a> {
    fn new(doc: &'a Document, fonts: &'a FontSet) -> Self {
        Layout {
            doc,
            fonts,
            pages: Vec::new(),
            content: Content::new(),
            y: doc.page_height - doc.margin_top,
            page_has_content: false,
        }
    }

    fn new_page(&mut self) {
        let done = std::mem::replace(&mut self.content, Content::new());
        self.pages.push(done);
        self.y = self.doc.page_height - self.doc.margin_top;
        self.page_has_content = false;
    }

    /// Starts a new page if `height` does not fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.page_has_content && self.y - height < self.doc.margin_bottom {
            self.new_page();
        }
    }

    fn paragraph(&mut self, para: &Paragraph) {
        if para.page_break_before && self.page_has_content {
            self.new_page();
        }
        if self.page_has_content {
            self.y -= para.space_before;
        }

        if para.content_height > 0.0 {
            self.reserve(para.content_height);
            self.y -= para.content_height;
            self.page_has_content = true;
        }

        let spacing = para.line_spacing.unwrap_or(self.doc.line_spacing);
        let avail = (self.doc.text_width() - para.indent_left).max(1.0);
        let lines = wrap(para, self.fonts, avail, spacing);

        for (i, line) in lines.iter().enumerate() {
            self.reserve(line.height);
            let baseline = self.y - line.ascent;
            let x_left = self.doc.margin_left + para.indent_left;
            let offset = match para.alignment {
                Alignment::Center => (avail - line.width).max(0.0) / 2.0,
                Alignment::Right => (avail - line.width).max(0.0),
                Alignment::Left | Alignment::Justify => 0.0,
            };

            if i == 0 && !para.list_label.is_empty() && !line.items.is_empty() {
                let first = &line.items[0];
                let label_x = x_left - para.indent_hanging;
                self.show_line(
                    label_x,
                    baseline,
                    std::iter::once((first.font, first.size, None, para.list_label.as_str(), 0.0)),
                );
            }

            self.show_line(
                x_left + offset,
                baseline,
                line.items
                    .iter()
                    .map(|p| (p.font, p.size, p.color, p.text.as_str(), p.width)),
            );
            self.y -= line.height;
            self.page_has_content = true;
        }

        self.y -= para.space_after;
    }

    /// One text object per line; `Td` offsets are relative to the previous piece.
    fn show_line<'t>(
        &mut self,
        x: f32,
        baseline: f32,
        items: impl Iterator<Item = (usize, f32, Option<[u8; 3]>, &'t str, f32)>,
    ) {
        let mut items = items.peekable();
        if items.peek().is_none() {
            return;
        }
        self.content.begin_text();
        let mut prev_width: Option<f32> = None;
        for (font, size, color, text, width) in items {
            let [r, g, b] = color.unwrap_or([0, 0, 0]);
            self.content
                .set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            self.content
                .set_font(Name(self.fonts.entries[font].pdf_name.as_bytes()), size);
            match prev_width {
                None => self.content.next_line(x, baseline),
                Some(dx) => self.content.next_line(dx, 0.0),
            };
            self.content.show(Str(&fonts::to_winansi_bytes(text)));
            prev_width = Some(width);
        }
        self.content.end_text();
    }

    fn finish(mut self) -> Vec<Content> {
        let last = std::mem::replace(&mut self.content, Content::new());
        self.pages.push(last);
        self.pages
    }
}

fn layout(doc: &Document, fonts: &FontSet) -> Vec<Content> {
    let mut layout = Layout::new(doc, fonts);
    for para in &doc.paragraphs {
        layout.paragraph(para);
    }
    layout.finish()
}

/// Lays out and renders `doc` as a complete PDF file.
pub fn render(doc: &Document) -> Result<Vec<u8>, Error> {
    if !(doc.page_width > 0.0 && doc.page_height > 0.0) {
        return Err(Error::Pdf(format!(
            "invalid page size {}x{}",
            doc.page_width, doc.page_height
        )));
    }

    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let mut next_id = 3;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let fonts = FontSet::collect(doc, &mut pdf, &mut alloc);
    let pages = layout(doc, &fonts);

    let page_refs: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc(), alloc())).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_refs.iter().map(|(page, _)| *page))
        .count(page_refs.len() as i32);

    for (content, (page_id, content_id)) in pages.into_iter().zip(&page_refs) {
        pdf.stream(*content_id, &content.finish());

        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, doc.page_width, doc.page_height))
            .parent(pages_id)
            .contents(*content_id);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for entry in &fonts.entries {
            font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
        }
    }

    log::debug!(
        "Rendered {} page(s) with {} font(s)",
        page_refs.len(),
        fonts.entries.len()
    );
    Ok(pdf.finish())
}
