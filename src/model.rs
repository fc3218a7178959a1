//! Format-neutral document model shared by both conversion directions.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug)]
pub struct Document {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub line_spacing: f32, // auto line spacing factor (e.g. 278/240)
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    /// US Letter with one-inch margins.
    pub fn letter() -> Self {
        Document {
            page_width: 612.0,
            page_height: 792.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            line_spacing: 1.0,
            paragraphs: Vec::new(),
        }
    }

    pub fn text_width(&self) -> f32 {
        (self.page_width - self.margin_left - self.margin_right).max(1.0)
    }
}

#[derive(Debug)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub space_before: f32,
    pub space_after: f32,
    pub content_height: f32, // drawings, reserved as blank space
    pub alignment: Alignment,
    pub indent_left: f32,
    pub indent_hanging: f32,
    pub list_label: String,
    pub page_break_before: bool,
    pub line_spacing: Option<f32>, // per-paragraph override (e.g. 240/240 = 1.0)
}

impl Paragraph {
    pub fn plain(text: impl Into<String>, font_size: f32) -> Self {
        Paragraph {
            runs: vec![Run::plain(text, font_size)],
            space_before: 0.0,
            space_after: 0.0,
            content_height: 0.0,
            alignment: Alignment::Left,
            indent_left: 0.0,
            indent_hanging: 0.0,
            list_label: String::new(),
            page_break_before: false,
            line_spacing: None,
        }
    }
}

#[derive(Debug)]
pub struct Run {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<[u8; 3]>, // None = automatic (black)
}

impl Run {
    pub fn plain(text: impl Into<String>, font_size: f32) -> Self {
        Run {
            text: text.into(),
            font_size,
            font_name: String::from("Calibri"),
            bold: false,
            italic: false,
            color: None,
        }
    }
}
