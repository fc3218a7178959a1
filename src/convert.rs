//! The two conversion seams and the built-in converter.

use std::path::Path;

use crate::error::Error;
use crate::request::PageRange;
use crate::{docx, docx_writer, pdf, pdf_text};

pub trait PdfToDocx {
    fn pdf_to_docx(&self, input: &Path, output: &Path, pages: PageRange) -> Result<(), Error>;
}

pub trait DocxToPdf {
    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error>;
}

/// Pure-Rust converters for both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Native;

impl PdfToDocx for Native {
    fn pdf_to_docx(&self, input: &Path, output: &Path, pages: PageRange) -> Result<(), Error> {
        let doc = pdf_text::extract(input, pages)?;
        docx_writer::write(&doc, output)
    }
}

impl DocxToPdf for Native {
    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error> {
        let doc = docx::parse(input)?;
        let bytes = pdf::render(&doc)?;
        std::fs::write(output, bytes).map_err(Error::Io)
    }
}
