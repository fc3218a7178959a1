mod config;
mod convert;
mod dispatch;
mod docx;
mod docx_writer;
mod error;
mod fonts;
mod form;
mod libreoffice;
mod model;
mod pdf;
mod pdf_text;
mod report;
mod request;
mod staging;

pub use config::{Config, DocxBackend};
pub use convert::{DocxToPdf, Native, PdfToDocx};
pub use dispatch::{ConversionOutcome, Dispatcher};
pub use error::{Error, ValidationError};
pub use form::FormState;
pub use libreoffice::LibreOffice;
pub use report::{Report, ReportKind};
pub use request::{ConversionRequest, Direction, PageRange, default_output_path};
pub use staging::StagedCopy;

use std::path::Path;

pub fn convert_docx_to_pdf(input: &Path, output: &Path) -> Result<(), Error> {
    Native.docx_to_pdf(input, output)
}

pub fn convert_pdf_to_docx(input: &Path, output: &Path, pages: PageRange) -> Result<(), Error> {
    Native.pdf_to_docx(input, output, pages)
}
