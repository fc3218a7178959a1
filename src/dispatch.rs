use std::path::{Path, PathBuf};

use crate::config::{Config, DocxBackend};
use crate::convert::{DocxToPdf, Native, PdfToDocx};
use crate::error::{Error, ValidationError};
use crate::libreoffice::LibreOffice;
use crate::request::{ConversionRequest, Direction, PageRange};
use crate::staging::StagedCopy;

#[derive(Debug)]
pub enum ConversionOutcome {
    Success { output_path: PathBuf },
    Failure(Error),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            ConversionOutcome::Failure(e) => Some(e),
            ConversionOutcome::Success { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<PathBuf, Error> {
        match self {
            ConversionOutcome::Success { output_path } => Ok(output_path),
            ConversionOutcome::Failure(e) => Err(e),
        }
    }
}

impl From<Result<PathBuf, Error>> for ConversionOutcome {
    fn from(result: Result<PathBuf, Error>) -> Self {
        match result {
            Ok(output_path) => ConversionOutcome::Success { output_path },
            Err(e) => ConversionOutcome::Failure(e),
        }
    }
}

/// Validates requests, stages inputs and hands them to a converter.
pub struct Dispatcher {
    config: Config,
    pdf_to_docx: Box<dyn PdfToDocx>,
    docx_to_pdf: Box<dyn DocxToPdf>,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        let docx_to_pdf: Box<dyn DocxToPdf> = match config.docx_backend {
            DocxBackend::Native => Box::new(Native),
            DocxBackend::LibreOffice => Box::new(LibreOffice::new(&config.temp_dir)),
        };
        Dispatcher {
            config,
            pdf_to_docx: Box::new(Native),
            docx_to_pdf,
        }
    }

    pub fn with_pdf_to_docx(mut self, converter: impl PdfToDocx + 'static) -> Self {
        self.pdf_to_docx = Box::new(converter);
        self
    }

    pub fn with_docx_to_pdf(mut self, converter: impl DocxToPdf + 'static) -> Self {
        self.docx_to_pdf = Box::new(converter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn convert(&self, request: &ConversionRequest) -> ConversionOutcome {
        let outcome = ConversionOutcome::from(self.run(request));
        match &outcome {
            ConversionOutcome::Success { output_path } => {
                log::info!("Converted {} -> {}", request.input_path.display(), output_path.display());
            }
            ConversionOutcome::Failure(e) if e.is_validation() => {
                log::debug!("Rejected request: {e}");
            }
            ConversionOutcome::Failure(e) => {
                log::error!("Conversion of {} failed: {e}", request.input_path.display());
            }
        }
        outcome
    }

    fn run(&self, request: &ConversionRequest) -> Result<PathBuf, Error> {
        if !request.has_paths() {
            return Err(ValidationError::MissingPaths.into());
        }
        let direction = Direction::from_path(&request.input_path)
            .ok_or(ValidationError::UnsupportedExtension)?;

        match direction {
            Direction::PdfToDocx => {
                let pages = request.page_range()?;
                self.pdf_to_docx(&request.input_path, &request.output_path, pages)?;
            }
            Direction::DocxToPdf => {
                if request.start_page.is_some() || request.end_page.is_some() {
                    log::debug!("Ignoring page range for DOCX input");
                }
                self.docx_to_pdf(&request.input_path, &request.output_path)?;
            }
        }
        Ok(request.output_path.clone())
    }

    fn pdf_to_docx(&self, input: &Path, output: &Path, pages: PageRange) -> Result<(), Error> {
        let staged = StagedCopy::new(input, &self.config.temp_dir)?;
        log::info!("Converting {} to DOCX (pages {:?})", input.display(), pages);
        self.pdf_to_docx.pdf_to_docx(staged.path(), output, pages)
    }

    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error> {
        log::info!("Converting {} to PDF", input.display());
        if self.config.stage_docx {
            let staged = StagedCopy::new(input, &self.config.temp_dir)?;
            self.docx_to_pdf.docx_to_pdf(staged.path(), output)
        } else {
            self.docx_to_pdf.docx_to_pdf(input, output)
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(Config::from_host())
    }
}
