use std::fmt;
use std::path::PathBuf;

/// Problems with the request itself, found before anything touches the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingPaths,
    UnsupportedExtension,
    StartPageNotNumber,
    StartPageTooSmall,
    EndPageNotNumber,
    EndPageTooSmall,
    PageOrder,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationError::MissingPaths => "Please select both input and output paths.",
            ValidationError::UnsupportedExtension => "Please select a PDF or DOCX file.",
            ValidationError::StartPageNotNumber => "Start page must be a positive integer.",
            ValidationError::StartPageTooSmall => "Start page must be at least 1.",
            ValidationError::EndPageNotNumber => "End page must be a positive integer.",
            ValidationError::EndPageTooSmall => "End page must be at least 1.",
            ValidationError::PageOrder => "End page must be greater than Start page.",
        };
        f.write_str(msg)
    }
}

#[derive(Debug)]
pub enum Error {
    Validation(ValidationError),
    Staging { path: PathBuf, source: std::io::Error },
    InvalidDocx(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    PdfRead(lopdf::Error),
    Pdf(String),
    External(String),
    Io(std::io::Error),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            Error::Validation(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(v) => write!(f, "{v}"),
            Error::Staging { path, source } => {
                write!(f, "cannot copy '{}' to a temporary location: {source}", path.display())
            }
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::PdfRead(e) => write!(f, "cannot read PDF: {e}"),
            Error::Pdf(e) => write!(f, "PDF error: {e}"),
            Error::External(e) => write!(f, "external converter failed: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Staging { source, .. } => Some(source),
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::PdfRead(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::PdfRead(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
