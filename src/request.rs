use std::path::{Path, PathBuf};

use crate::error::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    PdfToDocx,
    DocxToPdf,
}

impl Direction {
    /// Picks the direction from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Direction> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Direction::PdfToDocx),
            "docx" => Some(Direction::DocxToPdf),
            _ => None,
        }
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            Direction::PdfToDocx => "docx",
            Direction::DocxToPdf => "pdf",
        }
    }
}

/// Pages to convert: `start` is a 0-based offset, `end` is exclusive, so it
/// equals the 1-based number of the last page wanted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl PageRange {
    pub const ALL: PageRange = PageRange { start: None, end: None };

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// 1-based inclusive page numbers within a document of `page_count` pages.
    pub fn page_numbers(&self, page_count: u32) -> std::ops::RangeInclusive<u32> {
        let first = self.start.unwrap_or(0).saturating_add(1);
        let last = self.end.map_or(page_count, |end| end.min(page_count));
        first..=last
    }

    /// Validates the raw page fields of a form.
    ///
    /// Blank fields mean "no bound". Both numbers are 1-based; when both are
    /// given the end must be strictly greater than the start.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<PageRange, ValidationError> {
        let start = parse_bound(
            start,
            ValidationError::StartPageNotNumber,
            ValidationError::StartPageTooSmall,
        )?;
        let end = parse_bound(
            end,
            ValidationError::EndPageNotNumber,
            ValidationError::EndPageTooSmall,
        )?;

        if let (Some(s), Some(e)) = (start, end)
            && e <= s
        {
            return Err(ValidationError::PageOrder);
        }

        Ok(PageRange {
            start: start.map(|s| s - 1),
            end,
        })
    }
}

fn parse_bound(
    text: Option<&str>,
    not_number: ValidationError,
    too_small: ValidationError,
) -> Result<Option<u32>, ValidationError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_number);
    }
    let value = text.parse::<u32>().map_err(|_| not_number)?;
    if value < 1 {
        return Err(too_small);
    }
    Ok(Some(value))
}

/// One conversion attempt, as collected from the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub start_page: Option<String>,
    pub end_page: Option<String>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ConversionRequest {
            input_path: input.into(),
            output_path: output.into(),
            start_page: None,
            end_page: None,
        }
    }

    pub fn with_pages(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_page = start.map(str::to_string);
        self.end_page = end.map(str::to_string);
        self
    }

    pub fn has_paths(&self) -> bool {
        !self.input_path.as_os_str().is_empty() && !self.output_path.as_os_str().is_empty()
    }

    pub fn page_range(&self) -> Result<PageRange, ValidationError> {
        PageRange::parse(self.start_page.as_deref(), self.end_page.as_deref())
    }
}

/// Same base name as `input`, with the extension of the opposite format.
pub fn default_output_path(input: &Path) -> Option<PathBuf> {
    let direction = Direction::from_path(input)?;
    Some(input.with_extension(direction.output_extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_ignores_case() {
        assert_eq!(Direction::from_path(Path::new("a/b.PDF")), Some(Direction::PdfToDocx));
        assert_eq!(Direction::from_path(Path::new("b.Docx")), Some(Direction::DocxToPdf));
        assert_eq!(Direction::from_path(Path::new("b.doc")), None);
        assert_eq!(Direction::from_path(Path::new("pdf")), None);
    }

    #[test]
    fn page_bounds_become_offsets() {
        let range = PageRange::parse(Some("3"), Some("5")).unwrap();
        assert_eq!(range, PageRange { start: Some(2), end: Some(5) });
        assert_eq!(range.page_numbers(10), 3..=5);
    }

    #[test]
    fn blank_fields_are_unbounded() {
        let range = PageRange::parse(Some("  "), None).unwrap();
        assert_eq!(range, PageRange::ALL);
        assert!(!range.is_bounded());
        assert_eq!(range.page_numbers(4), 1..=4);
    }

    #[test]
    fn whitespace_around_digits_is_trimmed() {
        let range = PageRange::parse(Some(" 2 "), None).unwrap();
        assert_eq!(range.start, Some(1));
        assert_eq!(range.end, None);
    }

    #[test]
    fn rejects_non_digits() {
        assert_eq!(PageRange::parse(Some("-1"), None), Err(ValidationError::StartPageNotNumber));
        assert_eq!(PageRange::parse(Some("2a"), None), Err(ValidationError::StartPageNotNumber));
        assert_eq!(PageRange::parse(None, Some("1.5")), Err(ValidationError::EndPageNotNumber));
        assert_eq!(
            PageRange::parse(Some("99999999999"), None),
            Err(ValidationError::StartPageNotNumber)
        );
    }

    #[test]
    fn rejects_zero() {
        assert_eq!(PageRange::parse(Some("0"), None), Err(ValidationError::StartPageTooSmall));
        assert_eq!(PageRange::parse(None, Some("00")), Err(ValidationError::EndPageTooSmall));
    }

    #[test]
    fn start_error_wins_over_end_error() {
        assert_eq!(
            PageRange::parse(Some("x"), Some("y")),
            Err(ValidationError::StartPageNotNumber)
        );
    }

    #[test]
    fn end_must_exceed_start() {
        assert_eq!(PageRange::parse(Some("4"), Some("4")), Err(ValidationError::PageOrder));
        assert_eq!(PageRange::parse(Some("5"), Some("2")), Err(ValidationError::PageOrder));
        assert!(PageRange::parse(Some("4"), Some("5")).is_ok());
    }

    #[test]
    fn page_numbers_clamp_to_document() {
        let range = PageRange { start: Some(1), end: Some(50) };
        assert_eq!(range.page_numbers(3), 2..=3);
        let past_end = PageRange { start: Some(7), end: None };
        assert!(past_end.page_numbers(3).is_empty());
    }

    #[test]
    fn default_output_swaps_extension() {
        assert_eq!(
            default_output_path(Path::new("/tmp/report.PDF")),
            Some(PathBuf::from("/tmp/report.docx"))
        );
        assert_eq!(
            default_output_path(Path::new("notes.docx")),
            Some(PathBuf::from("notes.pdf"))
        );
        assert_eq!(default_output_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn empty_paths_are_detected() {
        assert!(!ConversionRequest::new("", "out.docx").has_paths());
        assert!(!ConversionRequest::new("in.pdf", "").has_paths());
        assert!(ConversionRequest::new("in.pdf", "out.docx").has_paths());
    }
}
