use std::path::{Path, PathBuf};

use crate::dispatch::{ConversionOutcome, Dispatcher};
use crate::error::ValidationError;
use crate::request::{ConversionRequest, Direction, default_output_path};

/// What the user has entered so far. The front end edits this and sends the
/// resulting [`ConversionRequest`] to the dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start_page: String,
    pub end_page: String,
}

impl FormState {
    /// Selects the source file and derives the default destination next to it.
    /// Page fields only apply to PDF input and are cleared otherwise.
    pub fn select_input(&mut self, path: impl Into<PathBuf>) {
        self.input = path.into();
        if let Some(output) = default_output_path(&self.input) {
            self.output = output;
        }
        if !self.pages_enabled() {
            self.start_page.clear();
            self.end_page.clear();
        }
    }

    /// Moves the destination into `dir`, keeping its file name.
    pub fn select_output_dir(&mut self, dir: &Path) {
        let Some(name) = self.output.file_name() else {
            return;
        };
        self.output = dir.join(name);
    }

    pub fn set_pages(&mut self, start: Option<&str>, end: Option<&str>) {
        if !self.pages_enabled() {
            if start.is_some() || end.is_some() {
                log::warn!("Page range only applies to PDF input; ignoring it");
            }
            return;
        }
        self.start_page = start.unwrap_or_default().to_string();
        self.end_page = end.unwrap_or_default().to_string();
    }

    pub fn pages_enabled(&self) -> bool {
        Direction::from_path(&self.input) == Some(Direction::PdfToDocx)
    }

    pub fn request(&self) -> ConversionRequest {
        let field = |s: &String| Some(s.clone()).filter(|s| !s.trim().is_empty());
        ConversionRequest {
            input_path: self.input.clone(),
            output_path: self.output.clone(),
            start_page: field(&self.start_page),
            end_page: field(&self.end_page),
        }
    }

    /// Sends the current request to `dispatcher`.
    ///
    /// An input of an unknown type leaves no destination to derive, so that
    /// is reported instead of the missing output path.
    pub fn submit(&self, dispatcher: &Dispatcher) -> ConversionOutcome {
        if self.output.as_os_str().is_empty()
            && !self.input.as_os_str().is_empty()
            && Direction::from_path(&self.input).is_none()
        {
            return ConversionOutcome::Failure(ValidationError::UnsupportedExtension.into());
        }
        dispatcher.convert(&self.request())
    }
}
