use std::fmt;

use crate::dispatch::ConversionOutcome;
use crate::error::{Error, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Info,
    Error,
}

/// The single message shown to the user once a conversion attempt ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub title: &'static str,
    pub message: String,
}

impl Report {
    pub fn from_outcome(outcome: &ConversionOutcome) -> Report {
        match outcome {
            ConversionOutcome::Success { output_path } => Report {
                kind: ReportKind::Info,
                title: "Success",
                message: format!(
                    "Conversion successful!\nSaved as '{}'.",
                    output_path.display()
                ),
            },
            ConversionOutcome::Failure(Error::Validation(v)) => Report {
                kind: ReportKind::Error,
                title: match v {
                    ValidationError::UnsupportedExtension => "Unsupported File",
                    _ => "Error",
                },
                message: v.to_string(),
            },
            ConversionOutcome::Failure(e) => Report {
                kind: ReportKind::Error,
                title: "Conversion Error",
                message: format!("An error occurred:\n{e}"),
            },
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
