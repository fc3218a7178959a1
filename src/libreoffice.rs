use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::convert::DocxToPdf;
use crate::error::Error;

/// DOCX to PDF through a headless LibreOffice.
#[derive(Clone, Debug)]
pub struct LibreOffice {
    program: OsString,
    temp_dir: PathBuf,
}

impl LibreOffice {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        LibreOffice {
            program: OsString::from("soffice"),
            temp_dir: temp_dir.into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }
}

impl DocxToPdf for LibreOffice {
    fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<(), Error> {
        // soffice names the result after the input; convert into a private
        // directory and move it into place afterwards.
        let out_dir = tempfile::Builder::new()
            .prefix("docflip-lo-")
            .tempdir_in(&self.temp_dir)?;

        log::info!(
            "Running {} on {}",
            self.program.to_string_lossy(),
            input.display()
        );
        let result = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir.path())
            .arg(input)
            .output()
            .map_err(|e| {
                Error::External(format!(
                    "cannot run {}: {e}",
                    self.program.to_string_lossy()
                ))
            })?;

        if !result.status.success() {
            return Err(Error::External(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let stem = input
            .file_stem()
            .ok_or_else(|| Error::External("input has no file name".into()))?;
        let produced = out_dir.path().join(stem).with_extension("pdf");
        if !produced.is_file() {
            return Err(Error::External(format!(
                "no PDF was produced at {}",
                produced.display()
            )));
        }

        // rename fails across filesystems
        if std::fs::rename(&produced, output).is_err() {
            std::fs::copy(&produced, output)?;
        }
        Ok(())
    }
}
