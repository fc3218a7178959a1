use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DocxBackend {
    #[default]
    Native,
    LibreOffice,
}

/// Settings resolved once at startup and shared by every conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Convert DOCX input from a temporary copy instead of the original.
    /// Word holds an exclusive lock on open documents on Windows.
    pub stage_docx: bool,
    /// Where staging copies are created.
    pub temp_dir: PathBuf,
    pub docx_backend: DocxBackend,
}

impl Config {
    pub fn from_host() -> Self {
        Config {
            stage_docx: cfg!(windows),
            temp_dir: std::env::temp_dir(),
            docx_backend: DocxBackend::Native,
        }
    }

    pub fn with_stage_docx(mut self, stage: bool) -> Self {
        self.stage_docx = stage;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_docx_backend(mut self, backend: DocxBackend) -> Self {
        self.docx_backend = backend;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::from_host()
    }
}
