use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Error;

/// A copy of an input file inside a private temporary directory.
///
/// The copy keeps the original file name. The directory and everything in it
/// is removed when the guard is dropped.
pub struct StagedCopy {
    dir: TempDir,
    path: PathBuf,
}

impl StagedCopy {
    pub fn new(source: &Path, temp_root: &Path) -> Result<StagedCopy, Error> {
        let staging_err = |e: std::io::Error| Error::Staging {
            path: source.to_path_buf(),
            source: e,
        };

        let file_name = source.file_name().ok_or_else(|| {
            staging_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no file name",
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix("docflip-")
            .tempdir_in(temp_root)
            .map_err(staging_err)?;
        let path = dir.path().join(file_name);

        // `dir` is dropped on the error path, taking any partial copy with it.
        std::fs::copy(source, &path).map_err(staging_err)?;
        log::debug!("Staged {} as {}", source.display(), path.display());

        Ok(StagedCopy { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for StagedCopy {
    fn drop(&mut self) {
        log::debug!("Removing staging directory {}", self.dir.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_keeps_name_and_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("Quarterly Report.docx");
        std::fs::write(&source, b"contents").unwrap();
        let temp_root = root.path().join("tmp");
        std::fs::create_dir(&temp_root).unwrap();

        let staged = StagedCopy::new(&source, &temp_root).unwrap();
        assert_eq!(staged.path().file_name().unwrap(), "Quarterly Report.docx");
        assert!(staged.dir().starts_with(&temp_root));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"contents");

        let dir = staged.dir().to_path_buf();
        drop(staged);
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(&temp_root).unwrap().count(), 0);
        assert!(source.exists());
    }

    #[test]
    fn missing_source_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("absent.pdf");

        let err = match StagedCopy::new(&missing, root.path()) {
            Ok(_) => panic!("staging a missing file succeeded"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::Staging { .. }));
        assert!(err.to_string().contains("absent.pdf"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
