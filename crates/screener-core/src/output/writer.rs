//! Persisting captures to a directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::error::CaptureError;

use super::naming::file_name;

/// Temporary suffix used until the capture is fully written.
pub const TEMP_SUFFIX: &str = ".part";

/// Destination for unique captures.
pub trait ResultWriter: Send + Sync {
    /// Writes `image` under `stem`. An empty image writes nothing and returns `None`.
    fn save(&self, image: &[u8], stem: &str) -> Result<Option<PathBuf>, CaptureError>;
}

/// Writes `<dir>/<stem>.png` through a uniquely named `.part` file and a
/// rename, so a reader never sees a half-written capture. Two saves of the
/// same stem never share a temp file; the last rename wins.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    dir: PathBuf,
}

impl DirectoryWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_atomic(&self, stem: &str, final_path: &Path, image: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Dropped (and deleted) on any early return.
        let mut tmp = Builder::new()
            .prefix(&format!(".{stem}."))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)?;
        tmp.write_all(image)?;
        tmp.as_file().sync_all()?;
        tmp.persist(final_path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ResultWriter for DirectoryWriter {
    fn save(&self, image: &[u8], stem: &str) -> Result<Option<PathBuf>, CaptureError> {
        if image.is_empty() {
            return Ok(None);
        }
        let final_path = self.dir.join(file_name(stem));
        self.write_atomic(stem, &final_path, image).map_err(|e| CaptureError::Write {
            url: stem.to_string(),
            detail: format!("{}: {e}", final_path.display()),
        })?;
        tracing::debug!(path = %final_path.display(), bytes = image.len(), "capture written");
        Ok(Some(final_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn save_creates_directory_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("shots");
        let writer = DirectoryWriter::new(&out);

        let path = writer.save(b"\x89PNG fake", "https_example.com").unwrap().unwrap();
        assert_eq!(path, out.join("https_example.com.png"));
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG fake");
        assert_eq!(entries(&out), vec!["https_example.com.png"]);
    }

    #[test]
    fn concurrent_saves_of_one_stem_publish_a_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = std::sync::Arc::new(DirectoryWriter::new(dir.path()));
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let writer = writer.clone();
                std::thread::spawn(move || writer.save(&vec![i; 64 * 1024], "https_example.com"))
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap().unwrap().is_some());
        }

        assert_eq!(entries(dir.path()), vec!["https_example.com.png"]);
        let written = fs::read(dir.path().join("https_example.com.png")).unwrap();
        assert_eq!(written.len(), 64 * 1024);
        assert!(written.iter().all(|b| *b == written[0]));
    }

    #[test]
    fn empty_image_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DirectoryWriter::new(dir.path().join("out"));
        assert_eq!(writer.save(b"", "x").unwrap(), None);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn unwritable_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let writer = DirectoryWriter::new(blocker.join("sub"));
        let err = writer.save(b"data", "x").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Write);
    }
}
