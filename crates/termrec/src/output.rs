//! The recording file on disk.
//!
//! The destination is checked before the session starts by creating a
//! temporary file next to it. The finished recording is written there in one
//! go and renamed over the destination, so readers never see a partial file.

use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{RecordError, Result};

/// A recording destination with its staging file.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    staging: NamedTempFile,
}

impl OutputFile {
    /// Prepare to write `path`.
    ///
    /// Fails early if the target directory does not exist or is not writable.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(RecordError::setup(format!("{} is a directory", path.display())));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let staging = tempfile::Builder::new()
            .prefix(".termrec-")
            .suffix(".tmp")
            .permissions(Permissions::from_mode(0o644))
            .tempfile_in(&dir)
            .map_err(|e| {
                RecordError::io_context(format!("cannot write to {}", dir.display()), e)
            })?;

        tracing::debug!(
            path = %path.display(),
            staging = %staging.path().display(),
            "output prepared"
        );
        Ok(Self { path, staging })
    }

    /// The final destination.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` and move the file into place.
    pub fn persist(mut self, contents: &str) -> Result<PathBuf> {
        let path = self.path;
        let write = self
            .staging
            .write_all(contents.as_bytes())
            .and_then(|()| self.staging.as_file().sync_all());
        if let Err(source) = write {
            return Err(RecordError::Persist { path, source });
        }

        self.staging
            .persist(&path)
            .map_err(|e| RecordError::Persist {
                path: path.clone(),
                source: e.error,
            })?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "recording written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("session.record");

        let output = OutputFile::create(&target).unwrap();
        assert_eq!(output.path(), target);
        assert!(!target.exists());

        let written = output.persist("session_recorded({});\n").unwrap();
        assert_eq!(written, target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "session_recorded({});\n");
    }

    #[test]
    fn persist_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("terminal.record");
        std::fs::write(&target, "old").unwrap();

        OutputFile::create(&target).unwrap().persist("new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn dropped_output_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("never.record");

        drop(OutputFile::create(&target).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.record");

        let err = OutputFile::create(&target).unwrap_err();
        assert!(matches!(err, RecordError::IoWithContext { .. }));
    }

    #[test]
    fn directory_target_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = OutputFile::create(dir.path()).unwrap_err();
        assert!(matches!(err, RecordError::Setup { .. }));
    }
}
