//! File lifecycle helpers for temporary audio.

use std::io::ErrorKind;
use std::path::Path;

/// Delete a file, logging failures instead of returning them.
///
/// A missing file counts as already deleted. Returns `true` when the file no
/// longer exists afterwards.
pub fn remove_file_logged(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Temporary file deleted");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete temporary file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.ogg");
        std::fs::write(&path, b"data").unwrap();
        assert!(remove_file_logged(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_file_logged(&dir.path().join("absent.wav")));
    }

    #[test]
    fn test_directory_is_not_removed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_file_logged(dir.path()));
        assert!(dir.path().exists());
    }
}
