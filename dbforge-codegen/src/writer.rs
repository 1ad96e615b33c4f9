//! File output for generated artifacts

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{CodegenError, Result};

/// Writes generated files, creating parent directories as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriter;

impl FileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Plain write: create or truncate `path`.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        create_parent(path)?;
        fs::write(path, bytes).map_err(|e| CodegenError::write(path, e))
    }

    /// Write through a temporary sibling file renamed into place, so readers
    /// see either the old file or the complete new one.
    ///
    /// When the rename fails the temporary file is removed and the
    /// destination is left untouched.
    pub fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = create_parent(path)?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| CodegenError::write(path, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CodegenError::write(path, e))?;
        // A failed persist hands the temp file back; dropping it deletes it
        tmp.persist(path)
            .map_err(|e| CodegenError::write(path, e.error))?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| CodegenError::write(parent, e))?;
    Ok(parent)
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
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/users.rs");
        FileWriter::new().write_atomic(&path, b"pub struct User;").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pub struct User;");
        assert_eq!(entries(&dir.path().join("models")), vec!["users.rs"]);
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        let writer = FileWriter::new();
        writer.write(&path, b"old").unwrap();
        writer.write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_failed_rename_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the destination makes the rename fail
        let dest = dir.path().join("users.rs");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("keep"), b"x").unwrap();

        let err = FileWriter::new()
            .write_atomic(&dest, b"pub struct User;")
            .unwrap_err();
        assert!(matches!(err, CodegenError::Generate { path: Some(_), .. }));
        assert_eq!(entries(dir.path()), vec!["users.rs"]);
        assert!(dest.is_dir());
    }
}
