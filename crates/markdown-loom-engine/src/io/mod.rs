//! Reading and writing documents under a documents root.

use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a markdown document and return its content
pub fn read_document(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    Ok(fs::read_to_string(&absolute_path)?)
}

/// Write a document, creating parent directories as needed
pub fn write_document(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&absolute_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_nested_document() {
        let root = TempDir::new().unwrap();
        let path = RelativePath::new("journal/2024/notes.md");

        write_document(path, root.path(), "# Notes\n- one").unwrap();

        assert!(root.path().join("journal/2024/notes.md").exists());
        assert_eq!(read_document(path, root.path()).unwrap(), "# Notes\n- one");
    }

    #[test]
    fn missing_document_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = read_document(RelativePath::new("nope.md"), root.path()).unwrap_err();
        assert!(matches!(err, IoError::NotFound(p) if p.ends_with("nope.md")));
    }
}
