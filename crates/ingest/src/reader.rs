use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::LoadError;

/// Extensions of the plain-text renditions produced by the upstream
/// file-to-text service.
const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Files whose names start with this (any case) are skipped when listing.
const SKIPPED_PREFIX: &str = "home";

pub struct FileReader;

impl FileReader {
    pub fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub async fn read_file(path: &Path) -> Result<String, LoadError> {
        if !Self::is_supported(path) {
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            return Err(LoadError::UnsupportedFormat(extension.to_string()));
        }

        let content = fs::read_to_string(path).await.map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(content.trim().to_string())
    }

    fn is_skipped(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.get(..SKIPPED_PREFIX.len()))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SKIPPED_PREFIX))
    }

    /// Supported files directly inside `dir`, in a stable order.
    /// Subdirectories are not descended into.
    pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| Self::is_supported(path) && !Self::is_skipped(path))
            .collect();
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(FileReader::is_supported(Path::new("invoice_1.txt")));
        assert!(FileReader::is_supported(Path::new("notes/README.MD")));
        assert!(!FileReader::is_supported(Path::new("contract.pdf")));
        assert!(!FileReader::is_supported(Path::new("no_extension")));
    }

    #[test]
    fn test_listing_is_flat_and_skips_home_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Invoice_1.txt"), "INVOICE").unwrap();
        std::fs::write(dir.path().join("Home_Page.txt"), "welcome").unwrap();
        std::fs::write(dir.path().join("homework.md"), "notes").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/Contract_1.txt"), "AGREEMENT").unwrap();

        let files = FileReader::list_directory(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("Invoice_1.txt")]);
    }

    #[tokio::test]
    async fn test_read_rejects_unsupported() {
        let err = FileReader::read_file(Path::new("scan.pdf")).await.unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "pdf"));
    }
}
