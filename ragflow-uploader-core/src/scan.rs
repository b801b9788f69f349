//! Directory scanning: find the files the knowledge base can ingest.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::AppError;

/// Extensions the remote service accepts, lower-case, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "xml", "html", "htm", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "pdf",
    "csv", "rtf",
];

/// A supported file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// File name; this is the document name used remotely.
    pub name: String,
    /// Lower-case extension.
    pub extension: String,
}

impl FileEntry {
    /// `Some` when `path` has a supported extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
        if !is_supported_extension(&extension) {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(FileEntry {
            path: path.to_path_buf(),
            name,
            extension,
        })
    }
}

pub fn is_supported_extension(extension: &str) -> bool {
    let extension = extension.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&extension.as_str())
}

/// List the supported files in `directory`, sorted by path.
///
/// Subdirectories are only descended into when `recursive` is set. Symlinked
/// directories are never followed.
pub fn scan_directory(directory: &Path, recursive: bool) -> Result<Vec<FileEntry>, AppError> {
    info!(directory = %directory.display(), recursive, "Scanning directory");

    if !directory.exists() {
        return Err(AppError::DirectoryNotFound(directory.to_path_buf()));
    }
    if !directory.is_dir() {
        return Err(AppError::NotADirectory(directory.to_path_buf()));
    }
    let root = directory.canonicalize().map_err(|source| AppError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut walker = WalkDir::new(&root).follow_links(false).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    let mut total_files = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| AppError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
            source: e.into(),
        })?;
        let path = entry.path();
        let file_type = entry.file_type();
        if file_type.is_dir() {
            if !recursive {
                debug!(path = %path.display(), "Skipping subdirectory");
            }
            continue;
        }
        // Symlinked files are kept; symlinked directories are never entered.
        if file_type.is_symlink() && !path.is_file() {
            debug!(path = %path.display(), "Skipping symlink");
            continue;
        }
        if !path.is_file() {
            continue;
        }
        total_files += 1;
        match FileEntry::from_path(path) {
            Some(file) => {
                debug!(path = %path.display(), "Found supported file");
                files.push(file);
            }
            None => debug!(path = %path.display(), "Skipping unsupported file"),
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        scanned = total_files,
        supported = files.len(),
        "Directory scan complete"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"content").unwrap();
    }

    fn names(files: &[FileEntry]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn keeps_only_supported_extensions_case_insensitively() {
        let dir = tempdir().unwrap();
        for name in ["b.pdf", "a.txt", "c.exe", "D.DOCX", "e.Md", "noext", "f.tar.gz"] {
            touch(dir.path(), name);
        }

        let files = scan_directory(dir.path(), false).unwrap();
        assert_eq!(names(&files), vec!["D.DOCX", "a.txt", "b.pdf", "e.Md"]);
        assert_eq!(files[0].extension, "docx");
        assert!(files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn every_listed_extension_is_accepted() {
        let dir = tempdir().unwrap();
        for ext in SUPPORTED_EXTENSIONS {
            touch(dir.path(), &format!("file.{ext}"));
        }
        let files = scan_directory(dir.path(), false).unwrap();
        assert_eq!(files.len(), SUPPORTED_EXTENSIONS.len());
    }

    #[test]
    fn subdirectories_are_ignored_unless_recursive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "top.txt");
        let nested = dir.path().join("nested.pdf");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "inner.md");

        let flat = scan_directory(dir.path(), false).unwrap();
        assert_eq!(names(&flat), vec!["top.txt"]);

        let deep = scan_directory(dir.path(), true).unwrap();
        assert_eq!(names(&deep), vec!["inner.md", "top.txt"]);
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = scan_directory(&missing, false).unwrap_err();
        assert!(matches!(err, AppError::DirectoryNotFound(p) if p == missing));
    }

    #[test]
    fn file_path_is_not_a_directory() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        let err = scan_directory(&dir.path().join("a.txt"), false).unwrap_err();
        assert!(matches!(err, AppError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn recursive_scan_does_not_follow_directory_symlinks() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "b.md");
        std::os::unix::fs::symlink(dir.path(), nested.join("loop")).unwrap();
        std::os::unix::fs::symlink(nested.join("b.md"), dir.path().join("alias.md")).unwrap();

        let files = scan_directory(dir.path(), true).unwrap();
        assert_eq!(names(&files), vec!["a.txt", "alias.md", "b.md"]);
    }
}
