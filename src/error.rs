// src/error.rs

//! Error taxonomy for JSON file operations.
//!
//! Every filesystem and serialization failure is wrapped into one of six
//! variants. Each keeps the path it was working on and the underlying cause,
//! reachable through [`std::error::Error::source`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::observer::Observer;

/// Result type alias for jsonfs operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// Stable error kinds, one per [`FsError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ReadFileFailed,
    InvalidJson,
    StringifyFailed,
    MakeDirFailed,
    WriteFileFailed,
    SymlinkFailed,
}

impl ErrorKind {
    /// Stable snake_case code for logs and matching.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ReadFileFailed => "read_file_failed",
            ErrorKind::InvalidJson => "invalid_json",
            ErrorKind::StringifyFailed => "stringify_failed",
            ErrorKind::MakeDirFailed => "make_dir_failed",
            ErrorKind::WriteFileFailed => "write_file_failed",
            ErrorKind::SymlinkFailed => "symlink_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a read, write, or link operation.
#[derive(Error, Debug)]
pub enum FsError {
    /// The file exists but its content could not be read
    #[error("read_file_failed: {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file content is not valid JSON for the requested type
    #[error("invalid_json: {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be serialized to JSON text
    #[error("stringify_failed: {}: {source}", .path.display())]
    Stringify {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The parent directory of an absent target could not be created
    #[error("make_dir_failed: {}: {source}", .dir.display())]
    MakeDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The final write to the target failed
    #[error("write_file_failed: {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing the destination, creating its directory, or linking failed
    #[error("symlink_failed: {} -> {}: {source}", .dest.display(), .src.display())]
    Symlink {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::ReadFile { .. } => ErrorKind::ReadFileFailed,
            FsError::InvalidJson { .. } => ErrorKind::InvalidJson,
            FsError::Stringify { .. } => ErrorKind::StringifyFailed,
            FsError::MakeDir { .. } => ErrorKind::MakeDirFailed,
            FsError::WriteFile { .. } => ErrorKind::WriteFileFailed,
            FsError::Symlink { .. } => ErrorKind::SymlinkFailed,
        }
    }

    /// Hand the error to `observer` and give it back for propagation.
    pub(crate) fn report(self, observer: &dyn Observer, method: &str) -> Self {
        observer.error(method, self.kind().as_str(), &self);
        self
    }

    pub(crate) fn read_file(path: &Path, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_json(path: &Path, source: serde_json::Error) -> Self {
        Self::InvalidJson {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn stringify(path: &Path, source: serde_json::Error) -> Self {
        Self::Stringify {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn make_dir(dir: &Path, source: io::Error) -> Self {
        Self::MakeDir {
            dir: dir.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write_file(path: &Path, source: io::Error) -> Self {
        Self::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn symlink(src: &Path, dest: &Path, source: io::Error) -> Self {
        Self::Symlink {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_codes() {
        let err = FsError::write_file(
            Path::new("/x/y.json"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::WriteFileFailed);
        assert_eq!(err.kind().as_str(), "write_file_failed");
        assert_eq!(ErrorKind::SymlinkFailed.to_string(), "symlink_failed");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = FsError::make_dir(
            Path::new("/x"),
            io::Error::new(io::ErrorKind::NotADirectory, "not a dir"),
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "not a dir");
        assert!(err.to_string().starts_with("make_dir_failed: /x"));
    }
}
