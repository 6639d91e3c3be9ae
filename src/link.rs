// src/link.rs

//! Force symbolic links.
//!
//! **CAUTION: whatever occupies the destination is removed first.** Files and
//! links are unlinked; a directory is removed only when empty.

use std::fs::Metadata;
use std::io;
use std::path::Path;

use tokio::fs;

use crate::error::{FsError, Result};
use crate::observer::Observer;

/// Create a symbolic link `dest -> src`, replacing anything at `dest`.
///
/// `src` is stored verbatim, so a relative `src` resolves against `dest`'s
/// directory when the link is followed. Every failure is `symlink_failed`.
pub async fn make_link_force(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    observer: &dyn Observer,
) -> Result<()> {
    const METHOD: &str = "make_link_force";
    let (src, dest) = (src.as_ref(), dest.as_ref());
    observer.method_args(METHOD, &(src, dest));

    link_over(src, dest)
        .await
        .map_err(|e| FsError::symlink(src, dest, e).report(observer, METHOD))
}

async fn link_over(src: &Path, dest: &Path) -> io::Result<()> {
    // symlink_metadata so a dangling link at `dest` still counts as occupied.
    match fs::symlink_metadata(dest).await {
        Ok(meta) => remove_entry(dest, &meta).await?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
                if !fs::try_exists(dir).await.unwrap_or(false) {
                    fs::create_dir_all(dir).await?;
                }
            }
        }
        Err(e) => return Err(e),
    }

    symlink(src, dest).await
}

/// Non-recursive removal; already gone counts as removed.
async fn remove_entry(path: &Path, meta: &Metadata) -> io::Result<()> {
    let removed = if meta.is_dir() {
        fs::remove_dir(path).await
    } else {
        remove_file_or_link(path, meta).await
    };
    match removed {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
async fn remove_file_or_link(path: &Path, _meta: &Metadata) -> io::Result<()> {
    fs::remove_file(path).await
}

#[cfg(windows)]
async fn remove_file_or_link(path: &Path, meta: &Metadata) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;

    if meta.file_type().is_symlink_dir() {
        fs::remove_dir(path).await
    } else {
        fs::remove_file(path).await
    }
}

#[cfg(unix)]
async fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    fs::symlink(src, dest).await
}

#[cfg(windows)]
async fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let target = match dest.parent() {
        Some(dir) if src.is_relative() => dir.join(src),
        _ => src.to_path_buf(),
    };
    if fs::metadata(&target).await.map(|m| m.is_dir()).unwrap_or(false) {
        fs::symlink_dir(src, dest).await
    } else {
        fs::symlink_file(src, dest).await
    }
}
