// src/reader.rs

//! JSON file reader.
//!
//! A missing file is `Ok(None)`, never an error, so callers can tell
//! "no file yet" apart from `read_file_failed` and `invalid_json`.

use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;

use crate::error::{FsError, Result};
use crate::json;
use crate::observer::{Observer, time_key};

/// Read and parse a JSON file, blocking the calling thread.
///
/// ```no_run
/// use jsonfs::{LogObserver, read_json_file_sync};
///
/// let value: Option<serde_json::Value> =
///     read_json_file_sync("./file.json", &LogObserver::default())?;
/// # Ok::<(), jsonfs::FsError>(())
/// ```
pub fn read_json_file_sync<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    observer: &dyn Observer,
) -> Result<Option<T>> {
    const METHOD: &str = "read_json_file_sync";
    let path = path.as_ref();
    observer.method_args(METHOD, &path);

    if !path.exists() {
        return Ok(None);
    }

    let started = Instant::now();
    let text = std::fs::read_to_string(path)
        .map_err(|e| FsError::read_file(path, e).report(observer, METHOD))?;
    observer.timing(&time_key("read", path), started.elapsed());

    json::decode(METHOD, path, &text, observer).map(Some)
}

/// Read and parse a JSON file without blocking the runtime.
pub async fn read_json_file<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    observer: &dyn Observer,
) -> Result<Option<T>> {
    const METHOD: &str = "read_json_file";
    let path = path.as_ref();
    observer.method_args(METHOD, &path);

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }

    let started = Instant::now();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FsError::read_file(path, e).report(observer, METHOD))?;
    observer.timing(&time_key("read", path), started.elapsed());

    json::decode(METHOD, path, &text, observer).map(Some)
}
