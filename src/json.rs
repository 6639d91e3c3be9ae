// src/json.rs

//! JSON encode/decode shared by the blocking and non-blocking forms.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{FsError, Result};
use crate::observer::{Observer, time_key};
use crate::options::Indent;

/// Serialize `value` to JSON bytes, pretty-printed when `indent` has a unit.
pub(crate) fn to_json_bytes<T: Serialize + ?Sized>(
    value: &T,
    indent: Option<&Indent>,
) -> serde_json::Result<Vec<u8>> {
    match indent.and_then(Indent::unit) {
        Some(unit) => {
            let mut out = Vec::with_capacity(128);
            let formatter = PrettyFormatter::with_indent(unit.as_bytes());
            let mut ser = Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut ser)?;
            Ok(out)
        }
        None => serde_json::to_vec(value),
    }
}

/// Serialize for a write to `path`, reporting failure as `stringify_failed`.
pub(crate) fn encode<T: Serialize + ?Sized>(
    method: &str,
    path: &Path,
    value: &T,
    indent: Option<&Indent>,
    observer: &dyn Observer,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let bytes = to_json_bytes(value, indent)
        .map_err(|e| FsError::stringify(path, e).report(observer, method))?;
    observer.timing(&time_key("stringify", path), started.elapsed());
    Ok(bytes)
}

/// Parse text read from `path`, reporting failure as `invalid_json`.
pub(crate) fn decode<T: DeserializeOwned>(
    method: &str,
    path: &Path,
    text: &str,
    observer: &dyn Observer,
) -> Result<T> {
    let started = Instant::now();
    let value = serde_json::from_str(text)
        .map_err(|e| FsError::invalid_json(path, e).report(observer, method))?;
    observer.timing(&time_key("parse", path), started.elapsed());
    Ok(value)
}
