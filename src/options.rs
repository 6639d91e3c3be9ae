//! Write options: existing-file policy and indentation.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Suffix appended to the full file name of a backup.
pub const BACKUP_SUFFIX: &str = ".bk";

/// Longest indent the writer will emit, in characters.
const MAX_INDENT: usize = 10;

/// What to do with a file already present at the write target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingFilePolicy {
    /// Overwrite in place
    #[default]
    Replace,
    /// Copy the old file to `<path>.bk`, then overwrite
    Copy,
    /// Move the old file to `<path>.bk`, then write fresh
    Rename,
}

impl ExistingFilePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistingFilePolicy::Replace => "replace",
            ExistingFilePolicy::Copy => "copy",
            ExistingFilePolicy::Rename => "rename",
        }
    }
}

impl fmt::Display for ExistingFilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExistingFilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(ExistingFilePolicy::Replace),
            "copy" => Ok(ExistingFilePolicy::Copy),
            "rename" => Ok(ExistingFilePolicy::Rename),
            other => Err(format!("unknown existing-file policy '{other}'")),
        }
    }
}

/// Pretty-print indentation: a space count or a literal indent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Indent {
    Spaces(usize),
    Text(String),
}

impl Indent {
    /// Indent bytes to emit per nesting level.
    ///
    /// Counts are clamped to 10 spaces and strings truncated to their first
    /// 10 characters. `None` means compact output.
    pub fn unit(&self) -> Option<String> {
        let unit = match self {
            Indent::Spaces(n) => " ".repeat((*n).min(MAX_INDENT)),
            Indent::Text(s) => s.chars().take(MAX_INDENT).collect(),
        };
        (!unit.is_empty()).then_some(unit)
    }
}

impl From<usize> for Indent {
    fn from(n: usize) -> Self {
        Indent::Spaces(n)
    }
}

impl From<&str> for Indent {
    fn from(s: &str) -> Self {
        Indent::Text(s.to_string())
    }
}

impl From<String> for Indent {
    fn from(s: String) -> Self {
        Indent::Text(s)
    }
}

/// Options for a single write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    #[serde(default)]
    pub policy: ExistingFilePolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<Indent>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: ExistingFilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_indent(mut self, indent: impl Into<Indent>) -> Self {
        self.indent = Some(indent.into());
        self
    }
}

/// Backup location for `path`: the full path with `.bk` appended.
///
/// `data/a.json` becomes `data/a.json.bk`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(BACKUP_SUFFIX);
    PathBuf::from(raw)
}
