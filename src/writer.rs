// src/writer.rs

//! JSON file writer.
//!
//! A write runs in three phases:
//!
//! 1. **Serialize** the value. Nothing on disk is touched if this fails.
//! 2. **Reconcile** the target. An existing file is kept, copied, or moved to
//!    `<path>.bk` according to [`ExistingFilePolicy`]; a backup failure is
//!    reported and ignored. An absent target gets its parent directory tree
//!    created, and failure there aborts.
//! 3. **Write** the text, creating or truncating the target.
//!
//! The blocking and non-blocking forms share one reconcile plan; they differ only
//! in whether `std::fs` or `tokio::fs` carries out the plan.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::error::{FsError, Result};
use crate::json;
use crate::observer::{BACKUP_FAILED, Observer, time_key};
use crate::options::{ExistingFilePolicy, WriteOptions, backup_path};

/// How a backup is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackupMode {
    Copy,
    Rename,
}

/// What to do at the target before the final write.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reconcile {
    /// Nothing; the final write creates or overwrites the file.
    WriteOnly,
    /// Best-effort backup of the existing file.
    Backup { mode: BackupMode, to: PathBuf },
    /// Target is absent; create its parent directory tree first.
    CreateParent(PathBuf),
}

fn reconcile(path: &Path, exists: bool, policy: ExistingFilePolicy) -> Reconcile {
    if exists {
        let mode = match policy {
            ExistingFilePolicy::Replace => return Reconcile::WriteOnly,
            ExistingFilePolicy::Copy => BackupMode::Copy,
            ExistingFilePolicy::Rename => BackupMode::Rename,
        };
        return Reconcile::Backup {
            mode,
            to: backup_path(path),
        };
    }

    match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => Reconcile::CreateParent(dir.to_path_buf()),
        None => Reconcile::WriteOnly,
    }
}

fn backup_sync(mode: BackupMode, from: &Path, to: &Path) -> io::Result<()> {
    match mode {
        BackupMode::Copy => std::fs::copy(from, to).map(drop),
        BackupMode::Rename => std::fs::rename(from, to),
    }
}

async fn backup_async(mode: BackupMode, from: &Path, to: &Path) -> io::Result<()> {
    match mode {
        BackupMode::Copy => tokio::fs::copy(from, to).await.map(drop),
        BackupMode::Rename => tokio::fs::rename(from, to).await,
    }
}

/// Serialize `value` and write it to `path`, blocking the calling thread.
///
/// ```no_run
/// use jsonfs::{ExistingFilePolicy, LogObserver, WriteOptions, write_json_file_sync};
///
/// let options = WriteOptions::new()
///     .with_policy(ExistingFilePolicy::Copy)
///     .with_indent(2);
/// write_json_file_sync(
///     "./file.json",
///     &serde_json::json!({"a": 1, "b": 2}),
///     &options,
///     &LogObserver::default(),
/// )?;
/// # Ok::<(), jsonfs::FsError>(())
/// ```
pub fn write_json_file_sync<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
    options: &WriteOptions,
    observer: &dyn Observer,
) -> Result<()> {
    const METHOD: &str = "write_json_file_sync";
    let path = path.as_ref();
    observer.method_args(METHOD, &path);

    let content = json::encode(METHOD, path, value, options.indent.as_ref(), observer)?;

    match reconcile(path, path.exists(), options.policy) {
        Reconcile::WriteOnly => {}
        Reconcile::Backup { mode, to } => {
            if let Err(e) = backup_sync(mode, path, &to) {
                observer.error(METHOD, BACKUP_FAILED, &e);
            }
        }
        Reconcile::CreateParent(dir) => {
            std::fs::create_dir_all(&dir)
                .map_err(|e| FsError::make_dir(&dir, e).report(observer, METHOD))?;
        }
    }

    let started = Instant::now();
    std::fs::write(path, &content)
        .map_err(|e| FsError::write_file(path, e).report(observer, METHOD))?;
    observer.timing(&time_key("write", path), started.elapsed());

    Ok(())
}

/// Serialize `value` and write it to `path` without blocking the runtime.
///
/// Concurrent writes to the same path are not coordinated.
pub async fn write_json_file<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
    options: &WriteOptions,
    observer: &dyn Observer,
) -> Result<()> {
    const METHOD: &str = "write_json_file";
    let path = path.as_ref();
    observer.method_args(METHOD, &path);

    let content = json::encode(METHOD, path, value, options.indent.as_ref(), observer)?;

    let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
    match reconcile(path, exists, options.policy) {
        Reconcile::WriteOnly => {}
        Reconcile::Backup { mode, to } => {
            if let Err(e) = backup_async(mode, path, &to).await {
                observer.error(METHOD, BACKUP_FAILED, &e);
            }
        }
        Reconcile::CreateParent(dir) => {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| FsError::make_dir(&dir, e).report(observer, METHOD))?;
        }
    }

    let started = Instant::now();
    tokio::fs::write(path, &content)
        .await
        .map_err(|e| FsError::write_file(path, e).report(observer, METHOD))?;
    observer.timing(&time_key("write", path), started.elapsed());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::observer::testing::{RecordingObserver, init_logger};
    use crate::reader::{read_json_file, read_json_file_sync};
    use serde::Serializer;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    /// Fails to serialize, like a value with a reference cycle.
    struct Cyclic;

    impl Serialize for Cyclic {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("circular structure"))
        }
    }

    fn read_text(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_reconcile_existing() {
        let path = Path::new("d/a.json");
        assert_eq!(
            reconcile(path, true, ExistingFilePolicy::Replace),
            Reconcile::WriteOnly
        );
        assert_eq!(
            reconcile(path, true, ExistingFilePolicy::Copy),
            Reconcile::Backup {
                mode: BackupMode::Copy,
                to: PathBuf::from("d/a.json.bk")
            }
        );
        assert_eq!(
            reconcile(path, true, ExistingFilePolicy::Rename),
            Reconcile::Backup {
                mode: BackupMode::Rename,
                to: PathBuf::from("d/a.json.bk")
            }
        );
    }

    #[test]
    fn test_reconcile_absent() {
        for policy in [
            ExistingFilePolicy::Replace,
            ExistingFilePolicy::Copy,
            ExistingFilePolicy::Rename,
        ] {
            assert_eq!(
                reconcile(Path::new("d/e/a.json"), false, policy),
                Reconcile::CreateParent(PathBuf::from("d/e"))
            );
        }
        assert_eq!(
            reconcile(Path::new("a.json"), false, ExistingFilePolicy::Copy),
            Reconcile::WriteOnly
        );
    }

    #[test]
    fn test_creates_missing_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.json");
        let observer = RecordingObserver::default();

        let value = json!({"id": "1", "hello": "world"});
        write_json_file_sync(&path, &value, &WriteOptions::default(), &observer).unwrap();

        assert!(tmp.path().join("a/b").is_dir());
        assert_eq!(read_text(&path), r#"{"id":"1","hello":"world"}"#);
        let back: Value = read_json_file_sync(&path, &observer).unwrap().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_stringify_failure_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("never/made.json");
        let observer = RecordingObserver::default();

        let err = write_json_file_sync(&path, &Cyclic, &WriteOptions::default(), &observer)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StringifyFailed);
        assert!(!tmp.path().join("never").exists());
        assert_eq!(observer.error_codes(), vec!["stringify_failed"]);
    }

    #[test]
    fn test_stringify_failure_keeps_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keep.json");
        std::fs::write(&path, "\"old\"").unwrap();

        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Rename);
        let err = write_json_file_sync(&path, &Cyclic, &options, &RecordingObserver::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StringifyFailed);
        assert_eq!(read_text(&path), "\"old\"");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_replace_leaves_no_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("r.json");
        let observer = RecordingObserver::default();
        let options = WriteOptions::default();

        write_json_file_sync(&path, &json!({"v": "A"}), &options, &observer).unwrap();
        write_json_file_sync(&path, &json!({"v": "B"}), &options, &observer).unwrap();

        assert_eq!(read_text(&path), r#"{"v":"B"}"#);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_copy_keeps_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("c.json");
        let observer = RecordingObserver::default();
        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Copy);

        write_json_file_sync(&path, &json!({"v": "A"}), &options, &observer).unwrap();
        write_json_file_sync(&path, &json!({"v": "B"}), &options, &observer).unwrap();

        assert_eq!(read_text(&path), r#"{"v":"B"}"#);
        assert_eq!(read_text(&backup_path(&path)), r#"{"v":"A"}"#);

        // A second backup overwrites the first.
        write_json_file_sync(&path, &json!({"v": "C"}), &options, &observer).unwrap();
        assert_eq!(read_text(&backup_path(&path)), r#"{"v":"B"}"#);
    }

    #[test]
    fn test_rename_matches_copy_end_state() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.json");
        let observer = RecordingObserver::default();
        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Rename);

        write_json_file_sync(&path, &json!({"v": "A"}), &options, &observer).unwrap();
        write_json_file_sync(&path, &json!({"v": "B"}), &options, &observer).unwrap();

        assert_eq!(read_text(&path), r#"{"v":"B"}"#);
        assert_eq!(read_text(&backup_path(&path)), r#"{"v":"A"}"#);
        assert!(observer.error_codes().is_empty());
    }

    #[test]
    fn test_backup_failure_does_not_block_write() {
        init_logger();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.json");
        std::fs::write(&path, r#"{"v":"A"}"#).unwrap();

        // A non-empty directory at the backup location defeats copy and rename.
        let blocker = backup_path(&path);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("occupied"), "").unwrap();

        for policy in [ExistingFilePolicy::Copy, ExistingFilePolicy::Rename] {
            let observer = RecordingObserver::default();
            let options = WriteOptions::new().with_policy(policy);
            write_json_file_sync(&path, &json!({"v": policy.as_str()}), &options, &observer)
                .unwrap();

            assert_eq!(read_text(&path), format!(r#"{{"v":"{}"}}"#, policy));
            assert_eq!(observer.error_codes(), vec![BACKUP_FAILED]);
        }
        assert!(blocker.join("occupied").exists());
    }

    #[test]
    fn test_make_dir_failure_aborts() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, "").unwrap();
        let path = file.join("sub/target.json");
        let observer = RecordingObserver::default();

        let err = write_json_file_sync(&path, &json!(1), &WriteOptions::default(), &observer)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MakeDirFailed);
        assert_eq!(observer.error_codes(), vec!["make_dir_failed"]);
    }

    #[tokio::test]
    async fn test_async_backup_failure_does_not_block_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.json");
        std::fs::write(&path, r#"{"v":"A"}"#).unwrap();

        let blocker = backup_path(&path);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("occupied"), "").unwrap();

        for policy in [ExistingFilePolicy::Copy, ExistingFilePolicy::Rename] {
            let observer = RecordingObserver::default();
            let options = WriteOptions::new().with_policy(policy);
            write_json_file(&path, &json!({"v": policy.as_str()}), &options, &observer)
                .await
                .unwrap();

            assert_eq!(read_text(&path), format!(r#"{{"v":"{}"}}"#, policy));
            assert_eq!(observer.error_codes(), vec![BACKUP_FAILED]);
        }
        assert!(blocker.join("occupied").exists());
    }

    #[tokio::test]
    async fn test_async_make_dir_failure_aborts() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, "").unwrap();
        let path = file.join("sub/target.json");
        let observer = RecordingObserver::default();

        let err = write_json_file(&path, &json!(1), &WriteOptions::default(), &observer)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MakeDirFailed);
        assert_eq!(observer.error_codes(), vec!["make_dir_failed"]);
        assert_eq!(read_text(&file), "");
    }

    #[test]
    fn test_rename_moves_directory_target_aside() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dir.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner"), "kept").unwrap();
        let observer = RecordingObserver::default();

        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Rename);
        write_json_file_sync(&path, &json!({"v": 1}), &options, &observer).unwrap();

        assert_eq!(read_text(&path), r#"{"v":1}"#);
        assert_eq!(read_text(&backup_path(&path).join("inner")), "kept");
        assert!(observer.error_codes().is_empty());
    }

    #[test]
    fn test_directory_target_is_write_file_failed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dir.json");
        std::fs::create_dir(&path).unwrap();
        let observer = RecordingObserver::default();

        let err = write_json_file_sync(&path, &json!(1), &WriteOptions::default(), &observer)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFileFailed);
        assert_eq!(observer.error_codes(), vec!["write_file_failed"]);
    }

    #[test]
    fn test_indent_option() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pretty.json");
        let options = WriteOptions::new().with_indent(2);

        write_json_file_sync(&path, &json!({"a": 1}), &options, &RecordingObserver::default())
            .unwrap();
        assert_eq!(read_text(&path), "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_async_round_trip_with_copy() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/doc.json");
        let observer = RecordingObserver::default();
        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Copy);

        write_json_file(&path, &json!({"v": "A"}), &options, &observer)
            .await
            .unwrap();
        write_json_file(&path, &json!({"v": "B"}), &options, &observer)
            .await
            .unwrap();

        let current: Value = read_json_file(&path, &observer).await.unwrap().unwrap();
        let backup: Value = read_json_file(backup_path(&path), &observer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current, json!({"v": "B"}));
        assert_eq!(backup, json!({"v": "A"}));
        assert!(
            observer
                .timings
                .lock()
                .unwrap()
                .contains(&"write doc.json".to_string())
        );
    }

    #[tokio::test]
    async fn test_async_rename_and_failures() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        let observer = RecordingObserver::default();
        let options = WriteOptions::new().with_policy(ExistingFilePolicy::Rename);

        write_json_file(&path, &json!([1]), &options, &observer)
            .await
            .unwrap();
        write_json_file(&path, &json!([2]), &options, &observer)
            .await
            .unwrap();
        assert_eq!(read_text(&path), "[2]");
        assert_eq!(read_text(&backup_path(&path)), "[1]");

        let err = write_json_file(tmp.path().join("other.json"), &Cyclic, &options, &observer)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StringifyFailed);
        assert!(!tmp.path().join("other.json").exists());

        let err = write_json_file(tmp.path(), &json!(null), &WriteOptions::default(), &observer)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFileFailed);
    }
}
