// src/store.rs

//! Directory-rooted JSON store.
//!
//! [`JsonStore`] resolves relative keys against a root directory and runs the
//! reader, writer, and linker with its own default [`WriteOptions`] and
//! observer.
//!
//! ```text
//! {root}/
//! ├── users/
//! │   ├── abc.json
//! │   └── abc.json.bk     # previous content under copy/rename policies
//! └── current.json -> users/abc.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{FsError, Result};
use crate::link::make_link_force;
use crate::observer::{LogObserver, Observer};
use crate::options::WriteOptions;
use crate::reader::{read_json_file, read_json_file_sync};
use crate::writer::{write_json_file, write_json_file_sync};

/// Untyped document access, usable as `Arc<dyn JsonStorage>`.
#[async_trait]
pub trait JsonStorage: Send + Sync {
    /// Load the document at `key`, `None` if it does not exist.
    async fn load_value(&self, key: &str) -> Result<Option<Value>>;

    /// Save `value` at `key` with the backend's default write options.
    async fn save_value(&self, key: &str, value: &Value) -> Result<()>;
}

/// JSON files under one root directory.
#[derive(Clone)]
pub struct JsonStore {
    root_dir: PathBuf,
    options: WriteOptions,
    observer: Arc<dyn Observer>,
}

impl JsonStore {
    /// Create a store rooted at `root_dir`, logging through `log`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            options: WriteOptions::default(),
            observer: Arc::new(LogObserver::default()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.root_dir)
            .with_options(config.write.clone())
            .with_observer(Arc::new(LogObserver::new(config.logging.target.clone())))
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        read_json_file(self.path(key), self.observer.as_ref()).await
    }

    pub fn read_json_sync<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        read_json_file_sync(self.path(key), self.observer.as_ref())
    }

    /// Write with the store's default options.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.write_json_with(key, value, &self.options).await
    }

    pub async fn write_json_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: &WriteOptions,
    ) -> Result<()> {
        write_json_file(self.path(key), value, options, self.observer.as_ref()).await
    }

    pub fn write_json_sync<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        write_json_file_sync(self.path(key), value, &self.options, self.observer.as_ref())
    }

    /// Issue every write at once and wait for all of them.
    ///
    /// Fails with the first error; writes already finished stay on disk.
    /// Keys should be distinct, since writes to one path are not ordered.
    pub async fn write_many<K, T>(&self, items: &[(K, T)]) -> Result<()>
    where
        K: AsRef<str>,
        T: Serialize,
    {
        self.observer
            .method_args("write_many", &(self.root_dir.as_path(), items.len()));
        try_join_all(
            items
                .iter()
                .map(|(key, value)| self.write_json(key.as_ref(), value)),
        )
        .await?;
        Ok(())
    }

    /// Point `dest_key` at `src_key`, replacing whatever is at `dest_key`.
    ///
    /// The link stores the absolute source path, so it resolves even when
    /// `root_dir` is relative.
    pub async fn link_force(&self, src_key: &str, dest_key: &str) -> Result<()> {
        const METHOD: &str = "link_force";
        let (src, dest) = (self.path(src_key), self.path(dest_key));
        let target = std::path::absolute(&src).map_err(|e| {
            FsError::symlink(&src, &dest, e).report(self.observer.as_ref(), METHOD)
        })?;
        make_link_force(target, dest, self.observer.as_ref()).await
    }
}

#[async_trait]
impl JsonStorage for JsonStore {
    async fn load_value(&self, key: &str) -> Result<Option<Value>> {
        self.read_json(key).await
    }

    async fn save_value(&self, key: &str, value: &Value) -> Result<()> {
        self.write_json(key, value).await
    }
}
