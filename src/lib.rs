// src/lib.rs

//! jsonfs: hardened JSON file helpers.
//!
//! - [`reader`]: read and parse a JSON file, `None` when it does not exist
//! - [`writer`]: serialize and write a JSON file with an existing-file policy
//! - [`link`]: replace whatever occupies a path with a symbolic link
//! - [`store`]: a directory-rooted handle over the three operations
//!
//! Every operation comes in a blocking form (`*_sync`, backed by `std::fs`)
//! and a non-blocking form (backed by `tokio::fs`), except the linker which
//! is non-blocking only. Observability is injected through [`Observer`].

pub mod config;
pub mod error;
pub mod link;
pub mod observer;
pub mod options;
pub mod reader;
pub mod store;
pub mod writer;

mod json;

pub use config::{ConfigError, StoreConfig};
pub use error::{ErrorKind, FsError, Result};
pub use link::make_link_force;
pub use observer::{LogObserver, NoopObserver, Observer};
pub use options::{ExistingFilePolicy, Indent, WriteOptions, backup_path};
pub use reader::{read_json_file, read_json_file_sync};
pub use store::{JsonStorage, JsonStore};
pub use writer::{write_json_file, write_json_file_sync};

#[cfg(feature = "tracing")]
pub use observer::TracingObserver;
