// src/observer.rs

//! Injected observability for file operations.
//!
//! Operations never log through a global. They report to the [`Observer`]
//! the caller passes in: an entry event, every handled error (including
//! swallowed backup failures), and sub-step durations.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Default log target for [`LogObserver`].
pub const DEFAULT_TARGET: &str = "jsonfs";

/// Code reported when a copy/rename backup fails and the write carries on.
pub const BACKUP_FAILED: &str = "rename_copy_failed";

/// Side channel for operation events. All methods default to no-ops.
pub trait Observer: Send + Sync {
    /// An operation was entered with the given key argument(s).
    fn method_args(&self, method: &str, args: &dyn fmt::Debug) {
        let _ = (method, args);
    }

    /// An error was handled. `code` is an [`ErrorKind`](crate::ErrorKind)
    /// code or [`BACKUP_FAILED`].
    fn error(&self, method: &str, code: &str, cause: &dyn Error) {
        let _ = (method, code, cause);
    }

    /// A sub-step such as `"read b.json"` took `elapsed`.
    fn timing(&self, label: &str, elapsed: Duration) {
        let _ = (label, elapsed);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Reports through the `log` facade.
#[derive(Debug, Clone)]
pub struct LogObserver {
    target: String,
}

impl LogObserver {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl Observer for LogObserver {
    fn method_args(&self, method: &str, args: &dyn fmt::Debug) {
        log::debug!(target: self.target.as_str(), "{}({:?})", method, args);
    }

    fn error(&self, method: &str, code: &str, cause: &dyn Error) {
        // Backup failures are recovered from, so they stay below error level.
        if code == BACKUP_FAILED {
            log::warn!(target: self.target.as_str(), "{}: {}: {}", method, code, cause);
        } else {
            log::error!(target: self.target.as_str(), "{}: {}: {}", method, code, cause);
        }
    }

    fn timing(&self, label: &str, elapsed: Duration) {
        log::debug!(
            target: self.target.as_str(),
            "{} took {:.3}ms",
            label,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

/// Reports structured `tracing` events.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl Observer for TracingObserver {
    fn method_args(&self, method: &str, args: &dyn fmt::Debug) {
        tracing::debug!(method, args = ?args, "enter");
    }

    fn error(&self, method: &str, code: &str, cause: &dyn Error) {
        if code == BACKUP_FAILED {
            tracing::warn!(method, code, error = %cause, "backup skipped");
        } else {
            tracing::error!(method, code, error = %cause, "operation failed");
        }
    }

    fn timing(&self, label: &str, elapsed: Duration) {
        tracing::debug!(label, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "timing");
    }
}

/// Label for a timed sub-step: the step name plus the path's last segment.
pub(crate) fn time_key(step: &str, path: &std::path::Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy());
    format!("{} {}", step, name)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub calls: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<(String, String)>>,
        pub timings: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn error_codes(&self) -> Vec<String> {
            self.errors
                .lock()
                .unwrap()
                .iter()
                .map(|(_, code)| code.clone())
                .collect()
        }
    }

    impl Observer for RecordingObserver {
        fn method_args(&self, method: &str, _args: &dyn fmt::Debug) {
            self.calls.lock().unwrap().push(method.to_string());
        }

        fn error(&self, method: &str, code: &str, _cause: &dyn Error) {
            self.errors
                .lock()
                .unwrap()
                .push((method.to_string(), code.to_string()));
        }

        fn timing(&self, label: &str, _elapsed: Duration) {
            self.timings.lock().unwrap().push(label.to_string());
        }
    }

    pub fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}
