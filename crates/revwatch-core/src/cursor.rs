//! The commit cursor: the last revision the pipeline fully processed.
//!
//! Reads fail soft. A lost cursor only costs one redundant update, so an
//! unreadable file is logged and treated as "no prior state". Writes report
//! their error but the caller never undoes a completed pipeline run because
//! of one.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error};

pub trait CursorStore: Send + Sync {
    /// The stored revision, or `None` when absent or unreadable.
    fn read(&self) -> Option<String>;

    fn write(&self, revision: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileCursorStore
// ---------------------------------------------------------------------------

/// A single-line file holding one revision identifier.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at the default location under `root`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(crate::paths::cursor_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CursorStore for FileCursorStore {
    fn read(&self) -> Option<String> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cursor file yet");
                return None;
            }
            Err(e) => {
                error!(path = %self.path.display(), "cannot read cursor file: {e}");
                return None;
            }
        };
        let value = data.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn write(&self, revision: &str) -> Result<()> {
        crate::io::atomic_write(&self.path, revision.trim().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// MemoryCursorStore
// ---------------------------------------------------------------------------

/// Process-local cursor, for one-shot runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    value: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryCursorStore {
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            value: Mutex::new(initial.map(str::to_string)),
            writes: Mutex::new(0),
        }
    }

    /// How many times `write` has been called.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|n| *n).unwrap_or(0)
    }
}

impl CursorStore for MemoryCursorStore {
    fn read(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn write(&self, revision: &str) -> Result<()> {
        if let Ok(mut v) = self.value.lock() {
            *v = Some(revision.to_string());
        }
        if let Ok(mut n) = self.writes.lock() {
            *n += 1;
        }
        Ok(())
    }
}
