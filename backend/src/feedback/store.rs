use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const COUNTS_FILE: &str = "feedback_data.txt";
pub const LOG_FILE: &str = "feedback_log.txt";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Raw persistence behind the feedback ledger: a replaceable counters
/// snapshot plus an append-only event log.
pub trait FeedbackStore: Send {
    /// The current snapshot text, or `None` if nothing has been written yet.
    fn read_snapshot(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the snapshot with `contents`.
    fn write_snapshot(&mut self, contents: &str) -> Result<(), StoreError>;

    /// Appends one line, without its terminator, to the event log.
    fn append_event(&mut self, line: &str) -> Result<(), StoreError>;
}

/// Two plain-text files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    counts_path: PathBuf,
    log_path: PathBuf,
}

impl FileStore {
    /// Uses `dir/feedback_data.txt` and `dir/feedback_log.txt`, creating `dir`
    /// if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(StoreError::io("create", dir))?;
        Ok(Self {
            counts_path: dir.join(COUNTS_FILE),
            log_path: dir.join(LOG_FILE),
        })
    }

    pub fn counts_path(&self) -> &Path {
        &self.counts_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl FeedbackStore for FileStore {
    fn read_snapshot(&self) -> Result<Option<String>, StoreError> {
        match fs::read(&self.counts_path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("read", &self.counts_path)(e)),
        }
    }

    fn write_snapshot(&mut self, contents: &str) -> Result<(), StoreError> {
        // Rename over the old snapshot so readers never see a partial write.
        let tmp_path = self.counts_path.with_extension("txt.tmp");
        let mut tmp = File::create(&tmp_path).map_err(StoreError::io("create", &tmp_path))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.sync_all())
            .map_err(StoreError::io("write", &tmp_path))?;
        fs::rename(&tmp_path, &self.counts_path).map_err(StoreError::io("replace", &self.counts_path))
    }

    fn append_event(&mut self, line: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(StoreError::io("open", &self.log_path))?;
        writeln!(file, "{}", line).map_err(StoreError::io("append to", &self.log_path))
    }
}

/// Volatile store; cloned handles share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryContents>>,
}

#[derive(Debug, Default)]
struct MemoryContents {
    snapshot: Option<String>,
    events: Vec<String>,
}

impl MemoryStore {
    pub fn with_snapshot(contents: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.snapshot = Some(contents.into());
        }
        store
    }

    pub fn snapshot(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| inner.snapshot.clone())
    }

    pub fn events(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.events.clone())
            .unwrap_or_default()
    }
}

impl FeedbackStore for MemoryStore {
    fn read_snapshot(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().map_err(|_| StoreError::Poisoned)?.snapshot.clone())
    }

    fn write_snapshot(&mut self, contents: &str) -> Result<(), StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)?.snapshot = Some(contents.to_string());
        Ok(())
    }

    fn append_event(&mut self, line: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .events
            .push(line.to_string());
        Ok(())
    }
}
