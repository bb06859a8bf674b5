use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use crate::model::document::Document;

/// Error type for data-file operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Whether a [`DocumentStore::transact`] closure wants its changes written
#[derive(Debug)]
pub enum Commit<T> {
    Write(T),
    /// Nothing changed; leave the file alone
    Skip(T),
}

/// The JSON data file plus the in-process lock that serializes every
/// read-modify-write against it.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Exclusive access to the data file. Released on drop.
pub struct StoreGuard<'a> {
    path: &'a Path,
    _lock: MutexGuard<'a, ()>,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DocumentStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the lock. A previous holder that panicked leaves nothing half
    /// written (writes are atomic), so a poisoned lock is simply reclaimed.
    pub fn lock(&self) -> StoreGuard<'_> {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        StoreGuard {
            path: &self.path,
            _lock: guard,
        }
    }

    /// Read the current document without holding the lock past the read.
    pub fn snapshot(&self) -> Result<Document, StoreError> {
        self.lock().read()
    }

    /// Read, mutate and (maybe) write the document under one lock.
    ///
    /// The closure's error aborts the transaction before anything is
    /// written. A storage failure is converted into the caller's error type.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Document) -> Result<Commit<T>, E>,
        E: From<StoreError>,
    {
        let guard = self.lock();
        let mut doc = guard.read()?;
        match f(&mut doc)? {
            Commit::Write(value) => {
                guard.write(&doc)?;
                Ok(value)
            }
            Commit::Skip(value) => {
                tracing::debug!(path = %self.path.display(), "no changes, skipping write");
                Ok(value)
            }
        }
    }

    /// Write an empty document to `path`. Refuses to clobber an existing
    /// file unless `force` is set.
    pub fn init(path: &Path, force: bool) -> Result<Document, StoreError> {
        if path.exists() && !force {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| StoreError::Write {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let doc = Document::default();
        write_document(path, &doc)?;
        tracing::info!(path = %path.display(), "initialized data file");
        Ok(doc)
    }
}

impl StoreGuard<'_> {
    /// Parse the data file and synthesize any missing default sections.
    pub fn read(&self) -> Result<Document, StoreError> {
        let text = fs::read_to_string(self.path).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "data file read failed");
            StoreError::Read {
                path: self.path.to_path_buf(),
                source: e,
            }
        })?;
        let mut doc: Document = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "data file parse failed");
            StoreError::Parse {
                path: self.path.to_path_buf(),
                source: e,
            }
        })?;
        doc.normalize();
        Ok(doc)
    }

    pub fn write(&self, doc: &Document) -> Result<(), StoreError> {
        write_document(self.path, doc)
    }
}

fn write_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    atomic_write(path, json.as_bytes()).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "data file write failed");
        StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Write via a temp file in the same directory and rename it into place,
/// so readers see either the old file or the new one.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
