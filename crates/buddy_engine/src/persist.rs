use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use buddy_core::{
    LogEntry, ScanContext, StateChanges, StoredQuantity, Tag, UnknownBarcodeRecord,
};
use buddy_logging::{buddy_debug, buddy_info, buddy_warn};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{StateStore, StoreError, StoreSnapshot};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the state directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Append-only JSON lines file with the durable log rows.
#[derive(Debug, Clone)]
struct LogJournal {
    dir: PathBuf,
    path: PathBuf,
}

impl LogJournal {
    /// Appends `entries` and returns the file length before the append.
    fn append(&self, entries: &[LogEntry]) -> Result<u64, StoreError> {
        let mut lines = String::new();
        for entry in entries {
            let line =
                serde_json::to_string(entry).map_err(|err| StoreError::Encode(err.to_string()))?;
            lines.push_str(&line);
            lines.push('\n');
        }

        ensure_state_dir(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(PersistError::from)?;
        let before = file.metadata().map_err(PersistError::from)?.len();
        file.write_all(lines.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(PersistError::from)?;
        Ok(before)
    }

    /// Drops rows appended after `len` bytes.
    fn truncate(&self, len: u64) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(PersistError::from)?;
        file.set_len(len).map_err(PersistError::from)?;
        Ok(())
    }

    fn read(&self) -> Result<Vec<LogEntry>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistError::Io(err).into()),
        };
        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(PersistError::from)?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|err| StoreError::Decode {
                path: self.path.display().to_string(),
                message: format!("line {}: {}", index + 1, err),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// [`StateStore`] kept in a RON file next to the scanner.
///
/// The file is the only copy of the state: every lookup reads it and every
/// commit applies its changes to what is on disk right then, so several
/// scanner processes can share one file. The state is rewritten through
/// [`AtomicFileWriter`]. Log rows are appended to a JSON lines journal next
/// to it (`state.ron` logs to `state.log.jsonl`).
#[derive(Debug)]
pub struct FileStateStore {
    writer: AtomicFileWriter,
    file_name: String,
    path: PathBuf,
    journal: LogJournal,
}

impl FileStateStore {
    /// Opens the state file, starting from an empty state when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Decode {
                path: path.display().to_string(),
                message: "state path has no file name".to_string(),
            })?
            .to_string();

        let store = Self {
            writer: AtomicFileWriter::new(dir.clone()),
            file_name,
            journal: LogJournal {
                dir,
                path: path.with_extension("log.jsonl"),
            },
            path,
        };
        if !store.path.exists() {
            buddy_info!("No state file at {:?}, starting fresh", store.path);
        }
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_path(&self) -> &Path {
        &self.journal.path
    }

    /// Current contents of the state file.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        self.load()
    }

    /// Every log row written so far, oldest first.
    pub fn log_entries(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.journal.read()
    }

    /// Applies an edit outside of scanning (chore mappings, tags) and persists it.
    pub fn update<F>(&mut self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoreSnapshot),
    {
        let mut next = self.load()?;
        edit(&mut next);
        self.persist(&next)
    }

    fn load(&self) -> Result<StoreSnapshot, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => ron::from_str(&text).map_err(|err| StoreError::Decode {
                path: self.path.display().to_string(),
                message: err.to_string(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(StoreSnapshot::default()),
            Err(err) => Err(PersistError::Io(err).into()),
        }
    }

    fn persist(&self, next: &StoreSnapshot) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(next, pretty)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        let target = self.writer.write(&self.file_name, &content)?;
        buddy_debug!("Persisted scanner state to {:?}", target);
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load_context(&self, now: DateTime<Utc>) -> Result<ScanContext, StoreError> {
        Ok(self.load()?.context(now))
    }

    fn unknown_barcode(&self, barcode: &str) -> Result<Option<UnknownBarcodeRecord>, StoreError> {
        Ok(self.load()?.unknown.remove(barcode))
    }

    fn stored_quantity(&self, barcode: &str) -> Result<Option<StoredQuantity>, StoreError> {
        Ok(self.load()?.quantities.remove(barcode))
    }

    fn chore_id_for_barcode(&self, barcode: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.chore_barcodes.remove(barcode))
    }

    fn tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.load()?.tags)
    }

    fn commit(&mut self, changes: &StateChanges) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut next = self.load()?;
        next.apply(changes);

        let journal_len = if changes.log.is_empty() {
            None
        } else {
            Some(self.journal.append(&changes.log)?)
        };
        if let Err(err) = self.persist(&next) {
            if let Some(len) = journal_len {
                if let Err(undo) = self.journal.truncate(len) {
                    buddy_warn!(
                        "Could not drop log rows of a failed commit from {:?}: {}",
                        self.journal.path,
                        undo
                    );
                }
            }
            return Err(err);
        }
        Ok(())
    }
}
