//! Event sinks: where sealed records are made durable before a mutation
//! commits.

use crate::error::LedgerError;
use crate::events::{EventRecord, RecordHash, GENESIS_HASH};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Abstraction for event sinks. An implementation must either record the
/// whole batch or return an error; on error the ledger discards the
/// mutation that produced the batch.
pub trait EventSink: Send + Sync {
    fn append(&self, batch: &[EventRecord]) -> Result<(), LedgerError>;
}

/// Keeps appended records in memory. Useful for observers in tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }
}

impl EventSink for InMemorySink {
    fn append(&self, batch: &[EventRecord]) -> Result<(), LedgerError> {
        self.records.lock().extend_from_slice(batch);
        Ok(())
    }
}

/// Append-only storage behind a [`JsonLinesSink`].
pub trait JournalFile: Write + Send {
    fn size(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

struct Journal<F> {
    file: F,
    next_seq: u64,
    last_hash: RecordHash,
}

/// Appends one JSON document per record to a file and syncs after each batch.
///
/// The file holds exactly one chain. A batch that fails to write or sync is
/// cut off again, and a batch that does not continue the chain is refused.
pub struct JsonLinesSink<F: JournalFile = File> {
    path: PathBuf,
    journal: Mutex<Journal<F>>,
}

impl JsonLinesSink<File> {
    /// Open a new journal at `path`. Fails if the file already holds
    /// records, since a new ledger always starts its chain at zero.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LedgerError::EventSink(format!("Failed to open {}: {}", path.display(), e))
            })?;
        Self::with_file(path, file)
    }
}

impl<F: JournalFile> JsonLinesSink<F> {
    pub fn with_file(path: PathBuf, file: F) -> Result<Self, LedgerError> {
        let len = file.size().map_err(|e| {
            LedgerError::EventSink(format!("Failed to inspect {}: {}", path.display(), e))
        })?;
        if len > 0 {
            return Err(LedgerError::EventSink(format!(
                "Journal {} already holds {} bytes of records",
                path.display(),
                len
            )));
        }
        Ok(JsonLinesSink {
            path,
            journal: Mutex::new(Journal {
                file,
                next_seq: 0,
                last_hash: GENESIS_HASH,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_batch(journal: &mut Journal<F>, buf: &[u8]) -> io::Result<()> {
        journal.file.write_all(buf)?;
        journal.file.flush()?;
        journal.file.sync()
    }
}

impl JsonLinesSink {
    /// Read every record previously written to `path`.
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>, LedgerError> {
        let file = File::open(path.as_ref())?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl<F: JournalFile> EventSink for JsonLinesSink<F> {
    fn append(&self, batch: &[EventRecord]) -> Result<(), LedgerError> {
        let mut journal = self.journal.lock();

        if let Some(first) = batch.first() {
            if first.seq != journal.next_seq || first.prev_hash != journal.last_hash {
                return Err(LedgerError::EventSink(format!(
                    "Record {} does not continue journal {} at sequence {}",
                    first.seq,
                    self.path.display(),
                    journal.next_seq
                )));
            }
        }

        // Encode the whole batch first so a serialization failure writes nothing.
        let mut buf = Vec::new();
        for record in batch {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let prev_len = journal.file.size().map_err(|e| {
            LedgerError::EventSink(format!("Failed to inspect {}: {}", self.path.display(), e))
        })?;
        if let Err(e) = Self::write_batch(&mut journal, &buf) {
            let restored = journal.file.truncate(prev_len);
            return Err(LedgerError::EventSink(match restored {
                Ok(()) => format!("Failed to write {}: {}", self.path.display(), e),
                Err(cut) => format!(
                    "Failed to write {}: {}; truncating to {} bytes also failed: {}",
                    self.path.display(),
                    e,
                    prev_len,
                    cut
                ),
            }));
        }

        if let Some(last) = batch.last() {
            journal.next_seq = last.seq + 1;
            journal.last_hash = last.hash;
        }
        Ok(())
    }
}
