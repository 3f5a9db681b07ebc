use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use shared_types::HashChainBlock;

use crate::domain::errors::StoreError;
use crate::ports::outbound::LedgerStore;

/// One JSON object per line, appended and fsynced per block.
///
/// The format streams: a reader can verify record by record without holding
/// the whole chain. A trailing line without its newline is a write that never
/// completed (and was never acknowledged); it is cut off when the store opens.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    file: File,
    /// Byte offset where each durable record starts.
    offsets: Vec<u64>,
    /// End of the last durable record.
    end: u64,
}

impl JsonLinesStore {
    /// Open or create the ledger file, recovering a torn trailing record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("create_dir", e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| StoreError::io("open", e))?;

        let mut store = Self {
            path,
            file,
            offsets: Vec::new(),
            end: 0,
        };
        let blocks = store.scan()?;
        tracing::info!(
            path = %store.path.display(),
            blocks = blocks.len(),
            "opened ledger file"
        );
        Ok(store)
    }

    /// Ledger file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scan(&mut self) -> Result<Vec<HashChainBlock>, StoreError> {
        let reader = File::open(&self.path).map_err(|e| StoreError::io("open", e))?;
        let mut reader = BufReader::new(reader);
        let mut blocks = Vec::new();
        let mut offsets = Vec::new();
        let mut pos = 0u64;
        let mut line_no = 0u64;
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| StoreError::io("read", e))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            if line.last() != Some(&b'\n') {
                tracing::warn!(
                    path = %self.path.display(),
                    offset = pos,
                    bytes = read,
                    "discarding torn trailing record"
                );
                self.file
                    .set_len(pos)
                    .and_then(|_| self.file.sync_all())
                    .map_err(|e| StoreError::io("recover", e))?;
                break;
            }

            let body = line[..read - 1].trim_ascii();
            if !body.is_empty() {
                let block: HashChainBlock =
                    serde_json::from_slice(body).map_err(|e| StoreError::Corrupt {
                        line: line_no,
                        reason: e.to_string(),
                    })?;
                offsets.push(pos);
                blocks.push(block);
            }
            pos += read as u64;
        }

        self.offsets = offsets;
        self.end = pos;
        Ok(blocks)
    }
}

impl LedgerStore for JsonLinesStore {
    fn load(&mut self) -> Result<Vec<HashChainBlock>, StoreError> {
        self.scan()
    }

    fn append(&mut self, block: &HashChainBlock) -> Result<(), StoreError> {
        let expected = self.offsets.len() as u64;
        if block.index != expected {
            return Err(StoreError::OutOfSequence {
                expected,
                found: block.index,
            });
        }

        let mut record = serde_json::to_vec(block).map_err(|e| StoreError::io("encode", e))?;
        record.push(b'\n');
        self.file
            .write_all(&record)
            .and_then(|_| self.file.sync_data())
            .map_err(|e| StoreError::io("append", e))?;

        self.offsets.push(self.end);
        self.end += record.len() as u64;
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> Result<(), StoreError> {
        let keep = usize::try_from(len).unwrap_or(usize::MAX);
        let target = self.offsets.get(keep).copied().unwrap_or(self.end);
        self.file
            .set_len(target)
            .and_then(|_| self.file.sync_all())
            .map_err(|e| StoreError::io("truncate", e))?;
        self.offsets.truncate(keep);
        self.end = target;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.offsets.len() as u64
    }
}
