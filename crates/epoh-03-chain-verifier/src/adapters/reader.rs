//! Streaming reader over the JSON-lines ledger format.

use std::io::{self, BufRead};

use shared_types::HashChainBlock;

/// One line of the ledger file, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A line that parsed as a block.
    Block { line: u64, block: HashChainBlock },
    /// A complete line that did not parse.
    Malformed { line: u64, reason: String },
    /// An unparseable final line with no newline: a write still in flight.
    TruncatedTail { line: u64, bytes: usize },
}

/// Yields [`Record`]s one at a time, holding a single line in memory.
pub struct LedgerReader<R> {
    inner: R,
    line_no: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LedgerReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    fn next_record(&mut self) -> io::Result<Option<Record>> {
        loop {
            self.buf.clear();
            let read = self.inner.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.line_no;
            let terminated = self.buf.last() == Some(&b'\n');
            let body = if terminated {
                &self.buf[..read - 1]
            } else {
                &self.buf[..]
            };
            let body = body.trim_ascii();
            if body.is_empty() {
                continue;
            }

            let record = match serde_json::from_slice::<HashChainBlock>(body) {
                Ok(block) => Record::Block { line, block },
                Err(_) if !terminated => Record::TruncatedTail { line, bytes: read },
                Err(e) => Record::Malformed {
                    line,
                    reason: e.to_string(),
                },
            };
            return Ok(Some(record));
        }
    }
}

impl<R: BufRead> Iterator for LedgerReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{compute_block_hash, BlockSeal, BlockTimestamp, ClientId, GENESIS_PREV_HASH};

    fn genesis_line() -> String {
        let timestamp = BlockTimestamp {
            wall_micros: 1,
            monotonic_micros: 0,
        };
        let client_id = ClientId::new("Leader_Node_1");
        let block = HashChainBlock {
            index: 0,
            timestamp,
            block_hash: compute_block_hash(0, &timestamp, &client_id, b"x", &GENESIS_PREV_HASH),
            client_id: client_id.clone(),
            telemetry_payload: b"x".to_vec(),
            prev_hash: GENESIS_PREV_HASH,
            mac_or_sig: BlockSeal {
                signer: client_id,
                signature: vec![1, 2, 3],
            },
        };
        serde_json::to_string(&block).unwrap()
    }

    fn read_all(text: &str) -> Vec<Record> {
        LedgerReader::new(text.as_bytes())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = format!("\n{}\n\n", genesis_line());
        let records = read_all(&text);
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], Record::Block { line: 2, .. }));
    }

    #[test]
    fn test_bad_complete_line_is_malformed() {
        let text = format!("{}\nnot json\n", genesis_line());
        let records = read_all(&text);
        assert!(matches!(records[1], Record::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_bad_tail_is_truncated() {
        let line = genesis_line();
        let text = format!("{line}\n{}", &line[..line.len() / 2]);
        let records = read_all(&text);
        assert_eq!(records.len(), 2);
        assert!(matches!(records[1], Record::TruncatedTail { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_complete_record_is_a_block() {
        let records = read_all(&genesis_line());
        assert!(matches!(records[0], Record::Block { line: 1, .. }));
    }
}
