//! Upload progress reporting
//!
//! A transfer-scoped sink fed by a counting reader wrapped around the
//! request body. Each sink instance tracks exactly one file; counters are
//! never shared between transfers.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

/// Byte-level progress sink for a single transfer.
pub trait ProgressSink: Send + Sync {
    /// Called after each chunk of the body is read, with the chunk size.
    fn advance(&self, bytes: u64);
}

/// `Read` adapter that reports every chunk it yields to a sink.
pub struct ProgressReader<R> {
    inner: R,
    sink: Arc<dyn ProgressSink>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, sink: Arc<dyn ProgressSink>) -> Self {
        Self { inner, sink }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.sink.advance(read as u64);
        }
        Ok(read)
    }
}

/// Carriage-return progress line on stderr.
///
/// The byte counter is monotonic. `advance` may be called from any thread.
pub struct TerminalProgress {
    label: String,
    total: u64,
    sent: Mutex<u64>,
}

impl TerminalProgress {
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        Self {
            label: label.into(),
            total,
            sent: Mutex::new(0),
        }
    }

    /// Bytes reported so far.
    pub fn sent(&self) -> u64 {
        match self.sent.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn advance(&self, bytes: u64) {
        let sent = {
            let mut guard = match self.sent.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard += bytes;
            *guard
        };
        eprint!("{}", render_line(&self.label, sent, self.total));
        if sent >= self.total {
            eprintln!();
        }
        let _ = std::io::stderr().flush();
    }
}

/// `\rname  sent / total  (NN.NN%)`
fn render_line(label: &str, sent: u64, total: u64) -> String {
    let percent = if total == 0 {
        100.0
    } else {
        sent as f64 / total as f64 * 100.0
    };
    format!("\r{}  {} / {}  ({:.2}%)", label, sent, total, percent)
}
