//! Append-only message log.
//!
//! Every relayed message is written as one JSON object per line. Writes
//! are best-effort: a failure is logged and the message still goes out.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;

use crate::common::messages::{InboundMessage, Network};

/// One line of the message log.
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    pub timestamp: String,
    pub network: Network,
    #[serde(flatten)]
    pub message: &'a InboundMessage,
}

/// Sink for the message log file.
///
/// The file is opened on first use and kept open. After a failed write the
/// handle is dropped and the next record reopens the file.
#[derive(Debug)]
pub struct MessageLog {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl MessageLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            file: Mutex::new(None),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
        }
    }

    /// Append `message` to the log file.
    pub fn store(&self, network: Network, message: &InboundMessage) {
        let Some(path) = &self.path else {
            return;
        };

        let record = LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            network,
            message,
        };

        if let Err(e) = self.append_record(path, &record) {
            error!("Couldn't write message to log {}: {}", path.display(), e);
        }
    }

    fn append_record(&self, path: &Path, record: &LogRecord<'_>) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock();
        if file.is_none() {
            *file = Some(OpenOptions::new().create(true).append(true).open(path)?);
        }
        if let Some(handle) = file.as_mut() {
            // One write per record keeps lines whole.
            if let Err(e) = handle.write_all(line.as_bytes()) {
                *file = None;
                return Err(e.into());
            }
        }
        Ok(())
    }
}
